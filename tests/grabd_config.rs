use std::sync::Mutex;

use tempfile::NamedTempFile;

use framegrab::config::GrabdConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "FRAMEGRAB_CONFIG",
        "FRAMEGRAB_DEVICE",
        "FRAMEGRAB_WIDTH",
        "FRAMEGRAB_HEIGHT",
        "FRAMEGRAB_FPS",
        "FRAMEGRAB_WARMUP_SECS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "capture": {
            "device": "/dev/video2",
            "width": 800,
            "height": 600,
            "target_fps": 15
        },
        "warmup_secs": 20
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("FRAMEGRAB_CONFIG", file.path());
    std::env::set_var("FRAMEGRAB_DEVICE", "stub://override");
    std::env::set_var("FRAMEGRAB_WARMUP_SECS", "3");

    let cfg = GrabdConfig::load().expect("load config");

    assert_eq!(cfg.capture.device, "stub://override");
    assert_eq!(cfg.capture.width, 800);
    assert_eq!(cfg.capture.height, 600);
    assert_eq!(cfg.capture.target_fps, 15);
    assert_eq!(cfg.warmup_timeout.as_secs(), 3);

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = GrabdConfig::load().expect("load config");

    assert_eq!(cfg.capture.device, "stub://camera0");
    assert_eq!(cfg.capture.width, 640);
    assert_eq!(cfg.capture.height, 480);
    assert_eq!(cfg.capture.target_fps, 30);
    assert_eq!(cfg.warmup_timeout.as_secs(), 10);

    clear_env();
}

#[test]
fn rejects_zero_dimensions() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FRAMEGRAB_WIDTH", "0");
    let err = GrabdConfig::load().expect_err("zero width must fail validation");
    assert!(err.to_string().contains("dimensions"));

    clear_env();
}

#[test]
fn rejects_non_numeric_env_override() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FRAMEGRAB_FPS", "fast");
    let err = GrabdConfig::load().expect_err("non-numeric fps must fail");
    assert!(err.to_string().contains("FRAMEGRAB_FPS"));

    clear_env();
}
