use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_DEVICE: &str = "stub://camera0";
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_FPS: u32 = 30;
const DEFAULT_WARMUP_SECS: u64 = 10;

#[derive(Debug, Deserialize, Default)]
struct GrabdConfigFile {
    capture: Option<CaptureConfigFile>,
    warmup_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

/// Resolved daemon configuration: file values, then env overrides, validated.
#[derive(Debug, Clone)]
pub struct GrabdConfig {
    pub capture: CaptureSettings,
    pub warmup_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Device string: `stub://name` for the synthetic source, otherwise a
    /// local device node (e.g., "/dev/video0").
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            target_fps: DEFAULT_FPS,
        }
    }
}

impl Default for GrabdConfig {
    fn default() -> Self {
        Self {
            capture: CaptureSettings::default(),
            warmup_timeout: Duration::from_secs(DEFAULT_WARMUP_SECS),
        }
    }
}

impl GrabdConfig {
    /// Load from the file named by `FRAMEGRAB_CONFIG` (if set), apply env
    /// overrides, validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("FRAMEGRAB_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from an explicit path (CLI override), then env, then validate.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: GrabdConfigFile) -> Self {
        let capture_file = file.capture.unwrap_or_default();
        let capture = CaptureSettings {
            device: capture_file
                .device
                .unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
            width: capture_file.width.unwrap_or(DEFAULT_WIDTH),
            height: capture_file.height.unwrap_or(DEFAULT_HEIGHT),
            target_fps: capture_file.target_fps.unwrap_or(DEFAULT_FPS),
        };
        Self {
            capture,
            warmup_timeout: Duration::from_secs(file.warmup_secs.unwrap_or(DEFAULT_WARMUP_SECS)),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("FRAMEGRAB_DEVICE") {
            self.capture.device = device;
        }
        if let Some(width) = env_u32("FRAMEGRAB_WIDTH")? {
            self.capture.width = width;
        }
        if let Some(height) = env_u32("FRAMEGRAB_HEIGHT")? {
            self.capture.height = height;
        }
        if let Some(fps) = env_u32("FRAMEGRAB_FPS")? {
            self.capture.target_fps = fps;
        }
        if let Ok(raw) = std::env::var("FRAMEGRAB_WARMUP_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| anyhow!("FRAMEGRAB_WARMUP_SECS must be an integer, got '{raw}'"))?;
            self.warmup_timeout = Duration::from_secs(secs);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.capture.device.is_empty() {
            return Err(anyhow!("capture device must not be empty"));
        }
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(anyhow!(
                "capture dimensions must be non-zero, got {}x{}",
                self.capture.width,
                self.capture.height
            ));
        }
        if self.capture.target_fps == 0 {
            return Err(anyhow!("target_fps must be >= 1"));
        }
        if self.warmup_timeout.is_zero() {
            return Err(anyhow!("warmup timeout must be > 0"));
        }
        Ok(())
    }
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(raw) => {
            let value: u32 = raw
                .parse()
                .map_err(|_| anyhow!("{key} must be an integer, got '{raw}'"))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<GrabdConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
