//! grabd - frame grabber demo daemon
//!
//! Opens the configured capture source, starts the background reader, and
//! polls the latest frame at a fixed rate, logging throughput once per
//! second. Ctrl-C (or an elapsed --seconds budget) shuts down cleanly.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use framegrab::{AsyncFrameReader, GrabdConfig};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file path (JSON). Falls back to FRAMEGRAB_CONFIG, then defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run for this many seconds, then exit (0 = until Ctrl-C).
    #[arg(long, default_value_t = 0)]
    seconds: u64,

    /// Consumer poll interval in milliseconds.
    #[arg(long, default_value_t = 10)]
    interval_ms: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => GrabdConfig::load_from(path)?,
        None => GrabdConfig::load()?,
    };
    log::info!(
        "grabd: device {} ({}x{} @ {} fps), warmup {:?}",
        cfg.capture.device,
        cfg.capture.width,
        cfg.capture.height,
        cfg.capture.target_fps,
        cfg.warmup_timeout
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_in_handler = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("grabd: shutdown requested");
        running_in_handler.store(false, Ordering::SeqCst);
    })
    .context("install signal handler")?;

    let mut reader = AsyncFrameReader::open(&cfg)?;
    reader.start()?;

    let poll_interval = Duration::from_millis(args.interval_ms.max(1));
    let deadline = (args.seconds > 0).then(|| Instant::now() + Duration::from_secs(args.seconds));

    let mut reads: u64 = 0;
    let mut grabbed_reads: u64 = 0;
    let mut window_start = Instant::now();
    while running.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }

        let (grabbed, frame) = reader.read();
        reads += 1;
        if grabbed {
            grabbed_reads += 1;
        }

        if window_start.elapsed() >= Duration::from_secs(1) {
            log::info!(
                "grabd: {} reads/s ({} grabbed), latest frame {}x{} ({} bytes)",
                reads,
                grabbed_reads,
                frame.width(),
                frame.height(),
                frame.byte_len()
            );
            reads = 0;
            grabbed_reads = 0;
            window_start = Instant::now();
        }

        std::thread::sleep(poll_interval);
    }

    reader.stop();
    reader.shutdown();
    log::info!("grabd: stopped");
    Ok(())
}
