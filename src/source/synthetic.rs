//! Synthetic frame source.
//!
//! Generates deterministic patterned frames at a target rate, standing in for
//! a camera wherever no hardware exists: unit tests, the demo daemon, CI.
//! Selected by `stub://` device strings.

use std::time::{Duration, Instant};

use crate::frame::PixelBuffer;
use crate::source::FrameSource;

/// Configuration for a synthetic source.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Device string, kept for logging (e.g., "stub://camera0").
    pub device: String,
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Simulated device rate (frames per second).
    pub target_fps: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            device: "stub://camera0".to_string(),
            width: 640,
            height: 480,
            target_fps: 30,
        }
    }
}

/// Synthetic pattern generator paced like a real device.
pub struct SyntheticSource {
    config: SyntheticConfig,
    frame_count: u64,
    last_frame_at: Option<Instant>,
    released: bool,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        log::info!(
            "SyntheticSource: opened {} ({}x{} @ {} fps)",
            config.device,
            config.width,
            config.height,
            config.target_fps
        );
        Self {
            config,
            frame_count: 0,
            last_frame_at: None,
            released: false,
        }
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    /// Fill a buffer with a pattern that varies per frame, so consumers can
    /// tell successive frames apart.
    fn generate_pixels(&self) -> Vec<u8> {
        let pixel_count = (self.config.width * self.config.height * 3) as usize; // RGB
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count) % 256) as u8;
        }
        pixels
    }

    fn frame_interval(&self) -> Duration {
        if self.config.target_fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1) / self.config.target_fps
        }
    }
}

impl FrameSource for SyntheticSource {
    fn acquire_frame(&mut self) -> Option<PixelBuffer> {
        if self.released {
            return None;
        }

        // Pace like a camera: block until the next frame is "due".
        if let Some(last) = self.last_frame_at {
            let interval = self.frame_interval();
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last_frame_at = Some(Instant::now());

        self.frame_count += 1;
        let pixels = self.generate_pixels();
        Some(PixelBuffer::new(
            pixels,
            self.config.width,
            self.config.height,
        ))
    }

    fn release(&mut self) {
        if !self.released {
            log::info!("SyntheticSource: released {}", self.config.device);
            self.released = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SyntheticConfig {
        SyntheticConfig {
            device: "stub://test".to_string(),
            width: 32,
            height: 24,
            target_fps: 0, // unpaced for tests
        }
    }

    #[test]
    fn produces_frames_of_configured_size() {
        let mut source = SyntheticSource::new(fast_config());
        let frame = source.acquire_frame().expect("frame");
        assert_eq!(frame.width(), 32);
        assert_eq!(frame.height(), 24);
        assert_eq!(frame.byte_len(), 32 * 24 * 3);
    }

    #[test]
    fn successive_frames_differ() {
        let mut source = SyntheticSource::new(fast_config());
        let a = source.acquire_frame().expect("frame a");
        let b = source.acquire_frame().expect("frame b");
        assert_ne!(a, b);
        assert_eq!(source.frames_captured(), 2);
    }

    #[test]
    fn release_is_idempotent_and_stops_capture() {
        let mut source = SyntheticSource::new(fast_config());
        source.release();
        source.release();
        assert!(source.acquire_frame().is_none());
    }
}
