//! Frame sources.
//!
//! This module provides the capture backends the reader pulls frames from:
//! - Synthetic pattern generator (`stub://` device strings, testing/demo)
//! - Local V4L2 devices (feature: capture-v4l2)
//!
//! A source is a blocking, device-paced supplier of `PixelBuffer`s. Returning
//! `None` from `acquire_frame` signals a transient miss (dropped frame, decode
//! hiccup), not a fatal condition; the caller simply tries again. Fatal
//! conditions belong in the constructor, before a source ever reaches the
//! reader.

use anyhow::Result;

use crate::config::CaptureSettings;
use crate::frame::PixelBuffer;

mod synthetic;
#[cfg(feature = "capture-v4l2")]
mod v4l2;

pub use synthetic::{SyntheticConfig, SyntheticSource};
#[cfg(feature = "capture-v4l2")]
pub use v4l2::{V4l2Config, V4l2Source};

/// A blocking supplier of frames, owned by the producer thread while capture
/// is running.
///
/// `Send + 'static` because ownership moves into the background thread on
/// `start()` and back out through the join handle on `stop()`.
pub trait FrameSource: Send + 'static {
    /// Block until the device produces the next frame.
    ///
    /// `None` is a transient miss; callers retry on the next pass.
    fn acquire_frame(&mut self) -> Option<PixelBuffer>;

    /// Release device resources. Must be idempotent.
    fn release(&mut self);
}

impl FrameSource for Box<dyn FrameSource> {
    fn acquire_frame(&mut self) -> Option<PixelBuffer> {
        (**self).acquire_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Build the backend named by the capture settings.
///
/// `stub://` device strings select the synthetic generator; anything else is
/// treated as a local device node and requires the capture-v4l2 feature.
pub fn open_source(settings: &CaptureSettings) -> Result<Box<dyn FrameSource>> {
    if settings.device.starts_with("stub://") {
        let source = SyntheticSource::new(SyntheticConfig {
            device: settings.device.clone(),
            width: settings.width,
            height: settings.height,
            target_fps: settings.target_fps,
        });
        return Ok(Box::new(source));
    }

    #[cfg(feature = "capture-v4l2")]
    {
        let source = V4l2Source::open(V4l2Config {
            device: settings.device.clone(),
            width: settings.width,
            height: settings.height,
            target_fps: settings.target_fps,
        })?;
        Ok(Box::new(source))
    }
    #[cfg(not(feature = "capture-v4l2"))]
    {
        anyhow::bail!(
            "device '{}' requires the capture-v4l2 feature",
            settings.device
        )
    }
}
