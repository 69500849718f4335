//! V4L2 frame source.
//!
//! Captures from a local device node (e.g., /dev/video0) via libv4l, with the
//! device and its mmap stream held in a self-referencing state so both live
//! and die together. Open/format negotiation failures are fatal at
//! construction; capture failures afterwards are reported as transient misses
//! so the reader keeps retrying.

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use crate::frame::PixelBuffer;
use crate::source::FrameSource;

/// Configuration for a V4L2 source.
#[derive(Clone, Debug)]
pub struct V4l2Config {
    /// Device path (e.g., "/dev/video0").
    pub device: String,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
    /// Requested frame rate (frames per second); 0 leaves the driver default.
    pub target_fps: u32,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 640,
            height: 480,
            target_fps: 30,
        }
    }
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

/// V4L2 capture backend over libv4l.
pub struct V4l2Source {
    config: V4l2Config,
    state: Option<V4l2State>,
    // What the driver actually granted, which may differ from the request.
    active_width: u32,
    active_height: u32,
}

impl V4l2Source {
    /// Open and configure the device, ready to capture.
    pub fn open(config: V4l2Config) -> Result<Self> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&config.device)
            .with_context(|| format!("open v4l2 device {}", config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = config.width;
        format.height = config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Source: failed to set format on {}: {}",
                    config.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        if config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "V4l2Source: failed to set fps on {}: {}",
                    config.device,
                    err
                );
            }
        }

        let active_width = format.width;
        let active_height = format.height;

        let state = V4l2StateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;

        log::info!(
            "V4l2Source: opened {} ({}x{})",
            config.device,
            active_width,
            active_height
        );

        Ok(Self {
            config,
            state: Some(state),
            active_width,
            active_height,
        })
    }
}

impl FrameSource for V4l2Source {
    fn acquire_frame(&mut self) -> Option<PixelBuffer> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut()?;
        match state.with_mut(|fields| fields.stream.next()) {
            Ok((buf, _meta)) => Some(PixelBuffer::new(
                buf.to_vec(),
                self.active_width,
                self.active_height,
            )),
            Err(err) => {
                log::warn!(
                    "V4l2Source: capture failed on {}: {}",
                    self.config.device,
                    err
                );
                None
            }
        }
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::info!("V4l2Source: released {}", self.config.device);
        }
    }
}
