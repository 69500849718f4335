//! framegrab
//!
//! Background frame acquisition for blocking camera/sensor sources. A single
//! producer thread pulls frames from a device at whatever rate the hardware
//! dictates and publishes the newest one into a mutex-guarded mailbox;
//! consumers read the latest frame at their own rate without ever waiting on
//! device I/O.
//!
//! # Module Structure
//!
//! - `reader`: the `AsyncFrameReader` core (producer thread, warmup, mailbox)
//! - `source`: capture backends behind the `FrameSource` trait
//! - `frame`: owned pixel buffers
//! - `config`: daemon configuration (file + env)
//!
//! # Guarantees
//!
//! - A `read()` never blocks on the device and never observes a torn
//!   (`grabbed`, frame) pair.
//! - Publication is last-write-wins: no queueing, slow readers skip frames,
//!   fast readers may see the same frame twice.
//! - `start()` returns only once a frame has been grabbed, or fails after a
//!   bounded warmup window with the producer still stoppable.

pub mod config;
pub mod frame;
pub mod reader;
pub mod source;

pub use config::{CaptureSettings, GrabdConfig};
pub use frame::PixelBuffer;
pub use reader::{AsyncFrameReader, ReaderError, DEFAULT_WARMUP_TIMEOUT};
pub use source::{FrameSource, SyntheticConfig, SyntheticSource};
#[cfg(feature = "capture-v4l2")]
pub use source::{V4l2Config, V4l2Source};
