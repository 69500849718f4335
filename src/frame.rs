//! Owned pixel buffers.
//!
//! A `PixelBuffer` is what a frame source hands over on a successful capture
//! and what `AsyncFrameReader::read` returns to consumers. Buffers are
//! replaced wholesale on each capture, never mutated in place, so a published
//! buffer can be shared freely.

/// An owned frame: packed RGB bytes plus dimensions.
///
/// `Default` is the empty buffer (0x0, no bytes). The reader uses it to prime
/// its slot when the very first capture attempt misses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Packed RGB bytes, row-major.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// True for the primed-but-never-grabbed placeholder.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
