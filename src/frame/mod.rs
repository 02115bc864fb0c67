//! Captured frames and the capture boundary.
//!
//! A `Frame` is an owned, top-down pixel buffer in packed 32-bit
//! `0xAARRGGBB` format, plus an offset that maps frame-local coordinates
//! back to the caller's coordinate space (to undo a limiting sub-rectangle
//! or DPI mapping applied by the capture code). Frames have no transparency
//! concept; their alpha byte is ignored by every comparison.
//!
//! Capturing pixels from live targets is not implemented here. Callers
//! implement [`FrameSource`] over whatever capture path they have.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::path::Path;

use crate::util::{PixelFindError, PixelFindResult};

/// Capture strategies a [`FrameSource`] implementation can offer.
///
/// The search engine never interprets this value; it is vocabulary for
/// source implementors choosing how to obtain pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaptureMode {
    /// Copy pixels from the screen.
    #[default]
    Screen,
    /// Copy the window-owned buffer; works for covered windows.
    WindowBuffer,
    /// Ask the target to render itself into a buffer.
    Rendered,
}

/// Owned top-down 32-bit pixel buffer with a caller-space offset.
pub struct Frame {
    pixels: Vec<u32>,
    width: usize,
    height: usize,
    offset: (i32, i32),
}

impl Frame {
    /// Creates a frame from a contiguous top-down pixel buffer.
    pub fn new(pixels: Vec<u32>, width: usize, height: usize) -> PixelFindResult<Self> {
        let needed = checked_area(width, height)?;
        if pixels.len() < needed {
            return Err(PixelFindError::BufferTooSmall {
                needed,
                got: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            offset: (0, 0),
        })
    }

    /// Creates a frame from a row-strided buffer.
    ///
    /// `stride` counts pixels between row starts. A negative stride means
    /// bottom-up rows and is rejected; rows wider than the image are
    /// compacted.
    pub fn from_raw_parts(
        pixels: Vec<u32>,
        width: usize,
        height: usize,
        stride: isize,
    ) -> PixelFindResult<Self> {
        let pixels = compact_rows(pixels, width, height, stride)?;
        Self::new(pixels, width, height)
    }

    /// Creates a frame from a decoded RGBA image.
    pub fn from_image(img: &image::RgbaImage) -> PixelFindResult<Self> {
        let width = img.width() as usize;
        let height = img.height() as usize;
        Self::new(pack_rgba(img.as_raw()), width, height)
    }

    /// Loads an image file and converts it to a frame.
    pub fn from_file<P: AsRef<Path>>(path: P) -> PixelFindResult<Self> {
        let img = image::open(path).map_err(|err| PixelFindError::ImageIo {
            reason: err.to_string(),
        })?;
        Self::from_image(&img.to_rgba8())
    }

    /// Sets the offset added to every reported rectangle.
    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset = (x, y);
        self
    }

    /// Returns the frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the offset mapping frame coordinates to caller coordinates.
    pub fn offset(&self) -> (i32, i32) {
        self.offset
    }

    /// Returns the backing pixel buffer, row-major top-down.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Returns a contiguous slice for row `y`.
    pub fn row(&self, y: usize) -> Option<&[u32]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.pixels.get(start..start + self.width)
    }

    /// Hashes dimensions and pixel content, ignoring alpha bytes.
    ///
    /// Used by change waiting to detect that a freshly captured frame
    /// differs from the baseline without running the matcher.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        hasher.write_usize(self.width);
        hasher.write_usize(self.height);
        for &px in &self.pixels {
            hasher.write_u32(px & 0x00ff_ffff);
        }
        hasher.finish()
    }
}

/// Boundary to the code that captures pixels from a live target.
///
/// A source is handed a target descriptor and a [`CaptureMode`] at
/// construction time, outside this crate.
pub trait FrameSource {
    /// Acquires a fresh frame from the target.
    ///
    /// `Ok(None)` means the target is currently unavailable (hidden,
    /// minimized, or the limiting rectangle has an empty intersection); a
    /// search cycle then reports "no match" and a wait keeps polling.
    /// Errors mean the target is permanently invalid and abort a wait.
    fn acquire(&mut self) -> PixelFindResult<Option<Frame>>;
}

fn checked_area(width: usize, height: usize) -> PixelFindResult<usize> {
    if width == 0 || height == 0 {
        return Err(PixelFindError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(PixelFindError::InvalidDimensions { width, height })
}

/// Normalizes a strided buffer to contiguous rows. Shared by frame and
/// pattern construction.
pub(crate) fn compact_rows(
    pixels: Vec<u32>,
    width: usize,
    height: usize,
    stride: isize,
) -> PixelFindResult<Vec<u32>> {
    if stride < 0 {
        return Err(PixelFindError::UnsupportedLayout {
            reason: "bottom-up rows",
        });
    }
    let stride = stride as usize;
    if stride < width {
        return Err(PixelFindError::UnsupportedLayout {
            reason: "stride narrower than a row",
        });
    }
    let needed = checked_area(width, height)?;
    if stride == width {
        return Ok(pixels);
    }

    let strided_len = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(PixelFindError::InvalidDimensions { width, height })?;
    if pixels.len() < strided_len {
        return Err(PixelFindError::BufferTooSmall {
            needed: strided_len,
            got: pixels.len(),
        });
    }

    let mut out = Vec::with_capacity(needed);
    for y in 0..height {
        let start = y * stride;
        out.extend_from_slice(&pixels[start..start + width]);
    }
    Ok(out)
}

/// Packs RGBA bytes into `0xAARRGGBB` words.
pub(crate) fn pack_rgba(rgba: &[u8]) -> Vec<u32> {
    rgba.chunks_exact(4)
        .map(|px| {
            u32::from(px[3]) << 24 | u32::from(px[0]) << 16 | u32::from(px[1]) << 8 | u32::from(px[2])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_dimensions() {
        let err = Frame::new(vec![0; 4], 0, 1).err().unwrap();
        assert_eq!(
            err,
            PixelFindError::InvalidDimensions {
                width: 0,
                height: 1,
            }
        );
    }

    #[test]
    fn rejects_small_buffer() {
        let err = Frame::new(vec![0; 3], 2, 2).err().unwrap();
        assert_eq!(err, PixelFindError::BufferTooSmall { needed: 4, got: 3 });
    }

    #[test]
    fn rejects_bottom_up_layout() {
        let err = Frame::from_raw_parts(vec![0; 4], 2, 2, -2).err().unwrap();
        assert_eq!(
            err,
            PixelFindError::UnsupportedLayout {
                reason: "bottom-up rows",
            }
        );
    }

    #[test]
    fn compacts_padded_rows() {
        let pixels = vec![1, 2, 9, 9, 3, 4];
        let frame = Frame::from_raw_parts(pixels, 2, 2, 4).unwrap();
        assert_eq!(frame.pixels(), &[1, 2, 3, 4]);
        assert_eq!(frame.row(1).unwrap(), &[3, 4]);
    }

    #[test]
    fn content_hash_ignores_alpha() {
        let a = Frame::new(vec![0xff11_2233, 0xff44_5566], 2, 1).unwrap();
        let b = Frame::new(vec![0x0011_2233, 0x7f44_5566], 2, 1).unwrap();
        assert_eq!(a.content_hash(), b.content_hash());

        let c = Frame::new(vec![0xff11_2234, 0xff44_5566], 2, 1).unwrap();
        assert_ne!(a.content_hash(), c.content_hash());
    }
}
