//! Reference patterns: the pixel blocks being searched for.
//!
//! A pattern's canonical form is a row-major, top-down buffer of packed
//! `0xAARRGGBB` pixels. A pixel whose alpha byte is below `0xFF` is
//! transparent: it matches any frame pixel at that position. Bottom-up
//! input layouts are rejected, never reinterpreted.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::frame::{self, Frame};
use crate::util::{PixelFindError, PixelFindResult};

mod anchors;

pub(crate) use anchors::{Anchor, AnchorSet};

/// Prefix of serialized image literals: `image:` followed by Base64-encoded
/// image file data (PNG/JPEG).
pub const LITERAL_PREFIX: &str = "image:";

/// Returns whether a packed pixel is transparent (alpha below `0xFF`).
#[inline]
pub(crate) fn is_transparent(px: u32) -> bool {
    px < 0xff00_0000
}

/// An immutable reference pattern plus its cached anchor selection.
#[derive(Debug)]
pub struct Pattern {
    pixels: Vec<u32>,
    width: usize,
    height: usize,
    anchors: anchors::AnchorCache,
}

impl Pattern {
    /// Creates a pattern from a contiguous top-down pixel buffer.
    pub fn from_pixels(pixels: Vec<u32>, width: usize, height: usize) -> PixelFindResult<Self> {
        if width == 0 || height == 0 {
            return Err(PixelFindError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(PixelFindError::InvalidDimensions { width, height })?;
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
            anchors: anchors::AnchorCache::default(),
        })
    }

    /// Creates a pattern from a row-strided buffer; see
    /// [`Frame::from_raw_parts`] for the stride rules.
    pub fn from_raw_parts(
        pixels: Vec<u32>,
        width: usize,
        height: usize,
        stride: isize,
    ) -> PixelFindResult<Self> {
        let pixels = frame::compact_rows(pixels, width, height, stride)?;
        Self::from_pixels(pixels, width, height)
    }

    /// Creates a 1x1 pattern matching one solid `0xRRGGBB` color.
    ///
    /// The alpha byte of `rgb` is ignored and forced opaque.
    pub fn from_color(rgb: u32) -> Self {
        Self {
            pixels: vec![rgb & 0x00ff_ffff | 0xff00_0000],
            width: 1,
            height: 1,
            anchors: anchors::AnchorCache::default(),
        }
    }

    /// Creates a pattern from a decoded RGBA image, keeping its alpha
    /// channel as the transparency mask.
    pub fn from_image(img: &image::RgbaImage) -> PixelFindResult<Self> {
        let width = img.width() as usize;
        let height = img.height() as usize;
        Self::from_pixels(frame::pack_rgba(img.as_raw()), width, height)
    }

    /// Decodes image file bytes (a bundled resource, for example).
    pub fn from_bytes(bytes: &[u8]) -> PixelFindResult<Self> {
        let img = image::load_from_memory(bytes).map_err(|err| PixelFindError::ImageIo {
            reason: err.to_string(),
        })?;
        Self::from_image(&img.to_rgba8())
    }

    /// Loads a lossless raster image file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> PixelFindResult<Self> {
        let img = image::open(path).map_err(|err| PixelFindError::ImageIo {
            reason: err.to_string(),
        })?;
        Self::from_image(&img.to_rgba8())
    }

    /// Parses an `image:` literal: Base64-encoded image file data.
    pub fn from_literal(literal: &str) -> PixelFindResult<Self> {
        let encoded =
            literal
                .strip_prefix(LITERAL_PREFIX)
                .ok_or_else(|| PixelFindError::InvalidLiteral {
                    reason: format!("missing `{LITERAL_PREFIX}` prefix"),
                })?;
        let bytes = BASE64
            .decode(encoded)
            .map_err(|err| PixelFindError::InvalidLiteral {
                reason: err.to_string(),
            })?;
        Self::from_bytes(&bytes)
    }

    /// Loads a pattern from a string: an `image:` literal or a file path.
    pub fn load(source: &str) -> PixelFindResult<Self> {
        if source.starts_with(LITERAL_PREFIX) {
            Self::from_literal(source)
        } else {
            Self::from_file(source)
        }
    }

    /// Returns the pattern width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the pattern height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the pixel buffer in row-major top-down order.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Returns whether the pattern fits inside a `width` x `height` frame.
    pub(crate) fn fits(&self, width: usize, height: usize) -> bool {
        self.width <= width && self.height <= height
    }

    /// Recomputes the anchor selection if `frame_width` changed.
    pub(crate) fn ensure_anchors(&mut self, frame_width: usize) {
        self.anchors
            .ensure(&self.pixels, self.width, frame_width);
    }

    /// Returns the current anchors, or `None` for a permanently
    /// unmatchable (all-transparent) pattern.
    pub(crate) fn anchor_set(&self) -> Option<&AnchorSet> {
        self.anchors.get()
    }
}

impl TryFrom<&Frame> for Pattern {
    type Error = PixelFindError;

    /// Converts a captured frame into an opaque pattern.
    fn try_from(frame: &Frame) -> PixelFindResult<Self> {
        let pixels = frame.pixels().iter().map(|&px| px | 0xff00_0000).collect();
        Self::from_pixels(pixels, frame.width(), frame.height())
    }
}
