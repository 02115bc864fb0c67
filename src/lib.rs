//! Pixelfind locates occurrences of small reference pixel patterns (images
//! or solid colors) inside larger pixel buffers, typically regions captured
//! from a screen or window.
//!
//! Matching is per-channel tolerant with a transparency mask on the pattern
//! side; several independent patterns can be searched in one pass, a
//! caller-driven callback protocol enumerates or skips occurrences, and
//! polling waits detect when a pattern appears, disappears, or the area
//! changes. Optional parallelism across patterns is available via the
//! `rayon` feature.
//!
//! Capturing pixels is out of scope: callers implement [`FrameSource`] over
//! their capture path, and the engine only consumes pixel buffers and
//! produces rectangles.

pub mod finder;
pub mod frame;
pub mod pattern;
pub mod search;
pub mod util;

mod trace;

pub use finder::{FinderOptions, ImageFinder, PollOptions};
pub use frame::{CaptureMode, Frame, FrameSource};
pub use pattern::{Pattern, LITERAL_PREFIX};
pub use search::{AlsoCallback, AlsoDecision, Match, Rect, Tolerance};
pub use util::{PixelFindError, PixelFindResult};
