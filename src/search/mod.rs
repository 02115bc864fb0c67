//! Search results, color tolerance, and the continuation protocol.

use crate::util::{PixelFindError, PixelFindResult};

pub(crate) mod enumerate;
pub(crate) mod scan;

#[cfg(feature = "rayon")]
pub(crate) mod parallel;

/// Rectangle in caller coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

/// A found occurrence of a pattern.
///
/// The rectangle always has the matched pattern's width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Location of the occurrence, already offset into the caller's
    /// coordinate space.
    pub rect: Rect,
    /// Zero-based occurrence count within the current pattern.
    pub match_index: usize,
    /// Zero-based position of the matched pattern within the searched list.
    pub list_index: usize,
}

impl Match {
    /// Skips the first `n` occurrences of the current pattern.
    ///
    /// Use in an also-callback: `|m| m.skip(2)` reports the third
    /// occurrence.
    pub fn skip(&self, n: usize) -> AlsoDecision {
        if self.match_index == n {
            AlsoDecision::OkReturn
        } else if self.match_index < n {
            AlsoDecision::FindOther
        } else {
            AlsoDecision::FindOtherOfList
        }
    }
}

/// Decision returned by an also-callback for each candidate occurrence.
///
/// `Ok*` variants report success: the search result is this candidate, or a
/// later one if enumeration continues. Non-`Ok` variants report "keep
/// looking"; the overall search still succeeds if an `Ok*` decision was
/// recorded earlier. `*OfThis` variants stay on the current pattern;
/// `*OfList` variants move to the next pattern of the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlsoDecision {
    /// Stop searching and report this candidate.
    OkReturn,
    /// Remember this candidate; keep enumerating this pattern, then the
    /// rest of the list.
    OkFindMore,
    /// Remember this candidate; keep enumerating this pattern only.
    OkFindMoreOfThis,
    /// Remember this candidate; move on to the next pattern of the list.
    OkFindMoreOfList,
    /// Stop searching and report nothing (unless recorded earlier).
    NotFound,
    /// Skip this candidate; keep enumerating this pattern, then the rest of
    /// the list.
    FindOther,
    /// Skip this candidate; keep enumerating this pattern only.
    FindOtherOfThis,
    /// Skip this candidate; move on to the next pattern of the list.
    FindOtherOfList,
}

/// Callback invoked with each candidate occurrence.
///
/// In parallel mode the callback runs on worker threads, one invocation at
/// a time (under the shared result lock).
pub type AlsoCallback = Box<dyn Fn(&Match) -> AlsoDecision + Send + Sync>;

/// Per-channel color tolerance derived from a 0..=100 `diff` input.
///
/// The remap is the original tool's slightly-exponential curve: 0..=30
/// unchanged, 31..=60 doubled above 30, 61..=100 tripled above 60, giving
/// an internal tolerance of 0..=210. Preserved numerically for
/// compatibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tolerance(u32);

impl Tolerance {
    /// Validates `diff` and applies the remap.
    pub fn from_diff(diff: u32) -> PixelFindResult<Self> {
        let value = match diff {
            0..=30 => diff,
            31..=60 => 30 + (diff - 30) * 2,
            61..=100 => 90 + (diff - 60) * 3,
            _ => return Err(PixelFindError::InvalidDiff { diff }),
        };
        Ok(Self(value))
    }

    /// Returns the remapped per-channel tolerance, 0..=210.
    pub fn value(self) -> u32 {
        self.0
    }
}
