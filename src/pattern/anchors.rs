//! Anchor pixel selection.
//!
//! Anchors are up to four pattern pixels with mutually distinct colors,
//! used to reject candidate positions with one cheap comparison before a
//! full tolerant compare. An anchor's offset is precomputed against a frame
//! width (`pos = row * frame_width + col`), so a candidate top-left at flat
//! index `t` has its anchor at frame index `t + pos`.

use crate::pattern::is_transparent;

/// One selected pattern pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Anchor {
    /// Flat frame offset of this pixel relative to the candidate top-left.
    pub pos: usize,
    /// The pixel's packed color, always opaque.
    pub color: u32,
}

/// Anchors selected for one pattern at one frame width, 1..=4 entries.
#[derive(Debug)]
pub(crate) struct AnchorSet {
    pub anchors: Vec<Anchor>,
}

/// Per-pattern anchor cache, keyed by the frame width it was computed for.
///
/// The cache is owned by the pattern and recomputed lazily when the frame
/// width changes. A pattern whose pixels are all transparent is flagged
/// permanently unmatchable by the first computation; the flag is never
/// re-evaluated.
#[derive(Debug, Default)]
pub(crate) struct AnchorCache {
    frame_width: usize,
    set: Option<AnchorSet>,
    unmatchable: bool,
}

impl AnchorCache {
    pub fn ensure(&mut self, pixels: &[u32], width: usize, frame_width: usize) {
        if self.unmatchable {
            return;
        }
        if self.set.is_some() && self.frame_width == frame_width {
            return;
        }
        self.frame_width = frame_width;
        self.set = select_anchors(pixels, width, frame_width);
        if self.set.is_none() {
            self.unmatchable = true;
        }
    }

    /// Returns the current set, or `None` for an unmatchable pattern.
    pub fn get(&self) -> Option<&AnchorSet> {
        self.set.as_ref()
    }
}

/// Selects anchor pixels for a pattern placed at frame offset 0.
///
/// Returns `None` iff every pixel is transparent.
fn select_anchors(pixels: &[u32], width: usize, frame_width: usize) -> Option<AnchorSet> {
    let count = pixels.len();
    let first = pixels.iter().position(|&c| !is_transparent(c))?;

    let mut anchors = Vec::with_capacity(4);
    let add = |anchors: &mut Vec<Anchor>, i: usize| {
        let (x, y) = (i % width, i / width);
        anchors.push(Anchor {
            pos: y * frame_width + x,
            color: pixels[i],
        });
    };

    // If the top-left pixel is opaque it is likely uniform background;
    // anchor on the first differing color instead.
    let mut i = first;
    let mut single_color = false;
    if i == 0 {
        match find_different(pixels, 0) {
            Some(j) => i = j,
            None => {
                single_color = true;
                i = 0;
            }
        }
    }
    add(&mut anchors, i);

    if !single_color {
        let i0 = i;
        if let Some(second) = find_different(pixels, i) {
            add(&mut anchors, second);
            // greedily extend with pixels of colors not collected yet
            let mut j = second;
            while anchors.len() < 4 {
                j += 1;
                while j < count {
                    let c = pixels[j];
                    if !is_transparent(c) && anchors.iter().all(|a| a.color != c) {
                        break;
                    }
                    j += 1;
                }
                if j >= count {
                    break;
                }
                add(&mut anchors, j);
            }
        } else {
            // no second color exists; anchor the last opaque pixel so the
            // verify step still probes two extremes of the pattern
            let mut j = count - 1;
            while j > i0 && is_transparent(pixels[j]) {
                j -= 1;
            }
            add(&mut anchors, j);
        }
    }

    Some(AnchorSet { anchors })
}

/// Finds the next opaque pixel after `from` whose color differs from
/// `pixels[from]`.
fn find_different(pixels: &[u32], from: usize) -> Option<usize> {
    let not_color = pixels[from];
    (from + 1..pixels.len()).find(|&m| {
        let c = pixels[m];
        c != not_color && !is_transparent(c)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPAQUE_RED: u32 = 0xffff_0000;
    const OPAQUE_GREEN: u32 = 0xff00_ff00;
    const OPAQUE_BLUE: u32 = 0xff00_00ff;
    const OPAQUE_WHITE: u32 = 0xffff_ffff;
    const CLEAR: u32 = 0x0000_0000;

    #[test]
    fn all_transparent_has_no_anchors() {
        assert!(select_anchors(&[CLEAR; 9], 3, 10).is_none());
    }

    #[test]
    fn single_color_keeps_one_anchor() {
        let set = select_anchors(&[OPAQUE_RED; 6], 3, 10).unwrap();
        assert_eq!(set.anchors.len(), 1);
        assert_eq!(set.anchors[0], Anchor { pos: 0, color: OPAQUE_RED });
    }

    #[test]
    fn skips_uniform_background_corner() {
        // top-left is background; the first anchor must be the green pixel
        let pixels = [
            OPAQUE_RED, OPAQUE_RED, OPAQUE_RED, //
            OPAQUE_RED, OPAQUE_GREEN, OPAQUE_RED,
        ];
        let set = select_anchors(&pixels, 3, 10).unwrap();
        // the green pixel sits at pattern (1, 1); at frame width 10 that is
        // offset 11 from the candidate top-left
        assert_eq!(set.anchors[0], Anchor { pos: 11, color: OPAQUE_GREEN });
    }

    #[test]
    fn collects_up_to_four_distinct_colors() {
        let pixels = [
            OPAQUE_RED, OPAQUE_GREEN, OPAQUE_BLUE, //
            OPAQUE_WHITE, OPAQUE_RED, 0xff12_3456,
        ];
        let set = select_anchors(&pixels, 3, 3).unwrap();
        assert_eq!(set.anchors.len(), 4);
        let colors: Vec<u32> = set.anchors.iter().map(|a| a.color).collect();
        assert_eq!(colors, vec![OPAQUE_GREEN, OPAQUE_BLUE, OPAQUE_WHITE, OPAQUE_RED]);
    }

    #[test]
    fn transparent_pixels_never_anchor() {
        let pixels = [CLEAR, OPAQUE_GREEN, CLEAR, OPAQUE_BLUE];
        let set = select_anchors(&pixels, 2, 8).unwrap();
        assert!(set.anchors.iter().all(|a| a.color != CLEAR));
        assert_eq!(set.anchors[0], Anchor { pos: 1, color: OPAQUE_GREEN });
        assert_eq!(set.anchors[1], Anchor { pos: 8 + 1, color: OPAQUE_BLUE });
    }

    #[test]
    fn positions_use_frame_width() {
        let pixels = [
            OPAQUE_RED, OPAQUE_RED, //
            OPAQUE_RED, OPAQUE_GREEN,
        ];
        let set = select_anchors(&pixels, 2, 100).unwrap();
        // anchor 0 is the differing pixel at pattern (1, 1)
        assert_eq!(set.anchors[0].pos, 100 + 1);
    }

    #[test]
    fn unmatchable_flag_is_permanent() {
        let mut cache = AnchorCache::default();
        cache.ensure(&[CLEAR; 4], 2, 10);
        assert!(cache.get().is_none());
        // a different frame width must not trigger a recompute
        cache.ensure(&[CLEAR; 4], 2, 20);
        assert!(cache.get().is_none());
    }

    #[test]
    fn cache_recomputes_on_frame_width_change() {
        let pixels = [OPAQUE_RED, OPAQUE_RED, OPAQUE_RED, OPAQUE_GREEN];
        let mut cache = AnchorCache::default();
        cache.ensure(&pixels, 2, 10);
        assert_eq!(cache.get().unwrap().anchors[0].pos, 10 + 1);
        cache.ensure(&pixels, 2, 64);
        assert_eq!(cache.get().unwrap().anchors[0].pos, 64 + 1);
    }
}
