//! Candidate scanning for one pattern.
//!
//! Scanning is two-phase. Phase 1 walks a cursor over the frame comparing
//! only anchor 0's color, restricted to valid top-left placements; most
//! positions are rejected by this single comparison. Phase 2 checks the
//! remaining anchors at their precomputed offsets and then compares every
//! pattern pixel row by row. Any phase-2 mismatch resumes phase 1 at the
//! next cursor position, so the scanner can enumerate all occurrences in
//! row-major order.

use crate::frame::Frame;
use crate::pattern::{Anchor, AnchorSet, Pattern};
use crate::search::Tolerance;

/// Matches one pattern pixel against a frame pixel with zero tolerance.
///
/// A transparent pattern pixel matches anything; the frame's alpha byte is
/// ignored.
#[inline]
pub(crate) fn match_pixel_exact(frame_px: u32, pattern_px: u32) -> bool {
    pattern_px == (frame_px | 0xff00_0000) || pattern_px < 0xff00_0000
}

/// Matches one pattern pixel against a frame pixel, allowing each RGB
/// channel to differ by up to `tolerance`.
#[inline]
pub(crate) fn match_pixel_diff(frame_px: u32, pattern_px: u32, tolerance: u32) -> bool {
    if pattern_px < 0xff00_0000 {
        return true;
    }
    (pattern_px & 0xff).abs_diff(frame_px & 0xff) <= tolerance
        && (pattern_px >> 8 & 0xff).abs_diff(frame_px >> 8 & 0xff) <= tolerance
        && (pattern_px >> 16 & 0xff).abs_diff(frame_px >> 16 & 0xff) <= tolerance
}

/// Resumable scanner yielding flat top-left offsets of full matches, in
/// left-to-right, top-to-bottom order.
pub(crate) struct PatternScanner<'a> {
    frame_pixels: &'a [u32],
    frame_width: usize,
    pattern_pixels: &'a [u32],
    pattern_width: usize,
    anchors: &'a [Anchor],
    tolerance: u32,
    /// `frame_width - pattern_width`: anchor-0 positions per row, minus one.
    span: usize,
    /// Next anchor-0 position to test.
    cursor: usize,
    /// Last anchor-0 position of the current row.
    line_last: usize,
    /// Last anchor-0 position of the whole valid region.
    last: usize,
    done: bool,
}

impl<'a> PatternScanner<'a> {
    /// Returns `None` when the pattern does not fit the frame; that is a
    /// policy "never matches", not an error.
    pub fn new(
        frame: &'a Frame,
        pattern: &'a Pattern,
        anchors: &'a AnchorSet,
        tolerance: Tolerance,
    ) -> Option<Self> {
        let frame_width = frame.width();
        let frame_height = frame.height();
        let pattern_width = pattern.width();
        let pattern_height = pattern.height();
        if !pattern.fits(frame_width, frame_height) {
            return None;
        }

        // The cursor tracks anchor 0's frame offset. With the pattern's
        // top-left placed at flat index t, anchor 0 sits at t + pos, so the
        // valid cursor band is the placement band shifted by pos.
        let span = frame_width - pattern_width;
        let first = anchors.anchors[0].pos;
        Some(Self {
            frame_pixels: frame.pixels(),
            frame_width,
            pattern_pixels: pattern.pixels(),
            pattern_width,
            anchors: &anchors.anchors,
            tolerance: tolerance.value(),
            span,
            cursor: first,
            line_last: first + span,
            last: first + frame_width * (frame_height - pattern_height) + span,
            done: false,
        })
    }

    #[inline]
    fn anchor0_hits(&self, frame_px: u32) -> bool {
        let color = self.anchors[0].color;
        if self.tolerance == 0 {
            (frame_px ^ color) & 0x00ff_ffff == 0
        } else {
            match_pixel_diff(frame_px, color, self.tolerance)
        }
    }

    /// Phase 2: remaining anchors, then the full row-by-row comparison.
    fn verify(&self, top_left: usize) -> bool {
        for anchor in &self.anchors[1..] {
            let frame_px = self.frame_pixels[top_left + anchor.pos];
            let hit = if self.tolerance == 0 {
                match_pixel_exact(frame_px, anchor.color)
            } else {
                match_pixel_diff(frame_px, anchor.color, self.tolerance)
            };
            if !hit {
                return false;
            }
        }

        let width = self.pattern_width;
        let mut row_start = top_left;
        for pattern_row in self.pattern_pixels.chunks_exact(width) {
            let frame_row = &self.frame_pixels[row_start..row_start + width];
            if self.tolerance == 0 {
                for (&f, &p) in frame_row.iter().zip(pattern_row) {
                    if !match_pixel_exact(f, p) {
                        return false;
                    }
                }
            } else {
                for (&f, &p) in frame_row.iter().zip(pattern_row) {
                    if !match_pixel_diff(f, p, self.tolerance) {
                        return false;
                    }
                }
            }
            row_start += self.frame_width;
        }
        true
    }
}

impl Iterator for PatternScanner<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        loop {
            while self.cursor <= self.line_last {
                let at = self.cursor;
                self.cursor += 1;
                if self.anchor0_hits(self.frame_pixels[at]) {
                    let top_left = at - self.anchors[0].pos;
                    if self.verify(top_left) {
                        return Some(top_left);
                    }
                }
            }
            if self.line_last >= self.last {
                self.done = true;
                return None;
            }
            // hop the cursor over the right margin to the next row's band
            self.cursor = self.line_last + self.pattern_width;
            self.line_last = self.cursor + self.span;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_of(pixels: Vec<u32>, width: usize, height: usize) -> Frame {
        Frame::new(pixels, width, height).unwrap()
    }

    fn scanner_hits(frame: &Frame, pattern: &mut Pattern) -> Vec<usize> {
        pattern.ensure_anchors(frame.width());
        let pattern = &*pattern;
        let anchors = pattern.anchor_set().unwrap();
        let scanner = PatternScanner::new(
            frame,
            pattern,
            anchors,
            Tolerance::from_diff(0).unwrap(),
        )
        .unwrap();
        scanner.collect()
    }

    #[test]
    fn exact_match_respects_transparency() {
        assert!(match_pixel_exact(0x0011_2233, 0xff11_2233));
        assert!(match_pixel_exact(0xff11_2233, 0xff11_2233));
        assert!(!match_pixel_exact(0xff11_2234, 0xff11_2233));
        // transparent pattern pixel matches anything
        assert!(match_pixel_exact(0xffaa_bbcc, 0x7f11_2233));
    }

    #[test]
    fn diff_match_bounds_every_channel() {
        let p = 0xff64_6464;
        assert!(match_pixel_diff(0xff6e_5a64, p, 10));
        assert!(!match_pixel_diff(0xff6f_6464, p, 10));
        assert!(!match_pixel_diff(0xff64_5964, p, 10));
        assert!(match_pixel_diff(0x0000_0000, 0x00ff_ffff, 0));
    }

    #[test]
    fn finds_all_occurrences_in_row_major_order() {
        let b = 0xff00_0000u32;
        let w = 0xffff_ffffu32;
        #[rustfmt::skip]
        let pixels = vec![
            w, b, w, b,
            w, w, w, w,
            w, b, w, w,
        ];
        let frame = frame_of(pixels, 4, 3);
        let mut pattern = Pattern::from_pixels(vec![b], 1, 1).unwrap();
        assert_eq!(scanner_hits(&frame, &mut pattern), vec![1, 3, 9]);
    }

    #[test]
    fn rejects_pattern_larger_than_frame() {
        let frame = frame_of(vec![0xffff_ffff; 4], 2, 2);
        let mut pattern = Pattern::from_pixels(vec![0xffff_ffff; 6], 3, 2).unwrap();
        pattern.ensure_anchors(frame.width());
        let anchors = pattern.anchor_set().unwrap();
        assert!(PatternScanner::new(
            &frame,
            &pattern,
            anchors,
            Tolerance::from_diff(0).unwrap()
        )
        .is_none());
    }

    #[test]
    fn anchor_offsets_follow_candidate_rows() {
        // 2x2 pattern whose anchor 0 is not the top-left pixel
        let r = 0xffff_0000u32;
        let g = 0xff00_ff00u32;
        #[rustfmt::skip]
        let pattern_pixels = vec![
            r, r,
            r, g,
        ];
        let mut pattern = Pattern::from_pixels(pattern_pixels, 2, 2).unwrap();

        let x = 0xff12_3456u32;
        #[rustfmt::skip]
        let pixels = vec![
            x, x, x, x, x,
            x, x, r, r, x,
            x, x, r, g, x,
            x, x, x, x, x,
        ];
        let frame = frame_of(pixels, 5, 4);
        // top-left of the only occurrence is (2, 1) -> flat 7
        assert_eq!(scanner_hits(&frame, &mut pattern), vec![7]);
    }
}
