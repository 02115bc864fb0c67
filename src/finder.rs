//! The public finder: single search cycles and polling waits.
//!
//! An [`ImageFinder`] is built once from its patterns and settings, then
//! reused across cycles; anchor selections are cached on the patterns and
//! recomputed only when the frame width changes. Waiting re-acquires a
//! frame from a [`FrameSource`] every cycle; an unavailable target is a
//! benign "no match this cycle", never an error.

use std::thread;
use std::time::{Duration, Instant};

use crate::frame::{Frame, FrameSource};
use crate::pattern::Pattern;
use crate::search::enumerate;
use crate::search::{AlsoCallback, Match, Tolerance};
use crate::trace::{trace_event, trace_span};
use crate::util::{PixelFindError, PixelFindResult};

/// Polling schedule for wait loops.
///
/// The sleep between cycles starts at `start` and grows by `step` per
/// cycle up to `max`.
#[derive(Clone, Copy, Debug)]
pub struct PollOptions {
    /// First sleep period.
    pub start: Duration,
    /// Linear growth per cycle.
    pub step: Duration,
    /// Period ceiling.
    pub max: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            start: Duration::from_millis(10),
            step: Duration::from_millis(10),
            max: Duration::from_millis(500),
        }
    }
}

/// Search settings for an [`ImageFinder`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FinderOptions {
    /// Maximal allowed color difference, 0..=100. Use the smallest value
    /// that still finds the target; see [`Tolerance`] for the remap.
    pub diff: u32,
    /// Search the patterns of a list concurrently. Needs the `rayon`
    /// feature; without it the flag falls back to the sequential path.
    pub parallel: bool,
    /// Wait-loop polling schedule.
    pub poll: PollOptions,
}

/// Finds occurrences of reference patterns in captured frames.
pub struct ImageFinder {
    patterns: Vec<Pattern>,
    tolerance: Tolerance,
    parallel: bool,
    poll: PollOptions,
    also: Option<AlsoCallback>,
}

impl ImageFinder {
    /// Creates a finder for one or more patterns.
    pub fn new(patterns: Vec<Pattern>, options: FinderOptions) -> PixelFindResult<Self> {
        if patterns.is_empty() {
            return Err(PixelFindError::NoPatterns);
        }
        Ok(Self {
            patterns,
            tolerance: Tolerance::from_diff(options.diff)?,
            parallel: options.parallel,
            poll: options.poll,
            also: None,
        })
    }

    /// Attaches the also-callback invoked with every candidate occurrence.
    ///
    /// Without a callback the first candidate of the list is the result.
    pub fn with_callback(mut self, also: AlsoCallback) -> Self {
        self.also = Some(also);
        self
    }

    /// Runs one search cycle over a caller-supplied frame (a static image,
    /// for example). No waiting is possible on a frame that cannot change;
    /// the wait methods take a [`FrameSource`] instead.
    pub fn find_in(&mut self, frame: &Frame) -> Option<Match> {
        self.search_frame(frame)
    }

    /// Acquires one frame and runs one search cycle.
    ///
    /// An unavailable target yields `Ok(None)`.
    pub fn find(&mut self, source: &mut dyn FrameSource) -> PixelFindResult<Option<Match>> {
        Ok(match source.acquire()? {
            Some(frame) => self.search_frame(&frame),
            None => None,
        })
    }

    /// Like [`find`](Self::find), retrying for up to `|wait_secs|` seconds
    /// (`0.0` tries exactly once).
    ///
    /// When nothing is found in time: `Err(NotFound)`, or `Ok(None)` if
    /// `wait_secs` is negative.
    pub fn find_wait(
        &mut self,
        source: &mut dyn FrameSource,
        wait_secs: f64,
    ) -> PixelFindResult<Option<Match>> {
        if wait_secs == 0.0 {
            return match self.find(source)? {
                Some(found) => Ok(Some(found)),
                None => Err(PixelFindError::NotFound),
            };
        }
        match self.wait(wait_secs, source) {
            Err(PixelFindError::Timeout) => Err(PixelFindError::NotFound),
            other => other,
        }
    }

    /// Waits until a pattern is found.
    ///
    /// `timeout_secs`: `0` waits forever; on timeout a positive value
    /// produces `Err(Timeout)` and a negative one `Ok(None)`.
    pub fn wait(
        &mut self,
        timeout_secs: f64,
        source: &mut dyn FrameSource,
    ) -> PixelFindResult<Option<Match>> {
        let mut waiter = Waiter::new(timeout_secs, self.poll);
        loop {
            if let Some(found) = self.find(source)? {
                return Ok(Some(found));
            }
            if waiter.expired() {
                return waiter.timed_out().map(|()| None);
            }
            waiter.sleep();
        }
    }

    /// Waits until no pattern is found in a full cycle (including cycles
    /// where the target is unavailable).
    ///
    /// Returns `true` on success; timeout shape as in [`wait`](Self::wait),
    /// with `Ok(false)` for a negative timeout.
    pub fn wait_not(
        &mut self,
        timeout_secs: f64,
        source: &mut dyn FrameSource,
    ) -> PixelFindResult<bool> {
        let mut waiter = Waiter::new(timeout_secs, self.poll);
        loop {
            if self.find(source)?.is_none() {
                return Ok(true);
            }
            if waiter.expired() {
                return waiter.timed_out().map(|()| false);
            }
            waiter.sleep();
        }
    }

    /// Waits until the captured area visually changes.
    ///
    /// The first acquired frame's content hash is the baseline; the wait
    /// succeeds on the first frame whose hash differs, without running the
    /// matcher. Timeout shape as in [`wait`](Self::wait).
    pub fn wait_changed(
        timeout_secs: f64,
        source: &mut dyn FrameSource,
        poll: PollOptions,
    ) -> PixelFindResult<bool> {
        let mut waiter = Waiter::new(timeout_secs, poll);
        let mut baseline = None;
        loop {
            if let Some(frame) = source.acquire()? {
                let hash = frame.content_hash();
                match baseline {
                    None => baseline = Some(hash),
                    Some(first) if hash != first => return Ok(true),
                    Some(_) => {}
                }
            }
            if waiter.expired() {
                return waiter.timed_out().map(|()| false);
            }
            waiter.sleep();
        }
    }

    fn search_frame(&mut self, frame: &Frame) -> Option<Match> {
        let _span = trace_span!(
            "search_frame",
            width = frame.width(),
            height = frame.height(),
            patterns = self.patterns.len()
        )
        .entered();

        // skip the cycle entirely when no pattern fits the frame
        if !self
            .patterns
            .iter()
            .any(|p| p.fits(frame.width(), frame.height()))
        {
            return None;
        }

        // anchors are computed before any dispatch, so parallel tasks can
        // borrow the patterns immutably
        for pattern in &mut self.patterns {
            pattern.ensure_anchors(frame.width());
        }

        let result = self.dispatch(frame);
        trace_event!("search_done", found = result.is_some());
        result
    }

    fn dispatch(&self, frame: &Frame) -> Option<Match> {
        #[cfg(feature = "rayon")]
        if self.parallel && self.patterns.len() > 1 {
            return crate::search::parallel::search_list_parallel(
                frame,
                &self.patterns,
                self.tolerance,
                self.also.as_ref(),
            );
        }
        #[cfg(not(feature = "rayon"))]
        let _ = self.parallel;

        enumerate::search_list(frame, &self.patterns, self.tolerance, self.also.as_ref())
    }
}

/// Timeout bookkeeping for one wait loop.
struct Waiter {
    deadline: Option<Instant>,
    throw: bool,
    period: Duration,
    poll: PollOptions,
}

impl Waiter {
    /// `timeout_secs`: `0` = no deadline; the sign selects the timeout
    /// shape (positive throws, negative reports "not found").
    fn new(timeout_secs: f64, poll: PollOptions) -> Self {
        let deadline = (timeout_secs != 0.0)
            .then(|| Instant::now() + Duration::from_secs_f64(timeout_secs.abs()));
        Self {
            deadline,
            throw: timeout_secs > 0.0,
            period: poll.start,
            poll,
        }
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// The designed timeout outcome: an error or a plain "not found".
    fn timed_out(&self) -> PixelFindResult<()> {
        if self.throw {
            Err(PixelFindError::Timeout)
        } else {
            Ok(())
        }
    }

    fn sleep(&mut self) {
        thread::sleep(self.period);
        self.period = (self.period + self.poll.step).min(self.poll.max);
    }
}
