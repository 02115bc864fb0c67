//! Candidate enumeration and the continuation protocol.
//!
//! For each pattern of the list, the enumerator drives the scanner and
//! reports every candidate to the also-callback, applying its decision:
//! keep enumerating this pattern, move to the next pattern, or stop. "Ok"
//! decisions that keep searching are remembered in a shared partial slot;
//! the cycle's outcome is the terminal result, or the remembered partial
//! when no terminal result was produced.
//!
//! The same routine serves the sequential path and the parallel tasks; the
//! shared slot is always mutated under its lock, and the cooperative stop
//! flag is polled between candidate evaluations, never preemptively.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::frame::Frame;
use crate::pattern::Pattern;
use crate::search::scan::PatternScanner;
use crate::search::{AlsoCallback, AlsoDecision, Match, Rect, Tolerance};

/// Shared landing slot for the results of one search cycle.
#[derive(Debug, Default)]
pub(crate) struct SearchOutcome {
    /// Terminal result: `OkReturn`, or the first hit when no callback is
    /// supplied.
    pub result: Option<Match>,
    /// Best candidate remembered by a non-terminal `Ok*` decision.
    pub partial: Option<Match>,
}

impl SearchOutcome {
    /// Final report of the cycle.
    pub fn into_match(self) -> Option<Match> {
        self.result.or(self.partial)
    }
}

/// Locks the outcome slot, surviving a poisoned lock.
///
/// A callback panic in another pattern task poisons the mutex; the slot
/// data itself stays coherent, so remaining tasks keep using it.
pub(crate) fn lock_outcome(shared: &Mutex<SearchOutcome>) -> MutexGuard<'_, SearchOutcome> {
    match shared.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub(crate) fn unwrap_outcome(shared: Mutex<SearchOutcome>) -> SearchOutcome {
    match shared.into_inner() {
        Ok(outcome) => outcome,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Searches one pattern of the list, reporting candidates through the
/// continuation protocol.
///
/// Returns `true` when the remaining patterns of the list must not be
/// searched: a terminal decision was made, or the scan was exhausted after
/// an `*OfThis` decision.
#[allow(clippy::too_many_arguments)]
pub(crate) fn search_pattern(
    frame: &Frame,
    pattern: &Pattern,
    list_index: usize,
    tolerance: Tolerance,
    also: Option<&AlsoCallback>,
    shared: &Mutex<SearchOutcome>,
    stop: &AtomicBool,
    parallel: bool,
) -> bool {
    let mut decision = AlsoDecision::FindOtherOfList;
    let mut match_index = 0usize;
    // an *OfThis decision stops the other tasks but not this one
    let mut observe_stop = parallel;

    let Some(anchors) = pattern.anchor_set() else {
        return false;
    };
    let Some(mut scanner) = PatternScanner::new(frame, pattern, anchors, tolerance) else {
        return false;
    };

    let frame_width = frame.width();
    let (offset_x, offset_y) = frame.offset();

    loop {
        if observe_stop && stop.load(Ordering::Relaxed) {
            break;
        }
        let Some(top_left) = scanner.next() else {
            break;
        };

        let found = Match {
            rect: Rect {
                x: (top_left % frame_width) as i32 + offset_x,
                y: (top_left / frame_width) as i32 + offset_y,
                width: pattern.width() as i32,
                height: pattern.height() as i32,
            },
            match_index,
            list_index,
        };

        let mut slot = lock_outcome(shared);
        if observe_stop && stop.load(Ordering::Relaxed) {
            break;
        }

        if let Some(also) = also {
            decision = also(&found);
            if parallel
                && matches!(
                    decision,
                    AlsoDecision::OkFindMoreOfThis | AlsoDecision::FindOtherOfThis
                )
            {
                // raised while holding the lock, so no other task can call
                // the callback after this point
                stop.store(true, Ordering::Relaxed);
                observe_stop = false;
            }
            match decision {
                AlsoDecision::OkFindMore | AlsoDecision::OkFindMoreOfThis => {
                    slot.partial = Some(found);
                    match_index += 1;
                    continue;
                }
                AlsoDecision::FindOther | AlsoDecision::FindOtherOfThis => {
                    match_index += 1;
                    continue;
                }
                AlsoDecision::OkFindMoreOfList => {
                    slot.partial = Some(found);
                    return false;
                }
                AlsoDecision::FindOtherOfList => return false,
                AlsoDecision::OkReturn | AlsoDecision::NotFound => {}
            }
        }

        if decision != AlsoDecision::NotFound {
            slot.result = Some(found);
        }
        if parallel {
            stop.store(true, Ordering::Relaxed);
        }
        return true;
    }

    matches!(
        decision,
        AlsoDecision::OkFindMoreOfThis | AlsoDecision::FindOtherOfThis
    )
}

/// Sequential search over the whole pattern list, in list order.
pub(crate) fn search_list(
    frame: &Frame,
    patterns: &[Pattern],
    tolerance: Tolerance,
    also: Option<&AlsoCallback>,
) -> Option<Match> {
    let shared = Mutex::new(SearchOutcome::default());
    let stop = AtomicBool::new(false);
    for (list_index, pattern) in patterns.iter().enumerate() {
        if search_pattern(
            frame, pattern, list_index, tolerance, also, &shared, &stop, false,
        ) {
            break;
        }
    }
    unwrap_outcome(shared).into_match()
}
