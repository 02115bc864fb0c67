//! Parallel fan-out across the pattern list.
//!
//! Each pattern of the list is searched by its own task against the same
//! immutable frame. The result slot is a single mutex; the stop flag is
//! cooperative and polled between candidate evaluations, so a task that
//! started a full comparison finishes it. When several tasks find
//! candidates simultaneously, whichever acquires the lock first wins;
//! cross-pattern ordering is not deterministic. Within one pattern the
//! visitation order stays row-major.

use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

use rayon::prelude::*;

use crate::frame::Frame;
use crate::pattern::Pattern;
use crate::search::enumerate::{search_pattern, unwrap_outcome, SearchOutcome};
use crate::search::{AlsoCallback, Match, Tolerance};

/// Searches every pattern concurrently over a fixed worker pool.
///
/// Anchor sets must already be computed; tasks only read the patterns.
pub(crate) fn search_list_parallel(
    frame: &Frame,
    patterns: &[Pattern],
    tolerance: Tolerance,
    also: Option<&AlsoCallback>,
) -> Option<Match> {
    let shared = Mutex::new(SearchOutcome::default());
    let stop = AtomicBool::new(false);
    patterns
        .par_iter()
        .enumerate()
        .for_each(|(list_index, pattern)| {
            search_pattern(
                frame, pattern, list_index, tolerance, also, &shared, &stop, true,
            );
        });
    unwrap_outcome(shared).into_match()
}
