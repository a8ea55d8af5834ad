//! Block derivation -- turns a task's start time and duration into the
//! concrete interval it occupies on the calendar.
//!
//! Auto-scheduling is a same-slot placeholder: an auto-scheduled task gets
//! exactly one block `[start, start + duration]`. No free-time search is done.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::Task;

/// A half-open `[start, end)` interval in local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockSpan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BlockSpan {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Duration in minutes, including fractional minutes.
    pub fn duration_minutes(&self) -> f64 {
        self.duration().num_milliseconds() as f64 / 60_000.0
    }

    /// True for zero-length (or inverted) spans.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Two spans overlap iff `a.start < b.end && b.start < a.end`.
    /// Adjacent spans do not overlap.
    pub fn overlaps(&self, other: &BlockSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Derive the block for a task starting at `start` and lasting
/// `duration_minutes`.
///
/// A zero duration yields a zero-length span rather than an error; callers
/// validate durations upstream. An end past the last representable datetime
/// also yields `[start, start]`.
pub fn derive_block(start: NaiveDateTime, duration_minutes: u32) -> BlockSpan {
    let duration = Duration::minutes(i64::from(duration_minutes));
    match start.checked_add_signed(duration) {
        Some(end) => BlockSpan { start, end },
        None => {
            warn!(%start, duration_minutes, "block end out of range; using empty span");
            BlockSpan { start, end: start }
        }
    }
}

/// Blocks to create for a task when it is saved.
///
/// Empty unless the task is auto-scheduled, in which case it holds exactly
/// one block spanning the task's duration from its start time.
pub fn plan_blocks(task: &Task) -> Vec<BlockSpan> {
    if !task.auto_scheduled {
        return Vec::new();
    }
    vec![derive_block(task.start, task.duration_minutes)]
}
