//! Drag reschedule -- converts a drop from one calendar cell onto another into
//! new block timestamps.
//!
//! The shift is `destination - source`, applied to both ends of the block, so
//! the block's duration is preserved exactly. Nothing is persisted here; the
//! caller hands the result to its store.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::block::BlockSpan;
use crate::error::EngineError;
use crate::model::{BlockId, ScheduledBlock, TaskId};

/// A drop target on the calendar: a day, optionally narrowed to a time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellKey {
    pub day: NaiveDate,
    pub slot: Option<NaiveTime>,
}

impl CellKey {
    pub fn day(day: NaiveDate) -> Self {
        Self { day, slot: None }
    }

    pub fn slot(at: NaiveDateTime) -> Self {
        Self {
            day: at.date(),
            slot: Some(at.time()),
        }
    }
}

impl FromStr for CellKey {
    type Err = EngineError;

    /// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM` or `YYYY-MM-DDTHH:MM:SS`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(CellKey::day(day));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
            .map(CellKey::slot)
            .map_err(|e| EngineError::InvalidCell(format!("'{}': {}", s, e)))
    }
}

impl TryFrom<String> for CellKey {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellKey> for String {
    fn from(key: CellKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot {
            Some(time) => write!(f, "{}T{}", self.day.format("%Y-%m-%d"), time.format("%H:%M")),
            None => write!(f, "{}", self.day.format("%Y-%m-%d")),
        }
    }
}

/// A completed drag gesture reported by the calendar surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragDrop {
    pub task_id: TaskId,
    /// Narrows the match to one block when the task owns several.
    #[serde(default)]
    pub block_id: Option<BlockId>,
    pub source: CellKey,
    pub destination: CellKey,
}

/// New times for one block, ready to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reschedule {
    pub block_id: BlockId,
    pub task_id: TaskId,
    #[serde(rename = "newStartTime")]
    pub start: NaiveDateTime,
    #[serde(rename = "newEndTime")]
    pub end: NaiveDateTime,
}

impl Reschedule {
    pub fn span(&self) -> BlockSpan {
        BlockSpan::new(self.start, self.end)
    }
}

/// Time between two cells.
///
/// Whole days unless both cells carry a slot, in which case the exact
/// datetime difference is used.
pub fn shift_delta(source: &CellKey, destination: &CellKey) -> Duration {
    match (source.slot, destination.slot) {
        (Some(from), Some(to)) => destination.day.and_time(to) - source.day.and_time(from),
        _ => Duration::days(destination.day.signed_duration_since(source.day).num_days()),
    }
}

/// Shift a span by the delta between two cells, preserving its duration.
///
/// Equal cells give back the span unchanged. A shift that would leave
/// chrono's representable range also leaves the span unchanged.
pub fn shift_span(span: &BlockSpan, source: &CellKey, destination: &CellKey) -> BlockSpan {
    let delta = shift_delta(source, destination);
    if delta.is_zero() {
        return *span;
    }
    match (
        span.start.checked_add_signed(delta),
        span.end.checked_add_signed(delta),
    ) {
        (Some(start), Some(end)) => BlockSpan { start, end },
        _ => {
            warn!(%source, %destination, "shift out of range; block left in place");
            *span
        }
    }
}

/// Resolve a drag against the blocks the caller holds.
///
/// Picks the block owned by `drop.task_id` (and matching `drop.block_id` if
/// set) that starts on the source day. Returns `None` when no block matches;
/// callers treat that as nothing to update.
pub fn reschedule(blocks: &[ScheduledBlock], drop: &DragDrop) -> Option<Reschedule> {
    let block = blocks.iter().find(|b| {
        b.task_id == drop.task_id
            && drop.block_id.is_none_or(|id| id == b.id)
            && b.start.date() == drop.source.day
    })?;

    let shifted = shift_span(&block.span(), &drop.source, &drop.destination);
    Some(Reschedule {
        block_id: block.id,
        task_id: block.task_id,
        start: shifted.start,
        end: shifted.end,
    })
}
