//! Seven-day column layout for the week view.
//!
//! Each block is placed in the column of the day it starts on and positioned
//! with [`grid_position`]. Blocks outside the week are dropped; blocks outside
//! the visible hours are kept unclipped.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::grid::{grid_position, GridConfig, GridPosition};
use crate::model::{BlockId, ScheduledBlock, TaskId};

/// One block drawn in a day column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub task_id: TaskId,
    pub block_id: BlockId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub position: GridPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekGrid {
    pub config: GridConfig,
    pub days: Vec<DayColumn>,
}

impl WeekGrid {
    /// Number of blocks placed across all columns.
    pub fn placement_count(&self) -> usize {
        self.days.iter().map(|d| d.placements.len()).sum()
    }
}

/// The seven dates of the week containing `anchor`, beginning on `week_start`.
pub fn week_days(anchor: NaiveDate, week_start: Weekday) -> [NaiveDate; 7] {
    let offset = (7 + anchor.weekday().num_days_from_monday()
        - week_start.num_days_from_monday())
        % 7;
    let first = anchor - Duration::days(i64::from(offset));
    std::array::from_fn(|i| first + Duration::days(i as i64))
}

/// Lay out `blocks` over the week containing `anchor`.
///
/// Placements within a column are sorted by start time, then end time.
pub fn layout_week(
    anchor: NaiveDate,
    blocks: &[ScheduledBlock],
    config: &GridConfig,
    week_start: Weekday,
) -> WeekGrid {
    let days = week_days(anchor, week_start)
        .into_iter()
        .map(|date| {
            let mut placements: Vec<Placement> = blocks
                .iter()
                .filter(|b| b.start.date() == date)
                .map(|b| Placement {
                    task_id: b.task_id,
                    block_id: b.id,
                    start: b.start,
                    end: b.end,
                    position: grid_position(&b.span(), config),
                })
                .collect();
            placements.sort_by_key(|p| (p.start, p.end));
            DayColumn { date, placements }
        })
        .collect();

    WeekGrid {
        config: *config,
        days,
    }
}
