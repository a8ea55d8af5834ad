//! Tests for the seven-day layout.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use schedule_engine::{layout_week, week_days, BlockId, GridConfig, ScheduledBlock, TaskId};

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn at(month: u32, day: u32, hour: u32, min: u32) -> NaiveDateTime {
    date(month, day).and_hms_opt(hour, min, 0).unwrap()
}

fn block(start: NaiveDateTime, end: NaiveDateTime) -> ScheduledBlock {
    ScheduledBlock {
        id: BlockId::new(),
        task_id: TaskId::new(),
        start,
        end,
    }
}

#[test]
fn sunday_first_week_of_a_monday() {
    // 2024-01-15 is a Monday.
    let days = week_days(date(1, 15), Weekday::Sun);

    assert_eq!(days[0], date(1, 14));
    assert_eq!(days[6], date(1, 20));
    assert_eq!(days[0].weekday(), Weekday::Sun);
}

#[test]
fn monday_first_week_starts_on_anchor() {
    let days = week_days(date(1, 15), Weekday::Mon);
    assert_eq!(days[0], date(1, 15));
    assert_eq!(days[6], date(1, 21));
}

#[test]
fn anchor_on_week_start_is_first_column() {
    let days = week_days(date(1, 14), Weekday::Sun);
    assert_eq!(days[0], date(1, 14));
}

#[test]
fn week_spanning_year_end() {
    // 2024-01-01 is a Monday; its Sunday-first week starts 2023-12-31.
    let days = week_days(date(1, 1), Weekday::Sun);
    assert_eq!(days[0], NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    assert_eq!(days[1], date(1, 1));
}

#[test]
fn blocks_land_in_their_start_day_column() {
    let blocks = vec![
        block(at(1, 17, 14, 0), at(1, 17, 15, 0)),
        block(at(1, 15, 11, 0), at(1, 15, 12, 30)),
        block(at(1, 15, 8, 0), at(1, 15, 9, 0)),
        // Outside the week: dropped.
        block(at(1, 22, 9, 0), at(1, 22, 10, 0)),
    ];

    let week = layout_week(date(1, 15), &blocks, &GridConfig::default(), Weekday::Sun);

    assert_eq!(week.days.len(), 7);
    assert_eq!(week.placement_count(), 3);

    let monday = &week.days[1];
    assert_eq!(monday.date, date(1, 15));
    assert_eq!(monday.placements.len(), 2);
    // Sorted by start time.
    assert_eq!(monday.placements[0].block_id, blocks[2].id);
    assert_eq!(monday.placements[1].block_id, blocks[1].id);
    assert_eq!(monday.placements[1].position.top, 320.0);
    assert_eq!(monday.placements[1].position.height, 120.0);

    let wednesday = &week.days[3];
    assert_eq!(wednesday.placements.len(), 1);
    assert_eq!(wednesday.placements[0].task_id, blocks[0].task_id);
}

#[test]
fn empty_week_has_seven_empty_columns() {
    let week = layout_week(date(1, 15), &[], &GridConfig::default(), Weekday::Sun);
    assert_eq!(week.days.len(), 7);
    assert!(week.days.iter().all(|d| d.placements.is_empty()));
}
