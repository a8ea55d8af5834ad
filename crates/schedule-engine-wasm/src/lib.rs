//! WASM bindings for schedule-engine.
//!
//! Exposes block derivation, grid geometry, week layout, drag rescheduling and
//! overlap detection to the browser calendar via `wasm-bindgen`. All complex
//! types cross the boundary as JSON strings; datetimes are local wall-clock
//! ISO 8601 strings (`2024-01-15T11:00:00`).
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p schedule-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/wasm/ \
//!   target/wasm32-unknown-unknown/release/schedule_engine_wasm.wasm
//! ```

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use schedule_engine::block::BlockSpan;
use schedule_engine::{
    parse_local_datetime, BlockId, CellKey, DragDrop, GridConfig, GridPosition, Reschedule,
    ScheduledBlock, TaskId,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SpanDto {
    start: String,
    end: String,
}

impl From<&BlockSpan> for SpanDto {
    fn from(s: &BlockSpan) -> Self {
        Self {
            start: s.start.format(DATETIME_FORMAT).to_string(),
            end: s.end.format(DATETIME_FORMAT).to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RescheduleDto {
    block_id: BlockId,
    task_id: TaskId,
    new_start_time: String,
    new_end_time: String,
}

impl From<&Reschedule> for RescheduleDto {
    fn from(r: &Reschedule) -> Self {
        Self {
            block_id: r.block_id,
            task_id: r.task_id,
            new_start_time: r.start.format(DATETIME_FORMAT).to_string(),
            new_end_time: r.end.format(DATETIME_FORMAT).to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OverlapDto {
    block_id: BlockId,
    task_id: TaskId,
    overlap_minutes: i64,
}

/// Block records as the calendar front-end holds them.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockInput {
    id: BlockId,
    task_id: TaskId,
    start_time: String,
    end_time: String,
}

/// Drop event as reported by the drag surface.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DropInput {
    task_id: TaskId,
    #[serde(default)]
    block_id: Option<BlockId>,
    source: String,
    destination: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    parse_local_datetime(s).map_err(|e| e.to_string())
}

fn parse_span(start: &str, end: &str) -> Result<BlockSpan, String> {
    Ok(BlockSpan::new(parse_datetime(start)?, parse_datetime(end)?))
}

fn parse_cell(s: &str) -> Result<CellKey, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_grid(config_json: Option<&str>) -> Result<GridConfig, String> {
    let config = match config_json {
        Some(json) if !json.trim().is_empty() => serde_json::from_str::<GridConfig>(json)
            .map_err(|e| format!("Invalid grid config JSON: {}", e))?,
        _ => GridConfig::default(),
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn parse_blocks_json(json: &str) -> Result<Vec<ScheduledBlock>, String> {
    let inputs: Vec<BlockInput> =
        serde_json::from_str(json).map_err(|e| format!("Invalid blocks JSON: {}", e))?;

    inputs
        .into_iter()
        .map(|input| {
            Ok(ScheduledBlock {
                id: input.id,
                task_id: input.task_id,
                start: parse_datetime(&input.start_time)?,
                end: parse_datetime(&input.end_time)?,
            })
        })
        .collect()
}

fn parse_weekday(s: Option<&str>) -> Result<Weekday, String> {
    match s {
        Some(day) => day
            .parse::<Weekday>()
            .map_err(|_| format!("Invalid week start '{}'", day)),
        None => Ok(Weekday::Sun),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

// ---------------------------------------------------------------------------
// Implementations (plain `String` errors, testable off-wasm)
// ---------------------------------------------------------------------------

fn derive_block_impl(start: &str, duration_minutes: u32) -> Result<String, String> {
    let block = schedule_engine::derive_block(parse_datetime(start)?, duration_minutes);
    to_json(&SpanDto::from(&block))
}

fn grid_position_impl(start: &str, end: &str, config_json: Option<&str>) -> Result<String, String> {
    let span = parse_span(start, end)?;
    let config = parse_grid(config_json)?;
    let pos: GridPosition = schedule_engine::grid_position(&span, &config);
    to_json(&pos)
}

fn shift_block_impl(
    start: &str,
    end: &str,
    source: &str,
    destination: &str,
) -> Result<String, String> {
    let span = parse_span(start, end)?;
    let moved = schedule_engine::shift_span(&span, &parse_cell(source)?, &parse_cell(destination)?);
    to_json(&SpanDto::from(&moved))
}

fn reschedule_block_impl(blocks_json: &str, drop_json: &str) -> Result<String, String> {
    let blocks = parse_blocks_json(blocks_json)?;
    let input: DropInput =
        serde_json::from_str(drop_json).map_err(|e| format!("Invalid drop JSON: {}", e))?;
    let drop = DragDrop {
        task_id: input.task_id,
        block_id: input.block_id,
        source: parse_cell(&input.source)?,
        destination: parse_cell(&input.destination)?,
    };

    let dto = schedule_engine::reschedule(&blocks, &drop).map(|r| RescheduleDto::from(&r));
    to_json(&dto)
}

fn layout_week_impl(
    blocks_json: &str,
    anchor: &str,
    config_json: Option<&str>,
    week_start: Option<&str>,
) -> Result<String, String> {
    let blocks = parse_blocks_json(blocks_json)?;
    let anchor = NaiveDate::parse_from_str(anchor, "%Y-%m-%d")
        .map_err(|e| format!("Invalid anchor date '{}': {}", anchor, e))?;
    let config = parse_grid(config_json)?;
    let week = schedule_engine::layout_week(anchor, &blocks, &config, parse_weekday(week_start)?);
    to_json(&week)
}

fn find_overlaps_impl(start: &str, end: &str, blocks_json: &str) -> Result<String, String> {
    let span = parse_span(start, end)?;
    let blocks = parse_blocks_json(blocks_json)?;
    let dtos: Vec<OverlapDto> = schedule_engine::find_overlaps(&span, None, &blocks)
        .iter()
        .map(|o| OverlapDto {
            block_id: o.block.id,
            task_id: o.block.task_id,
            overlap_minutes: o.overlap_minutes,
        })
        .collect();
    to_json(&dtos)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Derive a task's block from its start time and duration.
///
/// Returns a JSON `{start, end}` object.
#[wasm_bindgen(js_name = "deriveBlock")]
pub fn derive_block(start: &str, duration_minutes: u32) -> Result<String, JsValue> {
    derive_block_impl(start, duration_minutes).map_err(|e| JsValue::from_str(&e))
}

/// Pixel geometry of a block within its day column.
///
/// `config_json` is an optional `{first_hour, visible_hours, hour_height}`
/// object; omitted fields take the defaults (7, 16, 80). Returns a JSON
/// `{top, height}` object.
#[wasm_bindgen(js_name = "gridPosition")]
pub fn grid_position(
    start: &str,
    end: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    grid_position_impl(start, end, config_json.as_deref()).map_err(|e| JsValue::from_str(&e))
}

/// Shift a block from one calendar cell to another, preserving its duration.
///
/// Cells are `YYYY-MM-DD` day keys or `YYYY-MM-DDTHH:MM` slot keys. Returns a
/// JSON `{start, end}` object.
#[wasm_bindgen(js_name = "shiftBlock")]
pub fn shift_block(
    start: &str,
    end: &str,
    source: &str,
    destination: &str,
) -> Result<String, JsValue> {
    shift_block_impl(start, end, source, destination).map_err(|e| JsValue::from_str(&e))
}

/// Resolve a drop against the task's blocks.
///
/// `blocks_json` is an array of `{id, taskId, startTime, endTime}` records;
/// `drop_json` is `{taskId, blockId?, source, destination}`. Returns
/// `{blockId, taskId, newStartTime, newEndTime}`, or `null` when the task has
/// no block on the source day.
#[wasm_bindgen(js_name = "rescheduleBlock")]
pub fn reschedule_block(blocks_json: &str, drop_json: &str) -> Result<String, JsValue> {
    reschedule_block_impl(blocks_json, drop_json).map_err(|e| JsValue::from_str(&e))
}

/// Lay out blocks over the week containing `anchor` (`YYYY-MM-DD`).
///
/// `week_start` is a weekday name such as `"Sun"` or `"Mon"` (default Sunday).
#[wasm_bindgen(js_name = "layoutWeek")]
pub fn layout_week(
    blocks_json: &str,
    anchor: &str,
    config_json: Option<String>,
    week_start: Option<String>,
) -> Result<String, JsValue> {
    layout_week_impl(
        blocks_json,
        anchor,
        config_json.as_deref(),
        week_start.as_deref(),
    )
    .map_err(|e| JsValue::from_str(&e))
}

/// Blocks that the span `[start, end)` runs into.
///
/// Returns an array of `{blockId, taskId, overlapMinutes}`.
#[wasm_bindgen(js_name = "findOverlaps")]
pub fn find_overlaps(start: &str, end: &str, blocks_json: &str) -> Result<String, JsValue> {
    find_overlaps_impl(start, end, blocks_json).map_err(|e| JsValue::from_str(&e))
}
