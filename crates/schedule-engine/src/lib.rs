//! # schedule-engine
//!
//! Deterministic time-blocking arithmetic for task calendars.
//!
//! A task carries a start time and a duration; when it is auto-scheduled the
//! engine derives the concrete block it occupies, maps that block onto a
//! fixed-hour week grid, and turns a drag-and-drop between day cells into new
//! start/end timestamps. All timestamps are local wall-clock time
//! (`NaiveDateTime`).
//!
//! ```rust
//! use chrono::NaiveDate;
//! use schedule_engine::{derive_block, grid_position, GridConfig};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 15)
//!     .unwrap()
//!     .and_hms_opt(11, 0, 0)
//!     .unwrap();
//! let block = derive_block(start, 90);
//! let pos = grid_position(&block, &GridConfig::default());
//! assert_eq!(pos.top, 320.0);
//! assert_eq!(pos.height, 120.0);
//! ```
//!
//! ## Modules
//!
//! - [`block`] — task start + duration → scheduled block
//! - [`grid`] — block → pixel offset/height in a day column
//! - [`week`] — seven-day column layout of many blocks
//! - [`reschedule`] — drag between calendar cells → shifted block
//! - [`overlap`] — overlap detection and the configurable overlap policy
//! - [`model`] — tasks, blocks, tags, owners and input validation
//! - [`store`] — task persistence collaborators (memory, JSON file)
//! - [`planner`] — request-level task operations over a store
//! - [`error`] — Error types

pub mod block;
pub mod error;
pub mod grid;
pub mod model;
pub mod overlap;
pub mod planner;
pub mod reschedule;
pub mod store;
pub mod week;

pub use block::{derive_block, plan_blocks, BlockSpan};
pub use error::EngineError;
pub use grid::{grid_position, GridConfig, GridPosition};
pub use model::{
    parse_local_datetime, BlockId, Principal, ScheduledBlock, Tag, Task, TaskDraft, TaskId,
    TaskWithBlocks,
};
pub use overlap::{find_overlaps, Overlap, OverlapPolicy};
pub use planner::Planner;
pub use reschedule::{reschedule, shift_span, CellKey, DragDrop, Reschedule};
pub use store::{JsonFileStore, MemoryStore, TaskStore};
pub use week::{layout_week, week_days, WeekGrid};
