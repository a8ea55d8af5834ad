//! Request-level task operations.
//!
//! [`Planner`] wires input validation, block derivation, the overlap policy
//! and drag rescheduling to an injected [`TaskStore`]. Every call names the
//! principal it acts for; tasks belonging to anyone else are reported as not
//! found.

use chrono::{NaiveDate, Weekday};
use tracing::{debug, info, warn};

use crate::block::plan_blocks;
use crate::error::{EngineError, Result};
use crate::grid::GridConfig;
use crate::model::{Principal, ScheduledBlock, Task, TaskDraft, TaskId, TaskWithBlocks};
use crate::overlap::OverlapPolicy;
use crate::reschedule::{reschedule, DragDrop};
use crate::store::TaskStore;
use crate::week::{layout_week, WeekGrid};

pub struct Planner<S> {
    store: S,
    grid: GridConfig,
    overlap: OverlapPolicy,
    week_start: Weekday,
}

impl<S: TaskStore> Planner<S> {
    /// A planner with the default grid, `OverlapPolicy::Allow` and
    /// Sunday-first weeks.
    pub fn new(store: S) -> Self {
        Self {
            store,
            grid: GridConfig::default(),
            overlap: OverlapPolicy::default(),
            week_start: Weekday::Sun,
        }
    }

    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_overlap_policy(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// Validate and save a new task, creating its block when auto-scheduled.
    ///
    /// # Errors
    /// `Validation` for bad input, `Overlap` when the policy rejects the new
    /// block, or any store error.
    pub fn create_task(&self, owner: &Principal, draft: TaskDraft) -> Result<TaskWithBlocks> {
        let task = draft.into_task(TaskId::new(), owner.clone())?;
        let blocks = self.derive_blocks(&task);

        self.store.save_task(task.clone(), blocks.clone(), self.overlap)?;
        info!(task = %task.id, owner = %owner, blocks = blocks.len(), "task created");

        Ok(TaskWithBlocks { task, blocks })
    }

    /// One task with its blocks.
    pub fn get_task(&self, owner: &Principal, id: TaskId) -> Result<TaskWithBlocks> {
        let task = self.owned_task(owner, id)?;
        let blocks = self.store.blocks_for_task(id)?;
        Ok(TaskWithBlocks { task, blocks })
    }

    /// All of the principal's tasks with their blocks, ordered by start time.
    pub fn list_tasks(&self, owner: &Principal) -> Result<Vec<TaskWithBlocks>> {
        self.store
            .list_tasks(owner)?
            .into_iter()
            .map(|task| {
                let blocks = self.store.blocks_for_task(task.id)?;
                Ok(TaskWithBlocks { task, blocks })
            })
            .collect()
    }

    /// Replace a task's fields wholesale.
    ///
    /// The task's old blocks are discarded and new ones derived from the
    /// edited start time and duration.
    pub fn update_task(
        &self,
        owner: &Principal,
        id: TaskId,
        draft: TaskDraft,
    ) -> Result<TaskWithBlocks> {
        self.owned_task(owner, id)?;
        let task = draft.into_task(id, owner.clone())?;
        let blocks = self.derive_blocks(&task);

        self.store.save_task(task.clone(), blocks.clone(), self.overlap)?;
        info!(task = %id, owner = %owner, blocks = blocks.len(), "task updated");

        Ok(TaskWithBlocks { task, blocks })
    }

    pub fn delete_task(&self, owner: &Principal, id: TaskId) -> Result<()> {
        self.owned_task(owner, id)?;
        self.store.delete_task(id)?;
        info!(task = %id, owner = %owner, "task deleted");
        Ok(())
    }

    /// Apply a drag-and-drop to one of the task's blocks.
    ///
    /// Returns `Ok(None)` when the task has no block on the source day;
    /// nothing is written in that case.
    ///
    /// # Errors
    /// `NotFound` when the task does not exist for this principal, `Overlap`
    /// when the policy rejects the new position, or any store error.
    pub fn reschedule(
        &self,
        owner: &Principal,
        drop: &DragDrop,
    ) -> Result<Option<TaskWithBlocks>> {
        self.owned_task(owner, drop.task_id)?;
        let blocks = self.store.blocks_for_task(drop.task_id)?;

        let Some(moved) = reschedule(&blocks, drop) else {
            warn!(
                task = %drop.task_id,
                source = %drop.source,
                "no block on source day; nothing to reschedule"
            );
            return Ok(None);
        };

        self.store.move_block(
            ScheduledBlock {
                id: moved.block_id,
                task_id: moved.task_id,
                start: moved.start,
                end: moved.end,
            },
            self.overlap,
        )?;
        debug!(
            block = %moved.block_id,
            start = %moved.start,
            end = %moved.end,
            "block rescheduled"
        );

        self.get_task(owner, drop.task_id).map(Some)
    }

    /// Week-view layout of the principal's blocks around `anchor`.
    pub fn week(&self, owner: &Principal, anchor: NaiveDate) -> Result<WeekGrid> {
        let blocks = self.store.blocks_for_owner(owner)?;
        Ok(layout_week(anchor, &blocks, &self.grid, self.week_start))
    }

    fn owned_task(&self, owner: &Principal, id: TaskId) -> Result<Task> {
        match self.store.get_task(id)? {
            Some(task) if &task.owner == owner => Ok(task),
            _ => Err(EngineError::not_found("task", id)),
        }
    }

    fn derive_blocks(&self, task: &Task) -> Vec<ScheduledBlock> {
        plan_blocks(task)
            .into_iter()
            .map(|span| ScheduledBlock::from_span(task.id, span))
            .collect()
    }
}
