//! Task persistence collaborators.
//!
//! [`TaskStore`] is the seam between the planner and whatever holds task
//! records. Two implementations ship with the engine:
//!
//! - [`MemoryStore`] — process-local maps behind an `RwLock`
//! - [`JsonFileStore`] — a single JSON document on disk, rewritten atomically
//!   (write to `<file>.tmp`, then rename) after every mutation
//!
//! A store is constructed once per process and handed to the planner.
//! [`TaskStore::save_task`] and [`TaskStore::move_block`] apply the overlap
//! policy and every record change under one lock, so a rejected or failed
//! save leaves nothing half-written.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::model::{BlockId, Principal, ScheduledBlock, Tag, TagId, Task, TaskId};
use crate::overlap::OverlapPolicy;

/// Create/read/update/delete access to tasks, blocks and tags.
pub trait TaskStore: Send + Sync {
    fn insert_task(&self, task: Task) -> Result<()>;

    fn get_task(&self, id: TaskId) -> Result<Option<Task>>;

    /// Tasks owned by `owner`, ordered by start time.
    fn list_tasks(&self, owner: &Principal) -> Result<Vec<Task>>;

    /// Overwrite an existing task. `NotFound` if it does not exist.
    fn replace_task(&self, task: Task) -> Result<()>;

    /// Remove a task and all of its blocks. `NotFound` if it does not exist.
    fn delete_task(&self, id: TaskId) -> Result<()>;

    /// Return the tag with this name, creating it on first use.
    fn upsert_tag(&self, name: &str) -> Result<Tag>;

    fn list_tags(&self) -> Result<Vec<Tag>>;

    /// Blocks of one task, ordered by start time.
    fn blocks_for_task(&self, task_id: TaskId) -> Result<Vec<ScheduledBlock>>;

    /// Blocks of every task owned by `owner`, ordered by start time.
    fn blocks_for_owner(&self, owner: &Principal) -> Result<Vec<ScheduledBlock>>;

    /// Discard a task's blocks and store `blocks` in their place.
    fn replace_blocks(&self, task_id: TaskId, blocks: Vec<ScheduledBlock>) -> Result<()>;

    /// Overwrite one block's times. `NotFound` if it does not exist.
    fn update_block(&self, block: ScheduledBlock) -> Result<()>;

    /// Insert or replace a task together with its tags and blocks.
    ///
    /// The task's previous blocks are discarded. `policy` is checked against
    /// the owner's blocks of other tasks before anything changes.
    fn save_task(
        &self,
        task: Task,
        blocks: Vec<ScheduledBlock>,
        policy: OverlapPolicy,
    ) -> Result<()>;

    /// Overwrite one block's times after checking `policy` against the
    /// owner's other blocks.
    fn move_block(&self, block: ScheduledBlock, policy: OverlapPolicy) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Shared record set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct Records {
    tasks: BTreeMap<TaskId, Task>,
    blocks: BTreeMap<BlockId, ScheduledBlock>,
    tags: BTreeMap<String, Tag>,
}

/// On-disk layout of [`JsonFileStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    blocks: Vec<ScheduledBlock>,
    #[serde(default)]
    tags: Vec<Tag>,
}

impl From<Document> for Records {
    fn from(doc: Document) -> Self {
        Records {
            tasks: doc.tasks.into_iter().map(|t| (t.id, t)).collect(),
            blocks: doc.blocks.into_iter().map(|b| (b.id, b)).collect(),
            tags: doc.tags.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }
}

impl From<&Records> for Document {
    fn from(records: &Records) -> Self {
        Document {
            tasks: records.tasks.values().cloned().collect(),
            blocks: records.blocks.values().cloned().collect(),
            tags: records.tags.values().cloned().collect(),
        }
    }
}

impl Records {
    fn insert_task(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.id) {
            return Err(EngineError::Store(format!("task {} already exists", task.id)));
        }
        self.tasks.insert(task.id, task);
        Ok(())
    }

    fn list_tasks(&self, owner: &Principal) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| &t.owner == owner)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.start, t.id));
        tasks
    }

    fn replace_task(&mut self, task: Task) -> Result<()> {
        match self.tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task;
                Ok(())
            }
            None => Err(EngineError::not_found("task", task.id)),
        }
    }

    fn delete_task(&mut self, id: TaskId) -> Result<()> {
        if self.tasks.remove(&id).is_none() {
            return Err(EngineError::not_found("task", id));
        }
        self.blocks.retain(|_, b| b.task_id != id);
        Ok(())
    }

    fn upsert_tag(&mut self, name: &str) -> Tag {
        self.tags
            .entry(name.to_string())
            .or_insert_with(|| Tag {
                id: TagId::new(),
                name: name.to_string(),
            })
            .clone()
    }

    fn blocks_where(&self, pred: impl Fn(&ScheduledBlock) -> bool) -> Vec<ScheduledBlock> {
        let mut blocks: Vec<ScheduledBlock> =
            self.blocks.values().filter(|&b| pred(b)).cloned().collect();
        blocks.sort_by_key(|b| (b.start, b.end, b.id));
        blocks
    }

    fn blocks_for_owner(&self, owner: &Principal) -> Vec<ScheduledBlock> {
        self.blocks_where(|b| {
            self.tasks
                .get(&b.task_id)
                .is_some_and(|t| &t.owner == owner)
        })
    }

    fn replace_blocks(&mut self, task_id: TaskId, blocks: Vec<ScheduledBlock>) -> Result<()> {
        if !self.tasks.contains_key(&task_id) {
            return Err(EngineError::not_found("task", task_id));
        }
        self.blocks.retain(|_, b| b.task_id != task_id);
        for block in blocks {
            self.blocks.insert(block.id, ScheduledBlock { task_id, ..block });
        }
        Ok(())
    }

    fn update_block(&mut self, block: ScheduledBlock) -> Result<()> {
        match self.blocks.get_mut(&block.id) {
            Some(slot) => {
                *slot = block;
                Ok(())
            }
            None => Err(EngineError::not_found("block", block.id)),
        }
    }

    fn save_task(
        &mut self,
        task: Task,
        blocks: Vec<ScheduledBlock>,
        policy: OverlapPolicy,
    ) -> Result<()> {
        let id = task.id;
        let others = self.blocks_where(|b| {
            b.task_id != id
                && self
                    .tasks
                    .get(&b.task_id)
                    .is_some_and(|t| t.owner == task.owner)
        });
        for block in &blocks {
            policy.check(&block.span(), None, &others)?;
        }

        for name in &task.tags {
            self.upsert_tag(name);
        }
        self.tasks.insert(id, task);
        self.blocks.retain(|_, b| b.task_id != id);
        for block in blocks {
            self.blocks.insert(block.id, ScheduledBlock { task_id: id, ..block });
        }
        Ok(())
    }

    fn move_block(&mut self, block: ScheduledBlock, policy: OverlapPolicy) -> Result<()> {
        if !self.blocks.contains_key(&block.id) {
            return Err(EngineError::not_found("block", block.id));
        }
        let owner = match self.tasks.get(&block.task_id) {
            Some(task) => task.owner.clone(),
            None => return Err(EngineError::not_found("task", block.task_id)),
        };
        let others = self.blocks_for_owner(&owner);
        policy.check(&block.span(), Some(block.id), &others)?;
        self.update_block(block)
    }
}

fn poisoned() -> EngineError {
    EngineError::Store("store lock poisoned".to_string())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Records) -> T) -> Result<T> {
        let guard = self.records.read().map_err(|_| poisoned())?;
        Ok(f(&guard))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Records) -> Result<T>) -> Result<T> {
        let mut guard = self.records.write().map_err(|_| poisoned())?;
        f(&mut guard)
    }
}

impl TaskStore for MemoryStore {
    fn insert_task(&self, task: Task) -> Result<()> {
        self.write(|r| r.insert_task(task))
    }

    fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        self.read(|r| r.tasks.get(&id).cloned())
    }

    fn list_tasks(&self, owner: &Principal) -> Result<Vec<Task>> {
        self.read(|r| r.list_tasks(owner))
    }

    fn replace_task(&self, task: Task) -> Result<()> {
        self.write(|r| r.replace_task(task))
    }

    fn delete_task(&self, id: TaskId) -> Result<()> {
        self.write(|r| r.delete_task(id))
    }

    fn upsert_tag(&self, name: &str) -> Result<Tag> {
        self.write(|r| Ok(r.upsert_tag(name)))
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        self.read(|r| r.tags.values().cloned().collect())
    }

    fn blocks_for_task(&self, task_id: TaskId) -> Result<Vec<ScheduledBlock>> {
        self.read(|r| r.blocks_where(|b| b.task_id == task_id))
    }

    fn blocks_for_owner(&self, owner: &Principal) -> Result<Vec<ScheduledBlock>> {
        self.read(|r| r.blocks_for_owner(owner))
    }

    fn replace_blocks(&self, task_id: TaskId, blocks: Vec<ScheduledBlock>) -> Result<()> {
        self.write(|r| r.replace_blocks(task_id, blocks))
    }

    fn update_block(&self, block: ScheduledBlock) -> Result<()> {
        self.write(|r| r.update_block(block))
    }

    fn save_task(
        &self,
        task: Task,
        blocks: Vec<ScheduledBlock>,
        policy: OverlapPolicy,
    ) -> Result<()> {
        self.write(|r| r.save_task(task, blocks, policy))
    }

    fn move_block(&self, block: ScheduledBlock, policy: OverlapPolicy) -> Result<()> {
        self.write(|r| r.move_block(block, policy))
    }
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Store backed by one JSON file.
///
/// The whole document is loaded on open and rewritten after each mutation.
/// A mutation is applied to a copy first, so a failed write leaves both the
/// file and the in-memory view unchanged.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<Records>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    /// Returns `EngineError::Io` if the file cannot be read and
    /// `EngineError::Json` if it is not a valid store document.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Records::default()
            } else {
                let doc: Document = serde_json::from_str(&content)?;
                Records::from(doc)
            }
        } else {
            Records::default()
        };
        debug!(path = %path.display(), tasks = records.tasks.len(), "opened task file");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&Records) -> T) -> Result<T> {
        let guard = self.records.lock().map_err(|_| poisoned())?;
        Ok(f(&guard))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Records) -> Result<T>) -> Result<T> {
        let mut guard = self.records.lock().map_err(|_| poisoned())?;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        write_atomic(&self.path, &Document::from(&next))?;
        *guard = next;
        Ok(out)
    }
}

fn write_atomic(path: &Path, doc: &Document) -> Result<()> {
    let json = serde_json::to_string_pretty(doc)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path(path);
    let mut file = File::create(&temp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// `<file>.tmp` next to the store file.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

impl TaskStore for JsonFileStore {
    fn insert_task(&self, task: Task) -> Result<()> {
        self.write(|r| r.insert_task(task))
    }

    fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        self.read(|r| r.tasks.get(&id).cloned())
    }

    fn list_tasks(&self, owner: &Principal) -> Result<Vec<Task>> {
        self.read(|r| r.list_tasks(owner))
    }

    fn replace_task(&self, task: Task) -> Result<()> {
        self.write(|r| r.replace_task(task))
    }

    fn delete_task(&self, id: TaskId) -> Result<()> {
        self.write(|r| r.delete_task(id))
    }

    fn upsert_tag(&self, name: &str) -> Result<Tag> {
        if let Some(tag) = self.read(|r| r.tags.get(name).cloned())? {
            return Ok(tag);
        }
        self.write(|r| Ok(r.upsert_tag(name)))
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        self.read(|r| r.tags.values().cloned().collect())
    }

    fn blocks_for_task(&self, task_id: TaskId) -> Result<Vec<ScheduledBlock>> {
        self.read(|r| r.blocks_where(|b| b.task_id == task_id))
    }

    fn blocks_for_owner(&self, owner: &Principal) -> Result<Vec<ScheduledBlock>> {
        self.read(|r| r.blocks_for_owner(owner))
    }

    fn replace_blocks(&self, task_id: TaskId, blocks: Vec<ScheduledBlock>) -> Result<()> {
        self.write(|r| r.replace_blocks(task_id, blocks))
    }

    fn update_block(&self, block: ScheduledBlock) -> Result<()> {
        self.write(|r| r.update_block(block))
    }

    fn save_task(
        &self,
        task: Task,
        blocks: Vec<ScheduledBlock>,
        policy: OverlapPolicy,
    ) -> Result<()> {
        self.write(|r| r.save_task(task, blocks, policy))
    }

    fn move_block(&self, block: ScheduledBlock, policy: OverlapPolicy) -> Result<()> {
        self.write(|r| r.move_block(block, policy))
    }
}
