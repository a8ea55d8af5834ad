//! Tasks, scheduled blocks, tags and their owners.
//!
//! JSON field names follow the calendar front-end (`startDate`, `duration`,
//! `isAutoScheduled`, `startTime`/`endTime`) so records can cross the
//! renderer boundary unchanged.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::BlockSpan;
use crate::error::{EngineError, Result};

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a [`Task`].
    TaskId
);
uuid_id!(
    /// Identifier of a [`ScheduledBlock`].
    BlockId
);
uuid_id!(TagId);

/// The account a task belongs to, as resolved by the caller's auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(pub String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A label shared between tasks. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A validated unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub owner: Principal,
    pub title: String,
    #[serde(rename = "startDate")]
    pub start: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDateTime>,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    #[serde(
        rename = "maxTimePerSitting",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_minutes_per_sitting: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(rename = "isAutoScheduled")]
    pub auto_scheduled: bool,
}

/// One concrete occupied interval of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledBlock {
    pub id: BlockId,
    pub task_id: TaskId,
    #[serde(rename = "startTime")]
    pub start: NaiveDateTime,
    #[serde(rename = "endTime")]
    pub end: NaiveDateTime,
}

impl ScheduledBlock {
    /// A fresh block for `task_id` covering `span`.
    pub fn from_span(task_id: TaskId, span: BlockSpan) -> Self {
        Self {
            id: BlockId::new(),
            task_id,
            start: span.start,
            end: span.end,
        }
    }

    pub fn span(&self) -> BlockSpan {
        BlockSpan::new(self.start, self.end)
    }
}

/// A task together with its blocks, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithBlocks {
    #[serde(flatten)]
    pub task: Task,
    #[serde(rename = "scheduledBlocks", default)]
    pub blocks: Vec<ScheduledBlock>,
}

/// Unvalidated task input from a form or request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(rename = "startDate")]
    pub start: NaiveDateTime,
    #[serde(default)]
    pub deadline: Option<NaiveDateTime>,
    #[serde(rename = "duration")]
    pub duration_minutes: i64,
    #[serde(rename = "maxTimePerSitting", default)]
    pub max_minutes_per_sitting: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "isAutoScheduled", default)]
    pub auto_scheduled: bool,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, start: NaiveDateTime, duration_minutes: i64) -> Self {
        Self {
            title: title.into(),
            start,
            deadline: None,
            duration_minutes,
            max_minutes_per_sitting: None,
            description: None,
            tags: Vec::new(),
            auto_scheduled: false,
        }
    }

    /// Validate the draft and build a task with the given identity.
    ///
    /// # Errors
    /// Returns `EngineError::Validation` when the title is blank, the duration
    /// or max-per-sitting is not a positive minute count, or the deadline
    /// precedes the start.
    pub fn into_task(self, id: TaskId, owner: Principal) -> Result<Task> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(EngineError::Validation("Title is required".to_string()));
        }

        let duration_minutes = positive_minutes("duration", self.duration_minutes)?;
        let max_minutes_per_sitting = self
            .max_minutes_per_sitting
            .map(|m| positive_minutes("maxTimePerSitting", m))
            .transpose()?;

        if let Some(deadline) = self.deadline {
            if deadline < self.start {
                return Err(EngineError::Validation(format!(
                    "deadline {} is before start {}",
                    deadline, self.start
                )));
            }
        }

        let tags = self
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Task {
            id,
            owner,
            title: title.to_string(),
            start: self.start,
            deadline: self.deadline,
            duration_minutes,
            max_minutes_per_sitting,
            description,
            tags,
            auto_scheduled: self.auto_scheduled,
        })
    }
}

fn positive_minutes(field: &str, value: i64) -> Result<u32> {
    if value < 1 {
        return Err(EngineError::Validation(format!(
            "{} must be at least 1 minute, got {}",
            field, value
        )));
    }
    u32::try_from(value)
        .map_err(|_| EngineError::Validation(format!("{} is too large: {}", field, value)))
}

/// Parse an ISO 8601 datetime into local wall-clock time.
///
/// RFC 3339 strings carrying an offset are converted to the machine's local
/// time; naive strings (`2024-01-15T11:00:00` or `2024-01-15T11:00`) are
/// taken as already local.
pub fn parse_local_datetime(s: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|e| EngineError::InvalidDatetime {
            input: s.to_string(),
            reason: e.to_string(),
        })
}
