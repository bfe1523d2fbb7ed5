//! Record types built from vault files.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::recurrence::Recurrence;
use crate::cache::indexes::date_key;

/// One tracked work session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub start_time: String,
    /// `None` while the session is still running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A task-bearing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub path: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub due: Option<String>,
    pub scheduled: Option<String>,
    pub archived: bool,
    pub tags: Vec<String>,
    pub contexts: Vec<String>,
    pub recurrence: Option<Recurrence>,
    /// Dates (`YYYY-MM-DD`) on which an occurrence of a recurring task was
    /// completed. Independent of `status`.
    pub complete_instances: BTreeSet<String>,
    pub completed_date: Option<String>,
    /// Estimated effort in minutes.
    pub time_estimate: Option<u32>,
    pub time_entries: Vec<TimeEntry>,
    pub date_created: Option<String>,
    pub date_modified: Option<String>,
}

impl TaskRecord {
    /// Canonical `YYYY-MM-DD` key of the due date, if it parses.
    pub fn due_key(&self) -> Option<String> {
        self.due.as_deref().and_then(date_key)
    }

    /// Whether the task (or one of its occurrences) falls on `date`.
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        let key = date.format("%Y-%m-%d").to_string();
        match &self.recurrence {
            Some(rule) => {
                let anchor = self
                    .scheduled
                    .as_deref()
                    .or(self.due.as_deref())
                    .and_then(date_key)
                    .and_then(|k| NaiveDate::parse_from_str(&k, "%Y-%m-%d").ok());
                rule.is_due_on(date, anchor)
            }
            None => self.due_key().as_deref() == Some(key.as_str()),
        }
    }

    /// Whether the occurrence on `date` has been completed.
    pub fn is_instance_completed(&self, date: NaiveDate) -> bool {
        self.complete_instances.contains(&date.format("%Y-%m-%d").to_string())
    }
}

/// A non-task file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub path: String,
    pub title: String,
    pub tags: Vec<String>,
    pub created_date: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Cached record attached to an indexed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Task(Arc<TaskRecord>),
    Note(Arc<NoteRecord>),
}

/// Per-path metadata kept for every indexed file, task or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFileEntry {
    pub path: String,
    pub mtime: DateTime<Utc>,
    pub ctime: DateTime<Utc>,
    pub tags: Vec<String>,
    /// Re-decided on every index pass.
    pub is_task: bool,
    pub record: Option<Record>,
}
