//! Secondary indexes over cached records.
//!
//! Every index maps a discriminator value to the set of paths currently
//! holding it. A path lives in at most one bucket per index: updates purge
//! the old membership before inserting the new one, and buckets that become
//! empty are dropped.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::records::{NoteRecord, TaskRecord};

static DAILY_NOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})\.md$").unwrap());

/// Canonical `YYYY-MM-DD` key for a date or date-time string.
///
/// Accepts `2024-03-10`, `2024-03-10T09:00` and `2024-03-10 09:00`.
/// Returns `None` when the date part is not a real calendar date.
pub fn date_key(raw: &str) -> Option<String> {
    let date = raw.trim().split(['T', ' ']).next()?;
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(parsed.format("%Y-%m-%d").to_string())
}

/// Date of a daily note, if `path` is one.
///
/// The file name must be exactly `YYYY-MM-DD.md` and the file must sit under
/// `folder`, or at the vault root when `folder` is empty.
pub fn daily_note_date(path: &str, folder: &str) -> Option<String> {
    let (parent, name) = match path.rsplit_once('/') {
        Some((parent, name)) => (Some(parent), name),
        None => (None, path),
    };
    let in_folder = if folder.is_empty() {
        parent.is_none()
    } else {
        parent.is_some() && path.starts_with(&format!("{folder}/"))
    };
    if !in_folder {
        return None;
    }
    DAILY_NOTE_RE.captures(name).map(|c| c[1].to_string())
}

/// One discriminator index: value -> paths.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BucketIndex {
    buckets: HashMap<String, BTreeSet<String>>,
    keys: HashMap<String, String>,
}

impl BucketIndex {
    /// Move `path` into the bucket for `key`, or out of the index entirely
    /// when `key` is `None`.
    pub fn set(&mut self, path: &str, key: Option<String>) {
        self.remove(path);
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            return;
        };
        self.buckets.entry(key.clone()).or_default().insert(path.to_string());
        self.keys.insert(path.to_string(), key);
    }

    /// Drop `path` from whatever bucket holds it. Returns whether it was
    /// present.
    pub fn remove(&mut self, path: &str) -> bool {
        let Some(key) = self.keys.remove(path) else {
            return false;
        };
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.remove(path);
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
        true
    }

    /// Copy of the paths under `key`, sorted.
    pub fn get(&self, key: &str) -> Vec<String> {
        self.buckets.get(key).map(|b| b.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn key_of(&self, path: &str) -> Option<&str> {
        self.keys.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.keys.contains_key(path)
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of non-empty buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.keys.clear();
    }
}

/// All secondary indexes kept by the cache.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SecondaryIndexes {
    pub tasks_by_date: BucketIndex,
    pub tasks_by_status: BucketIndex,
    pub tasks_by_priority: BucketIndex,
    pub notes_by_date: BucketIndex,
    /// Keyed by the date in the file name, independent of content.
    pub daily_notes: BucketIndex,
}

impl SecondaryIndexes {
    pub fn update_task_indexes(&mut self, path: &str, task: &TaskRecord) {
        self.remove_from_indexes(path);
        self.tasks_by_date.set(path, task.due_key());
        self.tasks_by_status.set(path, Some(task.status.clone()));
        self.tasks_by_priority.set(path, Some(task.priority.clone()));
    }

    pub fn update_note_indexes(&mut self, path: &str, note: &NoteRecord) {
        self.remove_from_indexes(path);
        self.notes_by_date.set(path, note.created_date.as_deref().and_then(date_key));
    }

    /// Purge `path` from every record-derived index.
    pub fn remove_from_indexes(&mut self, path: &str) {
        self.tasks_by_date.remove(path);
        self.tasks_by_status.remove(path);
        self.tasks_by_priority.remove(path);
        self.notes_by_date.remove(path);
    }

    pub fn update_daily_note(&mut self, path: &str, folder: &str) {
        self.daily_notes.set(path, daily_note_date(path, folder));
    }

    /// Purge `path` from every index, daily notes included.
    pub fn forget(&mut self, path: &str) {
        self.remove_from_indexes(path);
        self.daily_notes.remove(path);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.tasks_by_date.contains(path)
            || self.tasks_by_status.contains(path)
            || self.tasks_by_priority.contains(path)
            || self.notes_by_date.contains(path)
            || self.daily_notes.contains(path)
    }

    pub fn clear(&mut self) {
        self.tasks_by_date.clear();
        self.tasks_by_status.clear();
        self.tasks_by_priority.clear();
        self.notes_by_date.clear();
        self.daily_notes.clear();
    }
}
