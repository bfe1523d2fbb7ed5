//! Building task and note records from frontmatter.

use std::collections::BTreeSet;

use serde_yaml::Value;

use super::mapping::FieldMapping;
use super::recurrence::Recurrence;
use super::types::{NoteRecord, TaskRecord, TimeEntry};
use crate::frontmatter::{self, Frontmatter};
use crate::vault::FileMeta;

const DEFAULT_STATUS: &str = "open";
const DEFAULT_PRIORITY: &str = "normal";

/// Parse `content` and build a task record.
///
/// Returns `None` when the file has no frontmatter block or the block does
/// not parse. Whether the file is a task at all (tag membership) is decided
/// by the caller.
pub fn build_task_record(
    content: &str,
    path: &str,
    mapping: &FieldMapping,
) -> Option<TaskRecord> {
    let (yaml, _) = frontmatter::split(content)?;
    match frontmatter::parse_yaml(yaml) {
        Ok(fm) => Some(task_from_frontmatter(&fm, path, mapping)),
        Err(e) => {
            tracing::warn!("Failed to parse frontmatter of {}: {}", path, e);
            None
        }
    }
}

/// Parse `content` and build a note record. Notes do not need frontmatter.
pub fn build_note_record(
    content: &str,
    path: &str,
    meta: Option<&FileMeta>,
    mapping: &FieldMapping,
) -> Option<NoteRecord> {
    let fm = match frontmatter::split(content) {
        Some((yaml, _)) => match frontmatter::parse_yaml(yaml) {
            Ok(fm) => Some(fm),
            Err(e) => {
                tracing::warn!("Failed to parse frontmatter of {}: {}", path, e);
                return None;
            }
        },
        None => None,
    };
    Some(note_from_frontmatter(fm.as_ref(), path, meta, mapping))
}

pub fn task_from_frontmatter(
    fm: &Frontmatter,
    path: &str,
    mapping: &FieldMapping,
) -> TaskRecord {
    let tags = ordered_set(fm.tags());
    let archived = tags.iter().any(|t| *t == mapping.archive_tag);

    TaskRecord {
        path: path.to_string(),
        title: fm.get_str(&mapping.title).unwrap_or_else(|| file_stem(path)),
        status: fm.get_str(&mapping.status).unwrap_or_else(|| DEFAULT_STATUS.into()),
        priority: fm.get_str(&mapping.priority).unwrap_or_else(|| DEFAULT_PRIORITY.into()),
        due: fm.get_str(&mapping.due),
        scheduled: fm.get_str(&mapping.scheduled),
        archived,
        tags,
        contexts: ordered_set(fm.get_string_list(&mapping.contexts)),
        recurrence: fm.get(&mapping.recurrence).and_then(Recurrence::from_value),
        complete_instances: fm
            .get_string_list(&mapping.complete_instances)
            .into_iter()
            .collect::<BTreeSet<_>>(),
        completed_date: fm.get_str(&mapping.completed_date),
        time_estimate: fm
            .get(&mapping.time_estimate)
            .and_then(Value::as_u64)
            .and_then(|m| u32::try_from(m).ok()),
        time_entries: fm.get(&mapping.time_entries).map(time_entries).unwrap_or_default(),
        date_created: fm.get_str(&mapping.date_created),
        date_modified: fm.get_str(&mapping.date_modified),
    }
}

pub fn note_from_frontmatter(
    fm: Option<&Frontmatter>,
    path: &str,
    meta: Option<&FileMeta>,
    mapping: &FieldMapping,
) -> NoteRecord {
    NoteRecord {
        path: path.to_string(),
        title: fm
            .and_then(|fm| fm.get_str(&mapping.title))
            .unwrap_or_else(|| file_stem(path)),
        tags: fm.map(|fm| ordered_set(fm.tags())).unwrap_or_default(),
        created_date: fm
            .and_then(|fm| fm.get_str(&mapping.date_created))
            .or_else(|| meta.map(|m| m.ctime.to_rfc3339())),
        last_modified: meta.map(|m| m.mtime),
    }
}

fn time_entries(value: &Value) -> Vec<TimeEntry> {
    let Some(items) = value.as_sequence() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| serde_yaml::from_value::<TimeEntry>(item.clone()).ok())
        .collect()
}

/// Deduplicate while keeping first-seen order.
fn ordered_set(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

fn file_stem(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.strip_suffix(".md").unwrap_or(name).to_string()
}
