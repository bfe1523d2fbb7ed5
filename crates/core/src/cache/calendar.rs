//! Month view aggregation over the secondary indexes.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::indexes::SecondaryIndexes;
use crate::config::CacheConfig;
use crate::records::TaskRecord;

/// Task summary for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTasks {
    pub count: usize,
    pub has_due: bool,
    pub has_completed: bool,
    pub has_archived: bool,
}

/// Per-day counts for one month, keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarData {
    pub year: i32,
    /// 1-based.
    pub month: u32,
    pub notes: BTreeMap<String, usize>,
    pub tasks: BTreeMap<String, DayTasks>,
    /// Dates in the month that have a daily note.
    pub daily_notes: BTreeSet<String>,
}

pub(crate) fn aggregate(
    year: i32,
    month: u32,
    indexes: &SecondaryIndexes,
    tasks: &HashMap<String, Arc<TaskRecord>>,
    config: &CacheConfig,
) -> CalendarData {
    let mut data = CalendarData { year, month, ..Default::default() };
    if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
        tracing::debug!("Calendar requested for invalid month {}-{}", year, month);
        return data;
    }
    let in_month = |key: &str| {
        NaiveDate::parse_from_str(key, "%Y-%m-%d")
            .is_ok_and(|d| d.year() == year && d.month() == month)
    };

    for (key, paths) in indexes.notes_by_date.buckets() {
        if in_month(key) {
            data.notes.insert(key.to_string(), paths.len());
        }
    }

    for (key, paths) in indexes.tasks_by_date.buckets() {
        if !in_month(key) {
            continue;
        }
        let records: Vec<&Arc<TaskRecord>> = paths.iter().filter_map(|p| tasks.get(p)).collect();
        if records.is_empty() {
            continue;
        }
        data.tasks.insert(
            key.to_string(),
            DayTasks {
                count: records.len(),
                has_due: true,
                has_completed: records.iter().any(|t| config.is_completed_status(&t.status)),
                has_archived: records.iter().any(|t| t.archived),
            },
        );
    }

    data.daily_notes = indexes
        .daily_notes
        .buckets()
        .map(|(key, _)| key)
        .filter(|key| in_month(key))
        .map(str::to_string)
        .collect();

    data
}
