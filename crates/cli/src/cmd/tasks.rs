//! Tasks command implementation.

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use color_eyre::eyre::Result;
use tabled::{Table, Tabled, settings::Style};
use tasknotes_core::TaskRecord;
use tasknotes_core::config::{CacheConfig, ResolvedConfig};

use super::{open_cache, print_json};
use crate::TasksArgs;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Path")]
    path: String,
}

impl TaskRow {
    /// With a `day`, the status of a recurring task notes whether that
    /// occurrence is already done.
    fn new(task: &TaskRecord, day: Option<NaiveDate>) -> Self {
        let status = match day {
            Some(day) if task.recurrence.is_some() && task.is_instance_completed(day) => {
                format!("{} (done {day})", task.status)
            }
            _ => task.status.clone(),
        };
        Self {
            title: task.title.clone(),
            status,
            priority: task.priority.clone(),
            due: task.due.clone().unwrap_or_else(|| "-".into()),
            path: task.path.clone(),
        }
    }
}

pub async fn run(rc: &ResolvedConfig, args: TasksArgs) -> Result<()> {
    let (_vault, cache) = open_cache(rc).await?;

    let tasks = match (args.due, args.on) {
        (Some(date), _) => cache.get_tasks_due_on_date(date).await,
        (None, Some(day)) => {
            let mut tasks = cache.get_tasks_for_date(day, false).await;
            tasks.retain(|t| t.is_due_on(day));
            tasks
        }
        (None, None) => cache.get_tasks_for_date(Local::now().date_naive(), false).await,
    };
    let mut tasks: Vec<Arc<TaskRecord>> = tasks
        .into_iter()
        .filter(|t| args.status.as_ref().is_none_or(|s| &t.status == s))
        .filter(|t| args.priority.as_ref().is_none_or(|p| &t.priority == p))
        .collect();
    sort_tasks(&mut tasks, &rc.cache);

    if args.json {
        let records: Vec<&TaskRecord> = tasks.iter().map(Arc::as_ref).collect();
        return print_json(&records);
    }

    if tasks.is_empty() {
        println!("(no tasks found)");
        return Ok(());
    }
    let rows: Vec<TaskRow> = tasks.iter().map(|t| TaskRow::new(t, args.on)).collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!("-- {} tasks --", tasks.len());
    Ok(())
}

/// Highest priority first, then by title.
fn sort_tasks(tasks: &mut [Arc<TaskRecord>], config: &CacheConfig) {
    tasks.sort_by(|a, b| {
        Reverse(config.priority_weight(&a.priority))
            .cmp(&Reverse(config.priority_weight(&b.priority)))
            .then_with(|| a.title.cmp(&b.title))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tasknotes_core::records::{Frequency, Recurrence};

    fn task(title: &str, priority: &str) -> Arc<TaskRecord> {
        Arc::new(TaskRecord {
            path: format!("Tasks/{title}.md"),
            title: title.into(),
            status: "open".into(),
            priority: priority.into(),
            due: None,
            scheduled: None,
            archived: false,
            tags: vec!["task".into()],
            contexts: Vec::new(),
            recurrence: None,
            complete_instances: BTreeSet::new(),
            completed_date: None,
            time_estimate: None,
            time_entries: Vec::new(),
            date_created: None,
            date_modified: None,
        })
    }

    #[test]
    fn sorts_by_weight_then_title() {
        let mut tasks = vec![
            task("b", "low"),
            task("c", "high"),
            task("a", "low"),
            task("d", "unknown"),
            task("e", "high"),
        ];
        sort_tasks(&mut tasks, &CacheConfig::default());

        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "e", "a", "b", "d"]);
    }

    #[test]
    fn row_marks_completed_occurrence() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let mut standup = (*task("standup", "normal")).clone();
        standup.recurrence = Some(Recurrence {
            frequency: Frequency::Daily,
            days_of_week: Vec::new(),
            day_of_month: None,
            month_of_year: None,
        });
        standup.complete_instances.insert("2024-03-11".into());

        assert_eq!(TaskRow::new(&standup, Some(day)).status, "open (done 2024-03-11)");
        assert_eq!(TaskRow::new(&standup, day.succ_opt()).status, "open");
        assert_eq!(TaskRow::new(&standup, None).status, "open");
    }
}
