//! Calendar command implementation.

use std::collections::BTreeSet;

use chrono::{Datelike, Local};
use color_eyre::eyre::Result;
use tabled::{Table, Tabled, settings::Style};
use tasknotes_core::CalendarData;
use tasknotes_core::config::ResolvedConfig;

use super::{open_cache, print_json};
use crate::CalendarArgs;

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Tasks")]
    tasks: usize,
    #[tabled(rename = "Notes")]
    notes: usize,
    #[tabled(rename = "Flags")]
    flags: String,
}

pub async fn run(rc: &ResolvedConfig, args: CalendarArgs) -> Result<()> {
    let (_vault, cache) = open_cache(rc).await?;
    // Calendar data only reads what is cached; load task records first.
    cache.get_tasks_for_date(Local::now().date_naive(), false).await;

    let today = Local::now().date_naive();
    let data = cache.get_calendar_data(
        args.year.unwrap_or_else(|| today.year()),
        args.month.unwrap_or_else(|| today.month()),
    );

    if args.json {
        return print_json(&data);
    }

    let rows = day_rows(&data);
    println!("{}-{:02}", data.year, data.month);
    if rows.is_empty() {
        println!("(nothing scheduled)");
        return Ok(());
    }
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{}", table);
    Ok(())
}

fn day_rows(data: &CalendarData) -> Vec<DayRow> {
    let days: BTreeSet<&String> =
        data.tasks.keys().chain(data.notes.keys()).chain(data.daily_notes.iter()).collect();

    days.into_iter()
        .map(|day| {
            let tasks = data.tasks.get(day).copied().unwrap_or_default();
            let mut flags = Vec::new();
            if data.daily_notes.contains(day) {
                flags.push("daily");
            }
            if tasks.has_completed {
                flags.push("done");
            }
            if tasks.has_archived {
                flags.push("archived");
            }
            DayRow {
                date: day.clone(),
                tasks: tasks.count,
                notes: data.notes.get(day).copied().unwrap_or(0),
                flags: flags.join(" "),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasknotes_core::DayTasks;

    #[test]
    fn rows_merge_every_day_with_activity() {
        let mut data = CalendarData { year: 2024, month: 3, ..Default::default() };
        data.tasks.insert(
            "2024-03-10".into(),
            DayTasks { count: 2, has_due: true, has_completed: true, has_archived: false },
        );
        data.notes.insert("2024-03-02".into(), 1);
        data.daily_notes.insert("2024-03-10".into());

        let rows = day_rows(&data);
        let summary: Vec<(&str, usize, usize, &str)> = rows
            .iter()
            .map(|r| (r.date.as_str(), r.tasks, r.notes, r.flags.as_str()))
            .collect();
        assert_eq!(summary, vec![("2024-03-02", 0, 1, ""), ("2024-03-10", 2, 0, "daily done")]);
    }
}
