//! Notes command implementation.

use std::sync::Arc;

use chrono::Local;
use color_eyre::eyre::Result;
use tabled::{Table, Tabled, settings::Style};
use tasknotes_core::NoteRecord;
use tasknotes_core::config::ResolvedConfig;

use super::{open_cache, print_json};
use crate::NotesArgs;

#[derive(Tabled)]
struct NoteRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Path")]
    path: String,
}

pub async fn run(rc: &ResolvedConfig, args: NotesArgs) -> Result<()> {
    let (_vault, cache) = open_cache(rc).await?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());

    let notes = cache.get_notes_for_date(date, false).await;

    if args.json {
        let records: Vec<&NoteRecord> = notes.iter().map(Arc::as_ref).collect();
        return print_json(&records);
    }

    if notes.is_empty() {
        println!("(no notes created on {})", date.format("%Y-%m-%d"));
        return Ok(());
    }
    let rows: Vec<NoteRow> = notes
        .iter()
        .map(|n| NoteRow { title: n.title.clone(), tags: n.tags.join(", "), path: n.path.clone() })
        .collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!("-- {} notes --", notes.len());
    Ok(())
}
