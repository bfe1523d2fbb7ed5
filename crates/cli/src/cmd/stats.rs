//! Stats command implementation.

use color_eyre::eyre::Result;
use tabled::{Table, Tabled, settings::Style};
use tasknotes_core::config::ResolvedConfig;

use super::{open_cache, print_json};
use crate::StatsArgs;

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn run(rc: &ResolvedConfig, args: StatsArgs) -> Result<()> {
    let (_vault, cache) = open_cache(rc).await?;
    let stats = cache.stats();

    if args.json {
        return print_json(&stats);
    }

    let rows = vec![
        StatRow { metric: "Tasks cached", value: stats.tasks_cached.to_string() },
        StatRow { metric: "Notes cached", value: stats.notes_cached.to_string() },
        StatRow { metric: "Files cached", value: stats.files_cached.to_string() },
        StatRow { metric: "File reads", value: stats.file_reads.to_string() },
        StatRow { metric: "YAML parses", value: stats.yaml_parses.to_string() },
        StatRow { metric: "Cache hits", value: stats.cache_hits.to_string() },
        StatRow { metric: "Cache misses", value: stats.cache_misses.to_string() },
        StatRow { metric: "Hit ratio", value: format!("{:.1}%", stats.hit_ratio * 100.0) },
    ];

    println!("Vault: {}", rc.vault_root.display());
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{}", table);
    Ok(())
}
