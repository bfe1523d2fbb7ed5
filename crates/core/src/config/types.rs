use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::records::FieldMapping;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub version: u32,
    pub profile: Option<String>,
    pub profiles: HashMap<String, Profile>,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub vault_root: String,
    /// Tag that marks a note as a task (exact, case-sensitive match).
    #[serde(default = "default_task_tag")]
    pub task_tag: String,
    /// Folder prefixes (relative to vault_root) that are never indexed.
    #[serde(default)]
    pub excluded_folders: Vec<String>,
    /// Folder holding `YYYY-MM-DD.md` daily notes. Empty means vault root.
    #[serde(default)]
    pub daily_notes_folder: String,
    /// Vault-relative path of the daily note template, excluded from indexing.
    #[serde(default)]
    pub daily_note_template: Option<String>,
    #[serde(default)]
    pub field_mapping: FieldMapping,
    #[serde(default = "default_statuses")]
    pub statuses: Vec<StatusConfig>,
    #[serde(default = "default_priorities")]
    pub priorities: Vec<PriorityConfig>,
}

/// A user-defined task status.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StatusConfig {
    /// Value written to frontmatter.
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Whether this status counts as done.
    #[serde(default)]
    pub is_completed: bool,
}

/// A user-defined task priority.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PriorityConfig {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Sort weight, higher is more important.
    #[serde(default)]
    pub weight: u32,
}

/// Tunables for the cache layer.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
    pub content_ttl_secs: u64,
    pub document_ttl_secs: u64,
    pub max_content_entries: usize,
    pub debounce_ms: u64,
    pub task_batch_size: usize,
    pub note_batch_size: usize,
    pub init_batch_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            content_ttl_secs: 120,
            document_ttl_secs: 300,
            max_content_entries: 500,
            debounce_ms: 300,
            task_batch_size: 20,
            note_batch_size: 50,
            init_batch_size: 50,
        }
    }
}

impl CacheSettings {
    pub fn content_ttl(&self) -> Duration {
        Duration::from_secs(self.content_ttl_secs)
    }

    pub fn document_ttl(&self) -> Duration {
        Duration::from_secs(self.document_ttl_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_task_tag() -> String {
    "task".to_string()
}

pub fn default_statuses() -> Vec<StatusConfig> {
    [
        ("none", "None", false),
        ("open", "Open", false),
        ("in-progress", "In progress", false),
        ("done", "Done", true),
    ]
    .into_iter()
    .map(|(value, label, is_completed)| StatusConfig {
        value: value.to_string(),
        label: Some(label.to_string()),
        is_completed,
    })
    .collect()
}

pub fn default_priorities() -> Vec<PriorityConfig> {
    [("none", "None", 0), ("low", "Low", 1), ("normal", "Normal", 2), ("high", "High", 3)]
        .into_iter()
        .map(|(value, label, weight)| PriorityConfig {
            value: value.to_string(),
            label: Some(label.to_string()),
            weight,
        })
        .collect()
}

/// Everything the cache layer needs to classify and index files.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub task_tag: String,
    pub excluded_folders: Vec<String>,
    pub daily_notes_folder: String,
    pub daily_note_template: Option<String>,
    pub field_mapping: FieldMapping,
    pub statuses: Vec<StatusConfig>,
    pub priorities: Vec<PriorityConfig>,
    pub settings: CacheSettings,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            task_tag: default_task_tag(),
            excluded_folders: Vec::new(),
            daily_notes_folder: String::new(),
            daily_note_template: None,
            field_mapping: FieldMapping::default(),
            statuses: default_statuses(),
            priorities: default_priorities(),
            settings: CacheSettings::default(),
        }
    }
}

impl CacheConfig {
    /// Build a config from a profile, normalising folder strings.
    pub fn from_profile(profile: &Profile, settings: CacheSettings) -> Self {
        Self {
            task_tag: profile.task_tag.clone(),
            excluded_folders: profile.excluded_folders.clone(),
            daily_notes_folder: profile.daily_notes_folder.clone(),
            daily_note_template: profile.daily_note_template.clone(),
            field_mapping: profile.field_mapping.clone(),
            statuses: profile.statuses.clone(),
            priorities: profile.priorities.clone(),
            settings,
        }
        .normalized()
    }

    /// Trim excluded folders (dropping empty ones) and strip slashes around
    /// the daily notes folder.
    pub fn normalized(mut self) -> Self {
        self.excluded_folders = self
            .excluded_folders
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        self.daily_notes_folder = self.daily_notes_folder.trim_matches('/').to_string();
        self.daily_note_template =
            self.daily_note_template.filter(|t| !t.trim().is_empty());
        self
    }

    /// Whether a vault path must be skipped by the indexer.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.daily_note_template.as_deref() == Some(path) {
            return true;
        }
        self.excluded_folders.iter().any(|folder| path.starts_with(folder.as_str()))
    }

    /// Whether a status value counts as done.
    pub fn is_completed_status(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s.is_completed && s.value == status)
    }

    /// Sort weight of a priority value; unknown priorities weigh zero.
    pub fn priority_weight(&self, priority: &str) -> u32 {
        self.priorities.iter().find(|p| p.value == priority).map_or(0, |p| p.weight)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub active_profile: String,
    pub vault_root: PathBuf,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_strips_daily_folder_slashes() {
        let cfg = CacheConfig {
            daily_notes_folder: "/Journal/Daily/".into(),
            excluded_folders: vec![" Templates ".into(), "".into(), "  ".into()],
            daily_note_template: Some("  ".into()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(cfg.daily_notes_folder, "Journal/Daily");
        assert_eq!(cfg.excluded_folders, vec!["Templates".to_string()]);
        assert!(cfg.daily_note_template.is_none());
    }

    #[test]
    fn excluded_matches_folder_prefix_and_template() {
        let cfg = CacheConfig {
            excluded_folders: vec!["Archive".into()],
            daily_note_template: Some("Templates/Daily.md".into()),
            ..Default::default()
        };

        assert!(cfg.is_excluded("Archive/old.md"));
        assert!(cfg.is_excluded("Templates/Daily.md"));
        assert!(!cfg.is_excluded("Templates/Weekly.md"));
        assert!(!cfg.is_excluded("Tasks/a.md"));
    }

    #[test]
    fn default_statuses_mark_done_completed() {
        let cfg = CacheConfig::default();
        assert!(cfg.is_completed_status("done"));
        assert!(!cfg.is_completed_status("open"));
        assert!(!cfg.is_completed_status("Done"));
    }

    #[test]
    fn priority_weight_defaults_to_zero() {
        let cfg = CacheConfig::default();
        assert_eq!(cfg.priority_weight("high"), 3);
        assert_eq!(cfg.priority_weight("urgent"), 0);
    }
}
