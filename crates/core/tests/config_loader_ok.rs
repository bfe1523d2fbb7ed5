use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tasknotes_core::config::loader::ConfigLoader;
use tempfile::tempdir;

fn write_file(path: &PathBuf, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn load_default_profile_ok() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.toml");
    let toml = r#"
version = 1
profile = "default"

[profiles.default]
vault_root = "/tmp/vault"
task_tag = "todo"
excluded_folders = [" Archive ", ""]
daily_notes_folder = "/Journal/"
daily_note_template = "Templates/Daily.md"

[profiles.default.field_mapping]
due = "deadline"

[[profiles.default.statuses]]
value = "todo"

[[profiles.default.statuses]]
value = "shipped"
is_completed = true

[logging]
level = "debug"
file = "{{vault_root}}/.tasknotes/tn.log"
"#;

    write_file(&cfg_path, toml);

    let rc = ConfigLoader::load(Some(&cfg_path), None).expect("should load");
    assert_eq!(rc.active_profile, "default");
    assert_eq!(rc.vault_root.display().to_string(), "/tmp/vault");

    let cache = &rc.cache;
    assert_eq!(cache.task_tag, "todo");
    assert_eq!(cache.excluded_folders, vec!["Archive".to_string()]);
    assert_eq!(cache.daily_notes_folder, "Journal");
    assert_eq!(cache.daily_note_template.as_deref(), Some("Templates/Daily.md"));
    assert_eq!(cache.field_mapping.due, "deadline");
    assert_eq!(cache.field_mapping.status, "status");
    assert!(cache.is_completed_status("shipped"));
    assert!(!cache.is_completed_status("done"));

    assert_eq!(rc.logging.level, "debug");
    assert_eq!(
        rc.logging.file.as_ref().map(|p| p.display().to_string()).as_deref(),
        Some("/tmp/vault/.tasknotes/tn.log")
    );
}

#[test]
fn cache_settings_default_and_override() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.toml");
    let toml = r#"
version = 1
[profiles.default]
vault_root = "/tmp/vault"

[cache]
debounce_ms = 50
task_batch_size = 5
"#;
    write_file(&cfg_path, toml);

    let rc = ConfigLoader::load(Some(&cfg_path), None).expect("should load");
    let settings = &rc.cache.settings;
    assert_eq!(settings.debounce(), Duration::from_millis(50));
    assert_eq!(settings.task_batch_size, 5);
    assert_eq!(settings.note_batch_size, 50);
    assert_eq!(settings.content_ttl(), Duration::from_secs(120));
    assert_eq!(settings.max_content_entries, 500);
}

#[test]
fn load_with_profile_override_ok() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("tasknotes/config.toml");
    let toml = r#"
version = 1
profile = "default"

[profiles.default]
vault_root = "/tmp/def"

[profiles.work]
vault_root = "/tmp/work"
daily_notes_folder = "Daily"
"#;
    write_file(&cfg_path, toml);

    let rc = ConfigLoader::load(Some(&cfg_path), Some("work")).expect("should load");
    assert_eq!(rc.active_profile, "work");
    assert_eq!(rc.vault_root.display().to_string(), "/tmp/work");
    assert_eq!(rc.cache.daily_notes_folder, "Daily");
}
