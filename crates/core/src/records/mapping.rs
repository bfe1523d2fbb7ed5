//! Logical field name to frontmatter key remapping.

use serde::{Deserialize, Serialize};

/// Frontmatter key used for each logical record field.
///
/// Every key can be overridden from the profile's `[field_mapping]` table;
/// keys left out keep their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub title: String,
    pub status: String,
    pub priority: String,
    pub due: String,
    pub scheduled: String,
    pub contexts: String,
    pub time_estimate: String,
    pub completed_date: String,
    pub date_created: String,
    pub date_modified: String,
    pub recurrence: String,
    /// Tag (inside the tag list) that marks a task as archived.
    pub archive_tag: String,
    pub time_entries: String,
    pub complete_instances: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            title: "title".into(),
            status: "status".into(),
            priority: "priority".into(),
            due: "due".into(),
            scheduled: "scheduled".into(),
            contexts: "contexts".into(),
            time_estimate: "timeEstimate".into(),
            completed_date: "completedDate".into(),
            date_created: "dateCreated".into(),
            date_modified: "dateModified".into(),
            recurrence: "recurrence".into(),
            archive_tag: "archived".into(),
            time_entries: "timeEntries".into(),
            complete_instances: "complete_instances".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_table_keeps_defaults() {
        let mapping: FieldMapping = toml::from_str("status = \"state\"\ndue = \"deadline\"")
            .expect("mapping should parse");
        assert_eq!(mapping.status, "state");
        assert_eq!(mapping.due, "deadline");
        assert_eq!(mapping.priority, "priority");
        assert_eq!(mapping.complete_instances, "complete_instances");
    }
}
