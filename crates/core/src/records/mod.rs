//! Structured task and note records derived from vault files.

pub mod builder;
pub mod mapping;
pub mod recurrence;
pub mod types;

pub use builder::{
    build_note_record, build_task_record, note_from_frontmatter, task_from_frontmatter,
};
pub use mapping::FieldMapping;
pub use recurrence::{Frequency, Recurrence, UnknownFrequency};
pub use types::{IndexedFileEntry, NoteRecord, Record, TaskRecord, TimeEntry};
