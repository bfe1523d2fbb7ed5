//! Core library for tasknotes: an in-memory cache and index layer that turns
//! tagged markdown files into task and note records.

pub mod cache;
pub mod config;
pub mod events;
pub mod frontmatter;
pub mod records;
pub mod vault;

pub use cache::{CacheManager, CacheStats, CalendarData, DayTasks};
pub use events::{CacheEvent, CacheEventKind, ChangeBus, SubscriberError, Subscription};
pub use records::{NoteRecord, TaskRecord};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
