//! Change notifications and the file event adapter.

pub(crate) mod adapter;
pub mod bus;
pub mod debounce;

pub use bus::{CacheEvent, CacheEventKind, ChangeBus, SubscriberError, Subscription};
pub use debounce::{Debouncer, PendingKind};
