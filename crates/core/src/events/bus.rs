//! Change notification bus.
//!
//! Consumers register callbacks per [`CacheEventKind`]. Publishing invokes
//! every callback for the kind synchronously; a failing or panicking
//! callback is logged and does not affect the others.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheEventKind {
    CacheInitialized,
    FileUpdated,
    FileAdded,
    FileDeleted,
    FileRenamed,
}

impl CacheEventKind {
    pub const ALL: [CacheEventKind; 5] = [
        Self::CacheInitialized,
        Self::FileUpdated,
        Self::FileAdded,
        Self::FileDeleted,
        Self::FileRenamed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheInitialized => "cache-initialized",
            Self::FileUpdated => "file-updated",
            Self::FileAdded => "file-added",
            Self::FileDeleted => "file-deleted",
            Self::FileRenamed => "file-renamed",
        }
    }
}

impl fmt::Display for CacheEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change published by the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum CacheEvent {
    CacheInitialized { task_count: usize, note_count: usize, duration_ms: u64 },
    FileUpdated { path: String },
    FileAdded { path: String },
    FileDeleted { path: String },
    FileRenamed { old_path: String, new_path: String },
}

impl CacheEvent {
    pub fn kind(&self) -> CacheEventKind {
        match self {
            Self::CacheInitialized { .. } => CacheEventKind::CacheInitialized,
            Self::FileUpdated { .. } => CacheEventKind::FileUpdated,
            Self::FileAdded { .. } => CacheEventKind::FileAdded,
            Self::FileDeleted { .. } => CacheEventKind::FileDeleted,
            Self::FileRenamed { .. } => CacheEventKind::FileRenamed,
        }
    }
}

/// Error a subscriber may return. It is logged and otherwise ignored.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SubscriberError(String);

impl SubscriberError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type Callback = Arc<dyn Fn(&CacheEvent) -> Result<(), SubscriberError> + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<CacheEventKind, Vec<(u64, Callback)>>,
}

/// Publish/subscribe hub owned by a cache manager.
#[derive(Clone, Default)]
pub struct ChangeBus {
    registry: Arc<Mutex<Registry>>,
}

impl fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        let mut kinds: Vec<_> = registry.subscribers.keys().collect();
        kinds.sort();
        f.debug_struct("ChangeBus").field("kinds", &kinds).finish()
    }
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `kind`. The callback stays registered until
    /// [`Subscription::unsubscribe`] is called or the bus is cleared.
    pub fn subscribe<F>(&self, kind: CacheEventKind, callback: F) -> Subscription
    where
        F: Fn(&CacheEvent) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.entry(kind).or_default().push((id, Arc::new(callback)));
        Subscription { registry: Arc::downgrade(&self.registry), kind, id }
    }

    /// Invoke every subscriber of the event's kind.
    pub(crate) fn publish(&self, event: &CacheEvent) {
        let kind = event.kind();
        // Snapshot so callbacks may subscribe or unsubscribe re-entrantly.
        let callbacks: Vec<Callback> = match self.lock().subscribers.get(&kind) {
            Some(subs) => subs.iter().map(|(_, cb)| cb.clone()).collect(),
            None => return,
        };

        for callback in callbacks {
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Error in cache subscriber for {}: {}", kind, e),
                Err(_) => error!("Cache subscriber for {} panicked", kind),
            }
        }
    }

    pub fn subscriber_count(&self, kind: CacheEventKind) -> usize {
        self.lock().subscribers.get(&kind).map_or(0, Vec::len)
    }

    /// Kinds that currently have at least one subscriber.
    pub fn active_kinds(&self) -> Vec<CacheEventKind> {
        let mut kinds: Vec<_> = self.lock().subscribers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Drop every subscriber.
    pub fn clear(&self) {
        self.lock().subscribers.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle returned by [`ChangeBus::subscribe`].
///
/// Dropping the handle keeps the callback registered.
#[must_use = "keep the subscription to be able to unsubscribe"]
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    kind: CacheEventKind,
    id: u64,
}

impl Subscription {
    pub fn kind(&self) -> CacheEventKind {
        self.kind
    }

    /// Remove this callback. A kind left without subscribers is pruned.
    pub fn unsubscribe(self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(subs) = registry.subscribers.get_mut(&self.kind) {
            subs.retain(|(id, _)| *id != self.id);
            if subs.is_empty() {
                registry.subscribers.remove(&self.kind);
            }
        }
    }
}
