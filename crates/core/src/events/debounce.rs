//! Per-path debouncing of file events.
//!
//! Each path has at most one pending timer. A new event for the same path
//! aborts the pending timer and schedules a fresh one, so a burst of writes
//! fires once, `delay` after the last event.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// What the pending re-index should report once it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Create,
    Modify,
}

impl PendingKind {
    /// A create followed by modifies is still a create.
    fn merge(self, next: PendingKind) -> PendingKind {
        match self {
            PendingKind::Create => PendingKind::Create,
            PendingKind::Modify => next,
        }
    }
}

#[derive(Debug)]
struct Pending {
    kind: PendingKind,
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
struct State {
    delay: Duration,
    next_generation: u64,
    pending: HashMap<String, Pending>,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    state: Arc<Mutex<State>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                delay,
                next_generation: 0,
                pending: HashMap::new(),
            })),
        }
    }

    /// Schedule `fire` for `path`, replacing any pending timer for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, path: &str, kind: PendingKind, fire: F)
    where
        F: FnOnce(String, PendingKind) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.lock();
        let kind = match state.pending.remove(path) {
            Some(previous) => {
                previous.handle.abort();
                trace!("Rescheduled pending re-index of {}", path);
                previous.kind.merge(kind)
            }
            None => kind,
        };

        let generation = state.next_generation;
        state.next_generation += 1;
        let delay = state.delay;
        let shared = self.state.clone();
        let key = path.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let current = {
                let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                match state.pending.get(&key) {
                    Some(p) if p.generation == generation => state.pending.remove(&key),
                    _ => None,
                }
            };
            if let Some(pending) = current {
                fire(key, pending.kind).await;
            }
        });

        state.pending.insert(path.to_string(), Pending { kind, generation, handle });
    }

    /// Drop the pending timer for `path`. Returns whether one existed.
    pub fn cancel(&self, path: &str) -> bool {
        match self.lock().pending.remove(path) {
            Some(pending) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, pending) in self.lock().pending.drain() {
            pending.handle.abort();
        }
    }

    pub fn is_pending(&self, path: &str) -> bool {
        self.lock().pending.contains_key(path)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Change the quiescence window for timers scheduled from now on.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = delay;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Fired = Arc<Mutex<Vec<(String, PendingKind)>>>;

    fn recorder() -> Fired {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn schedule(debouncer: &Debouncer, path: &str, kind: PendingKind, fired: &Fired) {
        let fired = fired.clone();
        debouncer.schedule(path, kind, move |path, kind| async move {
            fired.lock().unwrap().push((path, kind));
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once_after_quiet_period() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let fired = recorder();

        for _ in 0..5 {
            schedule(&debouncer, "a.md", PendingKind::Modify, &fired);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(fired.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(*fired.lock().unwrap(), vec![("a.md".to_string(), PendingKind::Modify)]);
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paths_are_independent() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let fired = recorder();

        schedule(&debouncer, "a.md", PendingKind::Modify, &fired);
        schedule(&debouncer, "b.md", PendingKind::Create, &fired);
        tokio::time::sleep(Duration::from_millis(301)).await;

        let mut got = fired.lock().unwrap().clone();
        got.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            got,
            vec![
                ("a.md".to_string(), PendingKind::Modify),
                ("b.md".to_string(), PendingKind::Create)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_then_modify_stays_create() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let fired = recorder();

        schedule(&debouncer, "a.md", PendingKind::Create, &fired);
        schedule(&debouncer, "a.md", PendingKind::Modify, &fired);
        tokio::time::sleep(Duration::from_millis(301)).await;

        assert_eq!(*fired.lock().unwrap(), vec![("a.md".to_string(), PendingKind::Create)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let fired = recorder();

        schedule(&debouncer, "a.md", PendingKind::Modify, &fired);
        schedule(&debouncer, "b.md", PendingKind::Modify, &fired);
        assert!(debouncer.cancel("a.md"));
        assert!(!debouncer.cancel("missing.md"));
        tokio::time::sleep(Duration::from_millis(301)).await;
        assert_eq!(fired.lock().unwrap().len(), 1);

        schedule(&debouncer, "c.md", PendingKind::Modify, &fired);
        debouncer.cancel_all();
        tokio::time::sleep(Duration::from_millis(301)).await;
        assert_eq!(fired.lock().unwrap().len(), 1);
    }
}
