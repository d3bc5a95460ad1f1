//! State Store
//!
//! Single source of truth for the session. All mutation funnels through one
//! sanitizing choke point: functional updaters receive an owned structural
//! clone, the result is sanitized, persisted best-effort, and broadcast
//! synchronously to subscribers in registration order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::models::session::{Session, Stage, StagePatch};
use crate::storage::SnapshotStore;

type Listener = Arc<dyn Fn(&Session) + Send + Sync>;

/// Reactive store holding the one live [`Session`]
pub struct StateStore {
    session: Mutex<Session>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
    persistence: SnapshotStore,
}

impl StateStore {
    /// Create a store with an explicit initial session
    pub fn new(initial: Session, persistence: SnapshotStore) -> Self {
        Self {
            session: Mutex::new(initial.sanitize()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
            persistence,
        }
    }

    /// Create a store initialized from the persisted snapshot
    pub fn load(persistence: SnapshotStore) -> Self {
        let initial = persistence.load();
        Self::new(initial, persistence)
    }

    /// Current snapshot. Callers receive an owned clone; mutating it has no
    /// effect on live state.
    pub fn get_state(&self) -> Session {
        self.session.lock().clone()
    }

    /// Apply a functional update. The updater receives a structurally
    /// independent clone of the current session and returns its replacement.
    pub fn set_state<F>(&self, updater: F)
    where
        F: FnOnce(Session) -> Session,
    {
        let next = {
            let mut guard = self.session.lock();
            let next = updater(guard.clone()).sanitize();
            *guard = next.clone();
            next
        };
        self.after_commit(&next);
    }

    /// Replace the session wholesale
    pub fn replace_state(&self, next: Session) {
        self.set_state(|_| next);
    }

    /// Persist best-effort, then notify. Durability failures never block the
    /// in-memory transition.
    fn after_commit(&self, next: &Session) {
        if let Err(err) = self.persistence.save(next) {
            tracing::warn!("failed to persist session snapshot: {}", err);
        }

        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(next);
        }
    }

    /// Register a listener, invoked synchronously after every committed
    /// change in registration order. The returned handle removes exactly this
    /// registration.
    pub fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn(&Session) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(listener)));
        Subscription {
            id,
            store: Arc::downgrade(self),
        }
    }

    /// Merge a patch into the stage matching `stage_id`. No-op (not an
    /// error) when no stage matches.
    pub fn update_stage(&self, stage_id: &str, patch: StagePatch) {
        self.set_state(|mut session| {
            if let Some(stage) = session.stages.iter_mut().find(|s| s.id == stage_id) {
                stage.apply_patch(patch);
            }
            session
        });
    }

    /// Replace the whole stage sequence. An empty sequence is substituted
    /// with a single blank stage by sanitation.
    pub fn replace_stages(&self, stages: Vec<Stage>) {
        self.set_state(|mut session| {
            session.stages = stages;
            session
        });
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

/// Handle to a registered listener; dropping it without calling
/// [`unsubscribe`](Self::unsubscribe) leaves the listener registered.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    store: Weak<StateStore>,
}

impl Subscription {
    /// Remove the listener this handle refers to
    pub fn unsubscribe(self) {
        if let Some(store) = self.store.upgrade() {
            store.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
