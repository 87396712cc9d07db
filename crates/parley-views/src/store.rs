use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{trace, warn};

use parley_types::actions::Action;

use crate::state::AppState;

/// Shared client state. Cloning is cheap; all clones see the same state.
///
/// Readers get short-lived access through [`Store::read`]; writers go through
/// `dispatch*`, which run the reducer. No lock is held across a network call.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<AppState>>,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Runs `f` against the current state.
    pub async fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let state = self.inner.read().await;
        f(&state)
    }

    /// A full copy of the current state.
    pub async fn snapshot(&self) -> AppState {
        self.inner.read().await.clone()
    }

    pub async fn dispatch(&self, action: Action) {
        trace!("dispatch (channel: {:?})", action.channel_id());
        self.inner.write().await.apply(action);
    }

    /// Applies several records under one write lock, so readers never see a
    /// partially applied batch.
    pub async fn dispatch_batch(&self, actions: Vec<Action>) {
        if actions.is_empty() {
            return;
        }
        trace!("dispatch batch of {}", actions.len());
        let mut state = self.inner.write().await;
        for action in actions {
            state.apply(action);
        }
    }

    /// Applies `action` without awaiting. Usable from `Drop`: when the lock is
    /// busy the write is handed to a spawned task instead.
    pub fn dispatch_detached(&self, action: Action) {
        if let Ok(mut state) = self.inner.try_write() {
            state.apply(action);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = self.clone();
                handle.spawn(async move { store.dispatch(action).await });
            }
            Err(_) => warn!(
                "dropping update (channel: {:?}): store is locked outside a runtime",
                action.channel_id()
            ),
        }
    }

    /// Dispatches `action` only if `guard` holds, checking and applying under
    /// the same write lock. Returns whether the action was applied.
    pub async fn try_dispatch(&self, guard: impl FnOnce(&AppState) -> bool, action: Action) -> bool {
        let mut state = self.inner.write().await;
        if !guard(&state) {
            return false;
        }
        state.apply(action);
        true
    }
}
