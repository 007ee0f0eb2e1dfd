//! Shared application state.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::services::AccessGate;
use crate::store::Store;

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Store,
    gate: AccessGate,
}

impl AppState {
    /// Assemble the state from loaded configuration and an initialized store.
    #[must_use]
    pub fn new(config: ApiConfig, store: Store) -> Self {
        let gate = AccessGate::new(config.gate_secret.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                gate,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    #[must_use]
    pub fn gate(&self) -> &AccessGate {
        &self.inner.gate
    }
}
