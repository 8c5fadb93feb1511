//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{AdminBackendClient, BackendError};
use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backend: AdminBackendClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, BackendError> {
        let backend = AdminBackendClient::new(&config.backend)?;
        Ok(Self {
            inner: Arc::new(AppStateInner { config, backend }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Admin backend client.
    #[must_use]
    pub fn backend(&self) -> &AdminBackendClient {
        &self.inner.backend
    }
}
