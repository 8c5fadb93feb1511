//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{BackendClient, BackendError};
use crate::chat::{ChatAssistant, GeminiClient, GeminiError, KeywordTable};
use crate::config::StorefrontConfig;

/// Error building the shared clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("gemini client: {0}")]
    Gemini(#[from] GeminiError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    assistant: ChatAssistant,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let backend = BackendClient::new(&config.backend)?;
        let gemini = config.gemini.as_ref().map(GeminiClient::new).transpose()?;
        let assistant = ChatAssistant::new(KeywordTable::default(), gemini);

        Ok(Self::from_parts(config, backend, assistant))
    }

    /// Assemble state from prebuilt clients.
    #[must_use]
    pub fn from_parts(
        config: StorefrontConfig,
        backend: BackendClient,
        assistant: ChatAssistant,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                assistant,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Commerce backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Keyword/Gemini shopping assistant.
    #[must_use]
    pub fn assistant(&self) -> &ChatAssistant {
        &self.inner.assistant
    }
}
