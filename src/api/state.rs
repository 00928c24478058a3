//! Application state shared across handlers.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::core::{auth::TokenKeys, notification::PushSender};

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db: DatabaseConnection,
    config: AppConfig,
    tokens: TokenKeys,
    push: Arc<dyn PushSender>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `db` - Database connection, already migrated
    /// * `config` - Application configuration
    /// * `tokens` - Bearer token signing keys
    /// * `push` - Push notification sender
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        config: AppConfig,
        tokens: TokenKeys,
        push: Arc<dyn PushSender>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                db,
                config,
                tokens,
                push,
            }),
        }
    }

    /// Get a reference to the database connection.
    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        &self.inner.db
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the token keys.
    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        &self.inner.tokens
    }

    /// Get a reference to the push sender.
    #[must_use]
    pub fn push(&self) -> &dyn PushSender {
        self.inner.push.as_ref()
    }
}
