//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::{CatalogService, EmailService, SessionTokens};

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid SMTP configuration: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    catalog: CatalogService,
    tokens: SessionTokens,
    mailer: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay settings are invalid.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let catalog = CatalogService::new(pool.clone());
        let tokens = SessionTokens::new(&config.jwt_secret);
        let mailer = config.email.as_ref().map(EmailService::new).transpose()?;

        if mailer.is_none() {
            tracing::warn!("SMTP not configured; recovery codes will only be logged");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                tokens,
                mailer,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the cached catalog reads.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get the session token signer.
    #[must_use]
    pub fn tokens(&self) -> &SessionTokens {
        &self.inner.tokens
    }

    /// Get the email service, if SMTP is configured.
    #[must_use]
    pub fn mailer(&self) -> Option<&EmailService> {
        self.inner.mailer.as_ref()
    }
}
