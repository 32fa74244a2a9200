//! Application state shared across handlers.

use std::sync::Arc;

use lettre::transport::smtp::Error as SmtpError;
use sqlx::PgPool;

use crate::config::CrmConfig;
use crate::db::PgNotificationStore;
use crate::events::BroadcastBus;
use crate::services::{EmailService, Notifier, TokenService};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid SMTP configuration: {0}")]
    Email(#[from] SmtpError),
}

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CrmConfig,
    pool: PgPool,
    tokens: TokenService,
    events: Arc<BroadcastBus>,
    notifier: Notifier,
    email: Option<EmailService>,
}

impl AppState {
    /// Wire up the services the handlers need.
    ///
    /// # Errors
    ///
    /// Returns an error if SMTP is configured but the relay is invalid.
    pub fn new(config: CrmConfig, pool: PgPool) -> Result<Self, StateError> {
        let tokens = TokenService::new(&config.jwt_secret);
        let events = Arc::new(BroadcastBus::new());
        let notifier = Notifier::new(
            Arc::new(PgNotificationStore::new(pool.clone())),
            events.clone(),
        );
        let email = config.email.as_ref().map(EmailService::new).transpose()?;

        if email.is_none() {
            tracing::info!("SMTP not configured, welcome emails disabled");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                events,
                notifier,
                email,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &CrmConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// The live event bus feeding `/socket` listeners.
    #[must_use]
    pub fn events(&self) -> &BroadcastBus {
        &self.inner.events
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// The email service, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }
}
