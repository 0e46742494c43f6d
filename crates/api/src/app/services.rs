//! Service wiring: session manager, stores and cookie policy shared by all handlers.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use shopdesk_auth::{CodecError, CredentialStore, SessionManager, TokenCodec, TokenLifetimes};
use shopdesk_infra::{
    connect, CatalogStore, CustomerStore, InMemoryStore, OrderStore, PostgresStore, StoreError,
    UserStore,
};

use crate::config::ApiConfig;
use crate::cookies::CookiePolicy;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("token signing is misconfigured: {0}")]
    Codec(#[from] CodecError),

    #[error("database unavailable: {0}")]
    Store(#[from] StoreError),
}

pub struct AppServices {
    pub sessions: SessionManager,
    pub cookies: CookiePolicy,
    pub users: Arc<dyn UserStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub orders: Arc<dyn OrderStore>,
    pub catalog: Arc<dyn CatalogStore>,
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("sessions", &self.sessions)
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

impl AppServices {
    /// Wire every service onto one backend that stores all resources.
    pub fn from_store<S>(store: Arc<S>, codec: TokenCodec, lifetimes: TokenLifetimes, cookies: CookiePolicy) -> Self
    where
        S: CredentialStore + UserStore + CustomerStore + OrderStore + CatalogStore + 'static,
    {
        let credentials: Arc<dyn CredentialStore> = store.clone();
        Self {
            sessions: SessionManager::new(codec, credentials, lifetimes),
            cookies,
            users: store.clone(),
            customers: store.clone(),
            orders: store.clone(),
            catalog: store,
        }
    }
}

/// Build services from configuration (PostgreSQL when `DATABASE_URL` is set).
pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StartupError> {
    let codec = TokenCodec::new(&config.jwt_secret)?;
    let cookies = CookiePolicy {
        secure: config.cookie_secure,
    };

    match &config.database {
        Some(db) => {
            let store = Arc::new(PostgresStore::new(connect(db).await?));
            info!("using postgres store");
            Ok(AppServices::from_store(store, codec, config.lifetimes, cookies))
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
            let store = Arc::new(InMemoryStore::new());
            Ok(AppServices::from_store(store, codec, config.lifetimes, cookies))
        }
    }
}
