use std::sync::Arc;

use {
    clawpress_config::ClawpressConfig,
    clawpress_onboarding::{AssistantCreator, SiteFacts, service::chat_url},
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tracing::info,
};

use crate::{
    auth::SessionStore,
    nonce::NonceIssuer,
    users::{SqliteUserStore, UserStore},
};

/// Shared state for every request. Immutable after startup; the stores own
/// the only mutable state (the database).
pub struct GatewayState {
    pub version: &'static str,
    pub config: ClawpressConfig,
    /// Site facts shown by the wizard, read once at startup.
    pub site: SiteFacts,
    pub users: Arc<dyn UserStore>,
    pub creator: Arc<dyn AssistantCreator>,
    pub sessions: SessionStore,
    pub nonces: NonceIssuer,
}

impl GatewayState {
    /// Open (or create) the configured database and build the state on it.
    pub async fn open(config: ClawpressConfig) -> anyhow::Result<Arc<Self>> {
        let pool = open_pool(&config).await?;
        Self::with_pool(config, pool).await
    }

    pub async fn with_pool(config: ClawpressConfig, pool: SqlitePool) -> anyhow::Result<Arc<Self>> {
        let store = Arc::new(SqliteUserStore::new(pool.clone()).await?);
        let sessions = SessionStore::new(pool, config.auth.session_ttl_secs).await?;
        let expired = sessions.cleanup_expired().await?;
        if expired > 0 {
            info!(expired, "removed expired sessions");
        }
        Ok(Arc::new(Self {
            version: env!("CARGO_PKG_VERSION"),
            site: SiteFacts::from_config(&config.site),
            nonces: NonceIssuer::from_config(&config.auth),
            users: Arc::clone(&store) as Arc<dyn UserStore>,
            creator: store,
            sessions,
            config,
        }))
    }

    /// Site base URL without a trailing slash.
    pub fn base_url(&self) -> String {
        self.config.site.base_url()
    }

    pub fn chat_url(&self) -> String {
        chat_url(&self.base_url())
    }
}

/// Connection pool for the configured database file.
pub async fn open_pool(config: &ClawpressConfig) -> anyhow::Result<SqlitePool> {
    let path = match config.database.path.clone() {
        Some(path) => path,
        None => clawpress_config::data_dir().join("clawpress.db"),
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    info!(path = %path.display(), "opening database");
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    Ok(SqlitePoolOptions::new().connect_with(options).await?)
}
