use std::sync::Arc;

use anyhow::{Context, Result};
use chatline_backend::HttpBackendClient;
use chatline_chats::{ChatDataAccess, Cuid2Generator, SessionIdentity};
use chatline_config::AppConfig;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::TRACE)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Façade over the hosted backend, reading the user from a shared session
pub type HttpChatAccess = ChatDataAccess<HttpBackendClient, Arc<SessionIdentity>, Cuid2Generator>;

pub struct ChatServices {
    pub session: Arc<SessionIdentity>,
    pub access: HttpChatAccess,
}

impl ChatServices {
    pub fn initialise(config: &AppConfig) -> Result<Self> {
        Self::initialise_with_session(config, Arc::new(SessionIdentity::new()))
    }

    /// Wire the façade around a session owned by the caller
    pub fn initialise_with_session(config: &AppConfig, session: Arc<SessionIdentity>) -> Result<Self> {
        let backend =
            HttpBackendClient::new(&config.backend).context("failed to build backend client")?;

        let access = ChatDataAccess::new(
            backend,
            Arc::clone(&session),
            Cuid2Generator,
            config.collections.clone(),
        );

        info!(
            base_url = %config.backend.base_url,
            realtime_url = %config.backend.realtime_url,
            "chat services ready"
        );

        Ok(Self { session, access })
    }
}

/// Load configuration from the environment and wire the services
pub fn bootstrap() -> Result<ChatServices> {
    let config = chatline_config::load().context("failed to load configuration")?;
    ChatServices::initialise(&config)
}
