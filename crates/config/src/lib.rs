use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "chatline.toml",
    "config/chatline.toml",
    "crates/config/chatline.toml",
    "../chatline.toml",
    "../config/chatline.toml",
    "../crates/config/chatline.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub collections: CollectionConfig,
}

/// Connection settings for the backend-as-a-service.
///
/// ```
/// use chatline_config::BackendConfig;
///
/// let backend = BackendConfig::default();
/// assert_eq!(backend.base_url, "http://127.0.0.1:8080/api");
/// assert_eq!(backend.request_timeout_seconds, 30);
/// assert!(backend.api_key.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "BackendConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "BackendConfig::default_realtime_url")]
    pub realtime_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "BackendConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl BackendConfig {
    fn default_base_url() -> String {
        "http://127.0.0.1:8080/api".to_string()
    }

    fn default_realtime_url() -> String {
        "ws://127.0.0.1:8080/realtime".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            realtime_url: Self::default_realtime_url(),
            api_key: None,
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

/// Collection names as they are registered on the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionConfig {
    pub users: String,
    pub chats: String,
    pub messages: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            chats: "chats".to_string(),
            messages: "messages".to_string(),
        }
    }
}

/// Load the configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use chatline_config::load;
///
/// std::env::remove_var("CHATLINE_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.backend.base_url.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let timeout = i64::try_from(defaults.backend.request_timeout_seconds).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("backend.base_url", defaults.backend.base_url.clone())?
        .set_default("backend.realtime_url", defaults.backend.realtime_url.clone())?
        .set_default("backend.request_timeout_seconds", timeout)?
        .set_default("collections.users", defaults.collections.users.clone())?
        .set_default("collections.chats", defaults.collections.chats.clone())?
        .set_default("collections.messages", defaults.collections.messages.clone())?;

    let environment_overrides = config::Environment::with_prefix("CHATLINE").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("CHATLINE_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via CHATLINE_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(
        base_url = %config.backend.base_url,
        realtime_url = %config.backend.realtime_url,
        "loaded chatline configuration"
    );
    Ok(config)
}
