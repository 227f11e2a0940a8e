use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use turn_relay_core::{
    AgentSettings,
    agent::AGENT_DOMAIN,
    backend::DEFAULT_TIMEOUT,
    endpoint::DEFAULT_PORT,
};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// How speech and alert sounds reach the voice device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostServiceConfig {
    pub api_url: String,
    pub token: String,
    pub media_player_entity: String,
    pub alert_media_path: String,
    pub tts_language: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub backend_host: String,
    pub backend_port: u16,
    pub backend_timeout: Duration,
    pub entry_id: String,
    /// `None` means side effects are only logged.
    pub host_services: Option<HostServiceConfig>,
    pub log_level: Level,
    pub log_file: Option<PathBuf>,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let backend_host = var_or("BACKEND_HOST", "").trim().to_string();
        let backend_port = parse_var("BACKEND_PORT", DEFAULT_PORT)?;
        let backend_timeout = Duration::from_secs(parse_var(
            "BACKEND_TIMEOUT_SECS",
            DEFAULT_TIMEOUT.as_secs(),
        )?);
        if backend_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "BACKEND_TIMEOUT_SECS".to_string(),
                "timeout must be at least one second".to_string(),
            ));
        }

        let entry_id = var_or("AGENT_ENTRY_ID", "default");

        let host_services = match std::env::var("HOST_API_URL") {
            Ok(api_url) if !api_url.trim().is_empty() => {
                let token = std::env::var("HOST_API_TOKEN").map_err(|_| {
                    ConfigError::MissingVar(
                        "HOST_API_TOKEN must be set when HOST_API_URL is set".to_string(),
                    )
                })?;
                Some(HostServiceConfig {
                    api_url: api_url.trim().trim_end_matches('/').to_string(),
                    token,
                    media_player_entity: var_or("MEDIA_PLAYER_ENTITY", "media_player.square_voice"),
                    alert_media_path: var_or(
                        "ALERT_MEDIA_PATH",
                        "/media/sounds/listening_resume.wav",
                    ),
                    tts_language: var_or("TTS_LANGUAGE", "en-US"),
                })
            }
            _ => None,
        };

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let log_file = std::env::var("LOG_FILE").ok().map(PathBuf::from);

        Ok(Self {
            bind_address,
            backend_host,
            backend_port,
            backend_timeout,
            entry_id,
            host_services,
            log_level,
            log_file,
        })
    }

    /// Settings for the core conversation agent.
    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            configured_host: self.backend_host.clone(),
            port: self.backend_port,
            timeout: self.backend_timeout,
            agent_id: format!("{AGENT_DOMAIN}_{}", self.entry_id),
        }
    }
}
