use reqwest::Url;
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_SERVERS_FILE: &str = "servers.json";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct BotConfig {
    pub token: String,
    pub prefix: String,
    pub image_base_url: Url,
    pub servers_path: PathBuf,
    pub query_timeout: Duration,
    pub probe_timeout: Duration,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let base = lookup("MAP_IMAGE_BASE_URL").ok_or(ConfigError::Missing("MAP_IMAGE_BASE_URL"))?;
        let image_base_url = Url::parse(base.trim()).map_err(|e| ConfigError::Invalid {
            name: "MAP_IMAGE_BASE_URL",
            reason: e.to_string(),
        })?;
        if image_base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                name: "MAP_IMAGE_BASE_URL",
                reason: "not a hierarchical URL".into(),
            });
        }

        let prefix = lookup("COMMAND_PREFIX")
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let servers_path = lookup("SERVERS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_servers_path);

        Ok(Self {
            token,
            prefix,
            image_base_url,
            servers_path,
            query_timeout: timeout_var(&lookup, "QUERY_TIMEOUT_SECS")?,
            probe_timeout: timeout_var(&lookup, "IMAGE_PROBE_TIMEOUT_SECS")?,
        })
    }
}

fn timeout_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Duration, ConfigError> {
    let Some(raw) = lookup(name) else {
        return Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            reason: "must be at least 1 second".into(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

/// `servers.json` beside the executable, or in the working directory if
/// the executable path cannot be resolved.
fn default_servers_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_SERVERS_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SERVERS_FILE))
}
