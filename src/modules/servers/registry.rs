use serde_json::Value;
use std::{collections::BTreeMap, fmt, io::ErrorKind, path::Path};
use thiserror::Error;
use tokio::fs;
use tracing::{error, info, warn};

pub const MIN_ORDINAL: i64 = 1;
pub const MAX_ORDINAL: i64 = 30;

#[derive(Error, Debug)]
pub enum ServersError {
    #[error("servers file {0} not found")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid server address for {key}: {value}")]
    InvalidEntry { key: String, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

pub type ServerMap = BTreeMap<String, ServerAddress>;

pub fn server_key(ordinal: i64) -> String {
    format!("server_{}", ordinal)
}

/// The segment between a key's first and second underscore, or the whole key.
pub fn key_ordinal(key: &str) -> &str {
    key.split('_').nth(1).unwrap_or(key)
}

/// Parses a servers table. A single malformed entry rejects the whole table.
pub fn parse_servers(raw: &str) -> Result<ServerMap, ServersError> {
    let entries: BTreeMap<String, Value> = serde_json::from_str(raw)?;

    entries
        .into_iter()
        .map(|(key, value)| match parse_address(&value) {
            Some(address) => Ok((key, address)),
            None => Err(ServersError::InvalidEntry {
                key,
                value: value.to_string(),
            }),
        })
        .collect()
}

fn parse_address(value: &Value) -> Option<ServerAddress> {
    let [Value::String(host), Value::String(port)] = value.as_array()?.as_slice() else {
        return None;
    };
    let port = port.trim().parse::<u16>().ok().filter(|p| *p != 0)?;

    Some(ServerAddress {
        host: host.clone(),
        port,
    })
}

pub async fn try_load_servers(path: &Path) -> Result<ServerMap, ServersError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ServersError::NotFound(path.display().to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    parse_servers(&raw)
}

/// Reads the servers file, failing closed to an empty table.
pub async fn load_servers(path: &Path) -> ServerMap {
    match try_load_servers(path).await {
        Ok(servers) => {
            info!("Loaded {} servers from {}", servers.len(), path.display());
            servers
        }
        Err(e @ ServersError::InvalidEntry { .. }) => {
            warn!("Discarding servers file {}: {}", path.display(), e);
            ServerMap::new()
        }
        Err(e) => {
            error!("Failed to load servers file {}: {}", path.display(), e);
            ServerMap::new()
        }
    }
}
