use super::registry::ServerAddress;
use a2s::A2SClient;
use async_trait::async_trait;
use std::{fmt::Debug, future::Future, time::Duration};
use thiserror::Error;
use tokio::time::{timeout, Instant};
use tracing::debug;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("query to {address} timed out after {secs}s", secs = .after.as_secs())]
    Timeout { address: String, after: Duration },
    #[error("{0}")]
    Protocol(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub map: String,
    pub players: u8,
    pub max_players: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerInfo {
    pub name: String,
    /// Whole seconds since the player connected.
    pub connected_secs: u64,
    pub score: i32,
}

#[async_trait]
pub trait ServerQuery: Send + Sync + Debug {
    async fn info(&self, address: &ServerAddress) -> Result<ServerInfo, QueryError>;
    async fn players(&self, address: &ServerAddress) -> Result<Vec<PlayerInfo>, QueryError>;
}

/// Fetches server metadata followed by the player list. No retries.
pub async fn query_server(
    query: &dyn ServerQuery,
    address: &ServerAddress,
) -> Result<(ServerInfo, Vec<PlayerInfo>), QueryError> {
    let info = query.info(address).await?;
    let players = query.players(address).await?;
    Ok((info, players))
}

/// Source query protocol over UDP. Every call binds its own socket.
#[derive(Debug, Clone)]
pub struct A2sQuery {
    timeout: Duration,
}

impl A2sQuery {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn bounded<T, F>(&self, address: &ServerAddress, kind: &str, fut: F) -> Result<T, QueryError>
    where
        F: Future<Output = Result<T, QueryError>>,
    {
        debug!("Querying {} - {}", address, kind);
        let start = Instant::now();

        let result = match timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(QueryError::Timeout {
                address: address.to_string(),
                after: self.timeout,
            }),
        };

        debug!("Query time for {} {}: {:?}", address, kind, start.elapsed());
        result
    }
}

async fn client() -> Result<A2SClient, QueryError> {
    A2SClient::new()
        .await
        .map_err(|e| QueryError::Protocol(e.to_string()))
}

#[async_trait]
impl ServerQuery for A2sQuery {
    async fn info(&self, address: &ServerAddress) -> Result<ServerInfo, QueryError> {
        let target = address.to_string();
        self.bounded(address, "info", async {
            let info = client()
                .await?
                .info(target.as_str())
                .await
                .map_err(|e| QueryError::Protocol(e.to_string()))?;

            Ok(ServerInfo {
                name: info.name,
                map: info.map,
                players: info.players,
                max_players: info.max_players,
            })
        })
        .await
    }

    async fn players(&self, address: &ServerAddress) -> Result<Vec<PlayerInfo>, QueryError> {
        let target = address.to_string();
        self.bounded(address, "players", async {
            let players = client()
                .await?
                .players(target.as_str())
                .await
                .map_err(|e| QueryError::Protocol(e.to_string()))?;

            Ok(players
                .into_iter()
                .map(|p| PlayerInfo {
                    name: p.name,
                    connected_secs: p.duration.max(0.0) as u64,
                    score: p.score,
                })
                .collect())
        })
        .await
    }
}
