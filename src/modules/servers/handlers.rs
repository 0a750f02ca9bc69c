use super::format::format_duration;
use super::images::MapImageResolver;
use super::query::{query_server, PlayerInfo, ServerInfo, ServerQuery};
use super::registry::{self, key_ordinal, server_key, ServerAddress, ServerMap};
use crate::config::BotConfig;
use tracing::{info, warn};

pub const SUCCESS_COLOUR: u32 = 0x00ff00;
pub const ERROR_COLOUR: u32 = 0xff0000;

/// Player text stops growing once it passes this many characters.
const PLAYERS_SOFT_LIMIT: usize = 1000;
/// Discord's limit for an embed field value.
const FIELD_LIMIT: usize = 1024;

const NO_PLAYERS: &str = "No active players";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerEmbed {
    pub title: String,
    pub colour: u32,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
    pub image: Option<String>,
}

impl ServerEmbed {
    fn new(title: impl Into<String>, colour: u32) -> Self {
        Self {
            title: title.into(),
            colour,
            description: None,
            fields: Vec::new(),
            image: None,
        }
    }

    fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Embed(ServerEmbed),
}

/// Checks an ordinal before anything touches the servers file.
fn validate_ordinal(ordinal: Option<i64>, prefix: &str) -> Result<i64, Reply> {
    match ordinal {
        None => Err(Reply::Text(format!(
            "❌ Please specify a server number, e.g. `{}server_info 1`",
            prefix
        ))),
        Some(n) if !(registry::MIN_ORDINAL..=registry::MAX_ORDINAL).contains(&n) => {
            Err(Reply::Text(format!(
                "❌ Server number must be between {} and {}.",
                registry::MIN_ORDINAL,
                registry::MAX_ORDINAL
            )))
        }
        Some(n) => Ok(n),
    }
}

/// Describe one configured server: metadata, map image and connected players.
pub async fn server_info(
    config: &BotConfig,
    query: &dyn ServerQuery,
    images: &MapImageResolver,
    ordinal: Option<i64>,
) -> Reply {
    let ordinal = match validate_ordinal(ordinal, &config.prefix) {
        Ok(n) => n,
        Err(reply) => return reply,
    };

    let servers = registry::load_servers(&config.servers_path).await;
    let Some(address) = servers.get(&server_key(ordinal)) else {
        return Reply::Text(format!("❌ Server #{} was not found.", ordinal));
    };

    info!("Querying server #{} at {}", ordinal, address);
    match query_server(query, address).await {
        Ok((info, players)) => {
            let image = images.resolve(&info.map).await;
            Reply::Embed(info_embed(ordinal, address, &info, &players, image.to_string()))
        }
        Err(e) => {
            warn!("Server #{} at {} unreachable: {}", ordinal, address, e);
            let mut embed = ServerEmbed::new("Error", ERROR_COLOUR);
            embed.description = Some(format!(
                "Could not fetch information for server #{}. Error: {}",
                ordinal, e
            ));
            embed.image = Some(images.fallback().to_string());
            Reply::Embed(embed)
        }
    }
}

fn info_embed(
    ordinal: i64,
    address: &ServerAddress,
    info: &ServerInfo,
    players: &[PlayerInfo],
    image: String,
) -> ServerEmbed {
    let mut embed = ServerEmbed::new(format!("CS 1.6 Server #{}", ordinal), SUCCESS_COLOUR)
        .field("Server name", info.name.as_str())
        .field("Map", info.map.as_str())
        .field("Players", format!("{}/{}", info.players, info.max_players))
        .field("Address", address.to_string())
        .field("Player details", player_section(players));
    embed.image = Some(image);
    embed
}

/// One block per player in query order, capped to fit in an embed field.
pub fn player_section(players: &[PlayerInfo]) -> String {
    if players.is_empty() {
        return NO_PLAYERS.to_string();
    }

    let mut section = String::new();
    let mut length = 0;
    for player in players {
        let entry = format!(
            "Name: {}\nTime on server: {}\nScore: {}\n\n",
            player.name,
            format_duration(player.connected_secs),
            player.score
        );
        length += entry.chars().count();
        section.push_str(&entry);

        if length > PLAYERS_SOFT_LIMIT {
            break;
        }
    }

    if length > FIELD_LIMIT {
        section = section.chars().take(FIELD_LIMIT).collect();
    }
    section
}

/// Lists every configured server as `<ordinal>: <host>:<port>`.
pub async fn list_servers(config: &BotConfig) -> Reply {
    let servers = registry::load_servers(&config.servers_path).await;

    let mut embed = ServerEmbed::new("Available servers", SUCCESS_COLOUR);
    embed.description = Some(if servers.is_empty() {
        "No servers configured.".to_string()
    } else {
        server_lines(&servers)
    });
    Reply::Embed(embed)
}

fn server_lines(servers: &ServerMap) -> String {
    let mut entries: Vec<_> = servers
        .iter()
        .map(|(key, address)| (key_ordinal(key), address))
        .collect();
    entries.sort_by_key(|(ordinal, _)| (ordinal.parse::<u64>().ok().unwrap_or(u64::MAX), *ordinal));

    entries
        .into_iter()
        .map(|(ordinal, address)| format!("{}: {}", ordinal, address))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::servers::images::tests::{resolver, FakeProbe};
    use crate::modules::servers::query::QueryError;
    use crate::modules::servers::registry::tests::write_servers_file;
    use async_trait::async_trait;
    use reqwest::{StatusCode, Url};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct FakeQuery {
        failure: Option<String>,
        players: Vec<PlayerInfo>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ServerQuery for FakeQuery {
        async fn info(&self, _address: &ServerAddress) -> Result<ServerInfo, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(failure) = &self.failure {
                return Err(QueryError::Protocol(failure.clone()));
            }
            Ok(ServerInfo {
                name: "Dust2 Only".into(),
                map: "de_dust2".into(),
                players: self.players.len() as u8,
                max_players: 32,
            })
        }

        async fn players(&self, _address: &ServerAddress) -> Result<Vec<PlayerInfo>, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.players.clone())
        }
    }

    fn config(servers_path: PathBuf) -> BotConfig {
        BotConfig {
            token: "token".into(),
            prefix: "!".into(),
            image_base_url: Url::parse("https://img.example.com/maps/").unwrap(),
            servers_path,
            query_timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(5),
        }
    }

    fn player(name: &str, connected_secs: u64, score: i32) -> PlayerInfo {
        PlayerInfo {
            name: name.into(),
            connected_secs,
            score,
        }
    }

    fn embed(reply: Reply) -> ServerEmbed {
        match reply {
            Reply::Embed(embed) => embed,
            Reply::Text(text) => panic!("expected embed, got text {:?}", text),
        }
    }

    const TWO_SERVERS: &str =
        r#"{"server_1": ["10.0.0.1", "27015"], "server_2": ["10.0.0.2", "27016"]}"#;

    #[tokio::test]
    async fn missing_ordinal_asks_for_one() {
        let query = FakeQuery::default();
        let probe = Arc::new(FakeProbe::answering(StatusCode::OK));
        let file = write_servers_file(TWO_SERVERS);
        let config = config(file.path().to_path_buf());

        let reply = server_info(&config, &query, &resolver(probe), None).await;

        assert_eq!(
            reply,
            Reply::Text("❌ Please specify a server number, e.g. `!server_info 1`".into())
        );
        assert_eq!(query.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn out_of_range_ordinals_are_rejected_without_queries() {
        let query = FakeQuery::default();
        let probe = Arc::new(FakeProbe::answering(StatusCode::OK));
        let images = resolver(probe.clone());
        let file = write_servers_file(TWO_SERVERS);
        let config = config(file.path().to_path_buf());

        for ordinal in [0, 31, -4] {
            let reply = server_info(&config, &query, &images, Some(ordinal)).await;
            assert_eq!(
                reply,
                Reply::Text("❌ Server number must be between 1 and 30.".into())
            );
        }
        assert_eq!(query.calls.load(Ordering::SeqCst), 0);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_ordinal_is_not_found() {
        let query = FakeQuery::default();
        let probe = Arc::new(FakeProbe::answering(StatusCode::OK));
        let file = write_servers_file(TWO_SERVERS);
        let config = config(file.path().to_path_buf());

        let reply = server_info(&config, &query, &resolver(probe), Some(5)).await;

        assert_eq!(reply, Reply::Text("❌ Server #5 was not found.".into()));
        assert_eq!(query.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn discarded_servers_file_means_not_found() {
        let query = FakeQuery::default();
        let probe = Arc::new(FakeProbe::answering(StatusCode::OK));
        let file = write_servers_file(
            r#"{"server_1": ["10.0.0.1", "27015"], "server_2": ["10.0.0.2"]}"#,
        );
        let config = config(file.path().to_path_buf());

        let reply = server_info(&config, &query, &resolver(probe), Some(1)).await;

        assert_eq!(reply, Reply::Text("❌ Server #1 was not found.".into()));
        assert_eq!(query.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reachable_server_is_described() {
        let query = FakeQuery {
            players: vec![player("alice", 90_061, 12), player("bob", 0, -1)],
            ..Default::default()
        };
        let probe = Arc::new(FakeProbe::answering(StatusCode::OK));
        let file = write_servers_file(TWO_SERVERS);
        let config = config(file.path().to_path_buf());

        let embed = embed(server_info(&config, &query, &resolver(probe), Some(2)).await);

        assert_eq!(embed.title, "CS 1.6 Server #2");
        assert_eq!(embed.colour, SUCCESS_COLOUR);
        assert_eq!(
            embed.image.as_deref(),
            Some("https://img.example.com/maps/de_dust2.jpg")
        );
        let values: Vec<&str> = embed.fields.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values[..4], ["Dust2 Only", "de_dust2", "2/32", "10.0.0.2:27016"]);
        assert_eq!(
            values[4],
            "Name: alice\nTime on server: 1 day, 1 hour, 1 minute, 1 second\nScore: 12\n\n\
             Name: bob\nTime on server: 0 seconds\nScore: -1\n\n"
        );
    }

    #[tokio::test]
    async fn empty_server_shows_placeholder() {
        let query = FakeQuery::default();
        let probe = Arc::new(FakeProbe::answering(StatusCode::NOT_FOUND));
        let file = write_servers_file(TWO_SERVERS);
        let config = config(file.path().to_path_buf());

        let embed = embed(server_info(&config, &query, &resolver(probe), Some(1)).await);

        assert_eq!(embed.fields.last().unwrap().value, "No active players");
        assert_eq!(
            embed.image.as_deref(),
            Some("https://img.example.com/maps/none.jpg")
        );
    }

    #[tokio::test]
    async fn query_failure_reports_the_error() {
        let query = FakeQuery {
            failure: Some("connection refused".into()),
            ..Default::default()
        };
        let probe = Arc::new(FakeProbe::answering(StatusCode::OK));
        let file = write_servers_file(TWO_SERVERS);
        let config = config(file.path().to_path_buf());

        let embed = embed(server_info(&config, &query, &resolver(probe.clone()), Some(1)).await);

        assert_eq!(embed.colour, ERROR_COLOUR);
        assert_eq!(
            embed.description.as_deref(),
            Some("Could not fetch information for server #1. Error: connection refused")
        );
        assert_eq!(
            embed.image.as_deref(),
            Some("https://img.example.com/maps/none.jpg")
        );
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn player_section_stops_after_soft_limit() {
        let players: Vec<_> = (0..100).map(|i| player(&format!("p{:02}", i), 7_200, 1)).collect();

        let section = player_section(&players);

        // 24 entries of 42 characters cross the soft limit; the cap is not reached.
        assert_eq!(section.chars().count(), 1008);
        assert!(section.ends_with("Name: p23\nTime on server: 2 hrs\nScore: 1\n\n"));
        assert!(!section.contains("p24"));
    }

    #[test]
    fn player_section_is_hard_capped() {
        let long_name = "ж".repeat(2000);
        let section = player_section(&[player(&long_name, 5, 1)]);
        assert_eq!(section.chars().count(), FIELD_LIMIT);
    }

    #[tokio::test]
    async fn servers_are_listed_by_ordinal() {
        let file = write_servers_file(
            r#"{"server_10": ["10.0.0.10", "27015"], "server_2": ["10.0.0.2", "27016"], "server_1": ["cs.example.com", "27015"]}"#,
        );
        let config = config(file.path().to_path_buf());

        let embed = embed(list_servers(&config).await);

        assert_eq!(embed.title, "Available servers");
        assert_eq!(
            embed.description.as_deref(),
            Some("1: cs.example.com:27015\n2: 10.0.0.2:27016\n10: 10.0.0.10:27015")
        );
    }

    #[tokio::test]
    async fn empty_list_says_so() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path().join("servers.json"));
        let embed = embed(list_servers(&config).await);
        assert_eq!(embed.description.as_deref(), Some("No servers configured."));
    }
}
