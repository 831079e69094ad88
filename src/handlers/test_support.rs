//! Scaffolding for handler unit tests: a registered connection over an
//! in-memory pipe, an in-memory database and a canned title fetcher.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};

use super::{BotState, Context};
use crate::config::{Config, HandshakeSettings};
use crate::connection::ConnectionManager;
use crate::db::Database;
use crate::permissions::PermissionRegistry;
use crate::title::TitleFetcher;
use crate::triggers::TriggerStore;

pub(crate) const CONFIG: &str = r##"
[connection]
host = "irc.example.net"
nick = "Tooth"
user = "toothless"
channel = "#room"

[bot]
inedible = ["Hiccup"]
"##;

pub(crate) struct CannedTitles(pub &'static str);

#[async_trait]
impl TitleFetcher for CannedTitles {
    async fn fetch_title(&self, _url: &str) -> String {
        self.0.to_string()
    }
}

pub(crate) struct Harness {
    pub conn: ConnectionManager,
    pub triggers: TriggerStore,
    pub permissions: PermissionRegistry,
    pub titles: CannedTitles,
    pub config: Config,
    pub state: BotState,
    reader: BufReader<ReadHalf<DuplexStream>>,
    _writer: WriteHalf<DuplexStream>,
}

impl Harness {
    /// A harness whose connection is registered and joined to `#room`.
    pub async fn new() -> Self {
        let config: Config = toml::from_str(CONFIG).unwrap();
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (read, mut write) = tokio::io::split(server);
        write
            .write_all(b":irc.example.net NOTICE * :*** Found your hostname\r\n:irc.example.net 376 Tooth :End of /MOTD command.\r\n")
            .await
            .unwrap();

        let mut conn =
            ConnectionManager::with_stream(client, &config.connection, &HandshakeSettings::default());
        conn.handshake().await.unwrap();
        conn.join_channel("#room").await.unwrap();

        let db = Database::new(":memory:").await.unwrap();
        let mut harness = Self {
            conn,
            triggers: TriggerStore::new(db.clone()),
            permissions: PermissionRegistry::new(db),
            titles: CannedTitles("How to Train Your Dragon"),
            config,
            state: BotState::default(),
            reader: BufReader::new(read),
            _writer: write,
        };
        // USER, NICK, JOIN
        assert_eq!(harness.sent().await.len(), 3);
        harness
    }

    pub fn ctx(&mut self) -> Context<'_> {
        Context {
            conn: &mut self.conn,
            triggers: &self.triggers,
            permissions: &self.permissions,
            titles: &self.titles,
            config: &mut self.config,
            state: &mut self.state,
        }
    }

    /// Every line the bot has written so far.
    pub async fn sent(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            match tokio::time::timeout(Duration::from_millis(50), self.reader.read_line(&mut line))
                .await
            {
                Ok(Ok(n)) if n > 0 => lines.push(line.trim_end().to_string()),
                _ => return lines,
            }
        }
    }
}
