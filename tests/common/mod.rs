//! Integration test common infrastructure.
//!
//! A scripted IRC server on a loopback port. The test drives the server side
//! line by line while the bot runs against it over real TCP.

use std::time::Duration;

use async_trait::async_trait;
use irc_helper::Config;
use irc_helper::title::TitleFetcher;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::time::timeout;

/// The server name used in every scripted line.
pub const SERVER: &str = "127.0.0.1";

/// Config for a bot named `Tooth` in `#room` with `boss` as admin.
pub fn config(port: u16) -> Config {
    toml::from_str(&format!(
        r##"
[connection]
host = "{SERVER}"
port = {port}
nick = "Tooth"
user = "toothless"
channel = "#room"

[database]
path = ":memory:"

[bot]
admins = ["boss"]
inedible = ["Hiccup"]
farewell = "Goodbye!"

[messages]
greetings = ["greets {{nick}}!"]
"##
    ))
    .expect("test config parses")
}

/// Title fetcher that never touches the network.
pub struct CannedTitles;

#[async_trait]
impl TitleFetcher for CannedTitles {
    async fn fetch_title(&self, _url: &str) -> String {
        "How to Train Your Dragon".to_string()
    }
}

/// Listening side of a scripted server.
pub struct FakeServer {
    listener: TcpListener,
}

impl FakeServer {
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind((SERVER, 0)).await?;
        Ok(Self { listener })
    }

    pub fn port(&self) -> u16 {
        self.listener
            .local_addr()
            .expect("listener has an address")
            .port()
    }

    /// Accept the bot's connection.
    pub async fn accept(&self) -> anyhow::Result<FakePeer> {
        let (stream, _) = timeout(Duration::from_secs(5), self.listener.accept()).await??;
        let (read_half, write_half) = stream.into_split();
        Ok(FakePeer {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }
}

/// One accepted bot connection.
pub struct FakePeer {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl FakePeer {
    /// Send one line, appending CRLF.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// The next line from the bot, without its terminator.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(Duration::from_secs(5), self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("bot closed the connection");
        }
        Ok(line.trim_end().to_string())
    }

    /// Assert the next line from the bot equals `expected`.
    pub async fn expect(&mut self, expected: &str) -> anyhow::Result<()> {
        let line = self.recv().await?;
        anyhow::ensure!(line == expected, "expected {expected:?}, got {line:?}");
        Ok(())
    }

    /// Whether the bot closed its side of the connection.
    pub async fn closed(&mut self) -> bool {
        let mut line = String::new();
        matches!(
            timeout(Duration::from_secs(5), self.reader.read_line(&mut line)).await,
            Ok(Ok(0))
        )
    }

    /// Run registration and swallow the join announcement.
    pub async fn register(&mut self) -> anyhow::Result<()> {
        self.send(&format!(":{SERVER} NOTICE * :*** Looking up your hostname...")).await?;
        self.send(&format!(":{SERVER} NOTICE * :*** Found your hostname")).await?;
        self.expect("USER toothless 0 * :toothless").await?;
        self.expect("NICK Tooth").await?;
        self.send(&format!(":{SERVER} 001 Tooth :Welcome")).await?;
        self.send(&format!(":{SERVER} 376 Tooth :End of /MOTD command.")).await?;
        self.expect("JOIN #room").await?;
        self.expect("PRIVMSG #room :\x01ACTION enters the arena!\x01").await?;
        Ok(())
    }
}

/// Wrap `text` as the CTCP ACTION line the bot sends to `target`.
#[allow(dead_code)]
pub fn action(target: &str, text: &str) -> String {
    format!("PRIVMSG {target} :\x01ACTION {text}\x01")
}
