//! Core configuration types and loading.

use irc_helper_proto::casemap;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{
    default_database_path, default_farewell, default_max_line_len, default_port,
};
use super::messages::Messages;
use super::validation::ValidationError;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {}", join(.0))]
    Invalid(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server and identity.
    pub connection: ConnectionConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Registration handshake tuning.
    #[serde(default)]
    pub handshake: HandshakeSettings,
    /// Behaviour knobs (admins, inedible victims, farewell).
    #[serde(default)]
    pub bot: BotConfig,
    /// Flavor text.
    #[serde(default)]
    pub messages: Messages,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load and validate in one step.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::checked(Self::load(path)?)
    }

    /// [`load_validated`](Self::load_validated) without blocking the runtime,
    /// for reloads while a session is live.
    pub async fn load_validated_async<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::checked(toml::from_str(&content)?)
    }

    fn checked(config: Config) -> Result<Self, ConfigError> {
        super::validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

/// Server and identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Server hostname or address.
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Nickname to register.
    pub nick: String,
    /// Username (ident) to register.
    #[serde(alias = "user_name")]
    pub user: String,
    /// Base channel joined after registration.
    pub channel: String,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// How the handshake decides the server is ready.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Detection {
    /// Match the "found your hostname" and "end of /motd" notices.
    #[default]
    Substring,
    /// Register on the first server line; ready on 376 or 422.
    Numeric,
}

/// Registration handshake configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HandshakeSettings {
    #[serde(default)]
    pub detection: Detection,
    /// Longest inbound line accepted, in bytes.
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
}

impl Default for HandshakeSettings {
    fn default() -> Self {
        Self {
            detection: Detection::default(),
            max_line_len: default_max_line_len(),
        }
    }
}

/// Behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Users granted the admin flag at startup.
    #[serde(default)]
    pub admins: Vec<String>,
    /// Victims the bot refuses to eat.
    #[serde(default)]
    pub inedible: Vec<String>,
    /// QUIT message.
    #[serde(default = "default_farewell")]
    pub farewell: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            admins: Vec::new(),
            inedible: Vec::new(),
            farewell: default_farewell(),
        }
    }
}

impl BotConfig {
    /// Whether `victim` is on the inedible list, compared as nicknames.
    pub fn is_inedible(&self, victim: &str) -> bool {
        self.inedible.iter().any(|v| casemap::eq(v, victim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"
[connection]
host = "irc.example.net"
nick = "Toothless"
user = "toothless"
channel = "#httyd"
"##;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.connection.port, 6667);
        assert_eq!(config.database.path, "irc-helper.db");
        assert_eq!(config.handshake.detection, Detection::Substring);
        assert_eq!(config.handshake.max_line_len, 8191);
        assert_eq!(config.bot.farewell, "Goodbye!");
        assert!(config.bot.admins.is_empty());
        assert_eq!(config.messages.announce_arrival, "enters the arena!");
    }

    #[test]
    fn test_user_name_alias() {
        let toml = r##"
[connection]
host = "irc.example.net"
port = 7000
nick = "Toothless"
user_name = "nightfury"
channel = "#httyd"

[handshake]
detection = "numeric"

[bot]
admins = ["MysteriousMagenta"]
inedible = ["Hiccup"]
"##;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.connection.user, "nightfury");
        assert_eq!(config.connection.port, 7000);
        assert_eq!(config.handshake.detection, Detection::Numeric);
        assert_eq!(config.bot.admins, vec!["MysteriousMagenta".to_string()]);
        assert!(config.bot.is_inedible("hiccup"));
        assert!(!config.bot.is_inedible("Astrid"));
    }

    #[test]
    fn test_missing_connection_is_parse_error() {
        let result: Result<Config, _> = toml::from_str("[bot]\nfarewell = \"bye\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let config = Config::load_validated(&path).unwrap();
        assert_eq!(config.connection.nick, "Toothless");

        let missing = Config::load(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[tokio::test]
    async fn test_async_load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let config = Config::load_validated_async(&path).await.unwrap();
        assert_eq!(config.connection.nick, "Toothless");

        std::fs::write(&path, MINIMAL.replace("Toothless", "")).unwrap();
        assert!(matches!(
            Config::load_validated_async(&path).await,
            Err(ConfigError::Invalid(_))
        ));
    }
}
