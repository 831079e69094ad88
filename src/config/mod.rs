//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and loading (Config, ConnectionConfig, BotConfig)
//! - [`messages`]: Flavor text the bot speaks, with a default for every line
//! - [`validation`]: Startup sanity checks
//! - `defaults`: serde default value functions

mod defaults;
mod messages;
mod types;
mod validation;

pub use messages::{Messages, fill};
pub use types::{
    BotConfig, Config, ConfigError, ConnectionConfig, DatabaseConfig, Detection, HandshakeSettings,
};
pub use validation::{ValidationError, validate};
