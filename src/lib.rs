//! irc-helper - a rule-driven IRC bot.
//!
//! The bot keeps one connection to one server, registers, joins a base
//! channel and then processes every inbound line in arrival order. Flavor
//! commands are [`handlers`]; learned pattern/response rules live in the
//! [`triggers`] store; per-user capability flags live in [`permissions`].
//! Both stores persist to SQLite through [`db`].

pub mod bot;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod handlers;
pub mod permissions;
pub mod telemetry;
pub mod title;
pub mod triggers;

pub use bot::Bot;
pub use config::Config;
pub use error::{BotError, BotResult, ConnectionError};
