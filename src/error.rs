//! Unified error handling for irc-helper.
//!
//! [`BotError`] is what handlers, stores and the dispatch loop return.
//! Only [`BotError::Connection`] and [`BotError::Config`] are fatal; everything
//! else is reported to the user or logged and the session continues.

use irc_helper_proto::{ProtocolError, RegistrationState};
use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DbError;

// ============================================================================
// Connection Errors (socket and handshake)
// ============================================================================

/// Socket or handshake failure. Always fatal to the session.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    #[error("server closed the connection during the handshake")]
    ClosedDuringHandshake,

    #[error("connection not ready (state: {0})")]
    NotReady(RegistrationState),
}

impl From<ProtocolError> for ConnectionError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(e) => ConnectionError::Io(e),
            other => ConnectionError::Protocol(other),
        }
    }
}

// ============================================================================
// Bot Errors (dispatch, stores, startup)
// ============================================================================

/// Errors surfaced by bot operations.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("no target: not in a channel and no recipient given")]
    NoTarget,

    #[error("unknown flag: {0} (valid flags are a, w, i)")]
    UnknownFlag(String),

    #[error("storage error: {0}")]
    Storage(#[from] DbError),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BotError {
    /// Whether the session must end.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Config(_))
    }

    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::NoTarget => "no_target",
            Self::UnknownFlag(_) => "unknown_flag",
            Self::Storage(_) => "storage",
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::Config(_) => "config",
        }
    }
}

impl From<ProtocolError> for BotError {
    fn from(err: ProtocolError) -> Self {
        BotError::Connection(err.into())
    }
}

/// Result alias used across the crate.
pub type BotResult<T> = Result<T, BotError>;
