//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("connection.host is required")]
    MissingHost,
    #[error("connection.port must be non-zero")]
    InvalidPort,
    #[error("connection.nick is required")]
    MissingNick,
    #[error("connection.nick must not contain spaces, got '{0}'")]
    NickContainsSpace(String),
    #[error("connection.user is required")]
    MissingUser,
    #[error("connection.channel must start with '#' or '&', got '{0}'")]
    InvalidChannel(String),
    #[error("handshake.max_line_len must be non-zero")]
    InvalidMaxLineLen,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let conn = &config.connection;

    // Required fields
    if conn.host.trim().is_empty() {
        errors.push(ValidationError::MissingHost);
    }
    if conn.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    if conn.nick.trim().is_empty() {
        errors.push(ValidationError::MissingNick);
    } else if conn.nick.contains(char::is_whitespace) {
        errors.push(ValidationError::NickContainsSpace(conn.nick.clone()));
    }
    if conn.user.trim().is_empty() {
        errors.push(ValidationError::MissingUser);
    }
    if !conn.channel.starts_with(['#', '&']) {
        errors.push(ValidationError::InvalidChannel(conn.channel.clone()));
    }

    if config.handshake.max_line_len == 0 {
        errors.push(ValidationError::InvalidMaxLineLen);
    }

    // Database path validation
    let db_path = &config.database.path;
    if db_path != ":memory:"
        && let Some(parent) = Path::new(db_path).parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::DatabasePathInvalid(db_path.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
