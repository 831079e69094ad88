//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Connection Defaults
// =============================================================================

pub fn default_port() -> u16 {
    6667
}

// =============================================================================
// Storage Defaults
// =============================================================================

pub fn default_database_path() -> String {
    "irc-helper.db".to_string()
}

// =============================================================================
// Handshake Defaults
// =============================================================================

pub fn default_max_line_len() -> usize {
    irc_helper_proto::MAX_LINE_LEN
}

// =============================================================================
// Bot Defaults
// =============================================================================

pub fn default_farewell() -> String {
    "Goodbye!".to_string()
}
