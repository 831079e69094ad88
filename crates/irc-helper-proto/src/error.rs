//! Error types for the protocol layer.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Protocol-level failures.
///
/// Malformed inbound lines are deliberately absent: the event parser degrades
/// to an [`Event`](crate::Event) with empty fields instead of failing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line (or the buffered partial line) exceeded the codec limit.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    MessageTooLong {
        /// Actual line length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// An outgoing argument contained CR or LF, which would split the line.
    #[error("line break in outgoing {field}")]
    LineBreak {
        /// Which part of the command carried the line break.
        field: &'static str,
    },
}
