//! Tracing setup and span helpers.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Honors `RUST_LOG`, defaulting to `info`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();
}

/// Standardized span constructors for bot observability.
pub mod spans {
    use tracing::{Span, debug_span, info_span};

    /// Span covering one server session.
    pub fn session(host: &str, port: u16, nick: &str) -> Span {
        info_span!("session", host = %host, port = port, nick = %nick)
    }

    /// Span covering one inbound event.
    pub fn event(command: &str, sender: &str) -> Span {
        debug_span!("event", command = %command, sender = %sender)
    }

    /// Span covering one handler invocation.
    pub fn handler(name: &str, sender: &str, recipient: &str) -> Span {
        debug_span!("handler", name = %name, sender = %sender, recipient = %recipient)
    }
}
