//! Sans-IO registration handshake.
//!
//! [`HandshakeMachine`] consumes raw inbound lines and produces
//! [`HandshakeAction`]s (commands to send, or the signal that the connection
//! is ready). It performs no I/O; the connection layer feeds it lines and
//! writes whatever it returns.
//!
//! The flow is:
//!
//! ```text
//! Connecting --(hostname ack: send USER + NICK)--> Registering
//! Registering --(end of greeting)--> Ready
//! any --(close)--> Closed
//! ```
//!
//! What counts as "hostname ack" and "end of greeting" is decided by a
//! [`ReadinessDetector`]. [`SubstringDetector`] matches the human-readable
//! server notices; [`NumericDetector`] uses numeric replies instead.
//!
//! # Example
//!
//! ```
//! use irc_helper_proto::{HandshakeAction, HandshakeConfig, HandshakeMachine, RegistrationState};
//!
//! let mut machine = HandshakeMachine::substring(HandshakeConfig::new("tooth", "toothless"));
//! let actions = machine.feed(":irc.example.net NOTICE * :*** Found your hostname");
//! assert_eq!(actions.len(), 2); // USER, NICK
//! let actions = machine.feed(":irc.example.net 376 tooth :End of /MOTD command.");
//! assert!(matches!(actions[..], [HandshakeAction::Ready]));
//! assert_eq!(machine.state(), RegistrationState::Ready);
//! ```

use std::fmt;

use tracing::debug;

use crate::command::{pong_for, Command};
use crate::event::Event;

/// Registration state of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RegistrationState {
    /// Socket open, waiting for the server to acknowledge our hostname.
    #[default]
    Connecting,
    /// USER/NICK sent, waiting for the end of the greeting.
    Registering,
    /// Greeting complete; channels may be joined.
    Ready,
    /// Socket closed. Terminal.
    Closed,
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Registering => "registering",
            Self::Ready => "ready",
            Self::Closed => "closed",
        })
    }
}

/// Identity the bot registers with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandshakeConfig {
    /// Desired nickname.
    pub nickname: String,
    /// Username (ident), also used as the realname.
    pub username: String,
}

impl HandshakeConfig {
    /// Build a config from a nickname and username.
    pub fn new(nickname: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            username: username.into(),
        }
    }
}

/// Actions produced by the handshake state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Send this command to the server.
    Send(Command),
    /// Registration is complete; proceed to normal operation.
    Ready,
}

/// Decides which inbound lines advance the handshake.
pub trait ReadinessDetector: fmt::Debug + Send + Sync {
    /// The server has looked us up and expects USER/NICK.
    fn is_hostname_ack(&self, event: &Event) -> bool;

    /// The server finished its greeting; registration is complete.
    fn is_end_of_greeting(&self, event: &Event) -> bool;
}

/// Matches the notices servers print during connection, case-insensitively.
///
/// This does not follow the numeric-reply grammar. A server that words its
/// notices differently never reaches `Ready`; use [`NumericDetector`] there.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubstringDetector;

impl SubstringDetector {
    /// Text of the hostname lookup notice.
    pub const HOSTNAME_ACK: &'static str = "found your hostname";
    /// Text of the end-of-MOTD reply.
    pub const END_OF_GREETING: &'static str = "end of /motd";
}

impl ReadinessDetector for SubstringDetector {
    fn is_hostname_ack(&self, event: &Event) -> bool {
        event.raw.to_lowercase().contains(Self::HOSTNAME_ACK)
    }

    fn is_end_of_greeting(&self, event: &Event) -> bool {
        event.raw.to_lowercase().contains(Self::END_OF_GREETING)
    }
}

/// Registers on the first server line and completes on `RPL_ENDOFMOTD` (376)
/// or `ERR_NOMOTD` (422).
#[derive(Clone, Copy, Debug, Default)]
pub struct NumericDetector;

impl NumericDetector {
    /// RPL_ENDOFMOTD
    pub const RPL_ENDOFMOTD: &'static str = "376";
    /// ERR_NOMOTD
    pub const ERR_NOMOTD: &'static str = "422";
}

impl ReadinessDetector for NumericDetector {
    fn is_hostname_ack(&self, event: &Event) -> bool {
        !event.command.is_empty()
    }

    fn is_end_of_greeting(&self, event: &Event) -> bool {
        event.command == Self::RPL_ENDOFMOTD || event.command == Self::ERR_NOMOTD
    }
}

/// Sans-IO state machine for the registration handshake.
#[derive(Debug)]
pub struct HandshakeMachine {
    config: HandshakeConfig,
    state: RegistrationState,
    registration_sent: bool,
    detector: Box<dyn ReadinessDetector>,
}

impl HandshakeMachine {
    /// Create a machine in the `Connecting` state.
    #[must_use]
    pub fn new(config: HandshakeConfig, detector: Box<dyn ReadinessDetector>) -> Self {
        Self {
            config,
            state: RegistrationState::Connecting,
            registration_sent: false,
            detector,
        }
    }

    /// Shorthand for a machine using [`SubstringDetector`].
    #[must_use]
    pub fn substring(config: HandshakeConfig) -> Self {
        Self::new(config, Box::new(SubstringDetector))
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RegistrationState {
        self.state
    }

    /// Whether USER/NICK have been emitted.
    #[must_use]
    pub fn registration_sent(&self) -> bool {
        self.registration_sent
    }

    /// Move to the terminal `Closed` state.
    pub fn close(&mut self) {
        self.state = RegistrationState::Closed;
    }

    /// Feed one raw inbound line.
    ///
    /// Liveness probes are answered in every state except `Closed` and never
    /// change the state. The registration commands are emitted at most once,
    /// and `Ready` is only reachable after they were emitted.
    #[must_use]
    pub fn feed(&mut self, line: &str) -> Vec<HandshakeAction> {
        if self.state == RegistrationState::Closed {
            return Vec::new();
        }

        if let Some(pong) = pong_for(line) {
            return vec![HandshakeAction::Send(pong)];
        }

        let event = Event::parse(line);
        match self.state {
            RegistrationState::Connecting if self.detector.is_hostname_ack(&event) => {
                debug!(nick = %self.config.nickname, "hostname acknowledged, registering");
                self.registration_sent = true;
                self.state = RegistrationState::Registering;
                vec![
                    HandshakeAction::Send(Command::User(self.config.username.clone())),
                    HandshakeAction::Send(Command::Nick(self.config.nickname.clone())),
                ]
            }
            RegistrationState::Registering if self.detector.is_end_of_greeting(&event) => {
                debug!(nick = %self.config.nickname, "greeting complete");
                self.state = RegistrationState::Ready;
                vec![HandshakeAction::Ready]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOSTNAME: &str = ":irc.example.net NOTICE * :*** Found your hostname";
    const MOTD_END: &str = ":irc.example.net 376 tooth :End of /MOTD command.";

    fn machine() -> HandshakeMachine {
        HandshakeMachine::substring(HandshakeConfig::new("tooth", "toothless"))
    }

    fn sent(actions: &[HandshakeAction]) -> Vec<String> {
        actions
            .iter()
            .filter_map(|a| match a {
                HandshakeAction::Send(cmd) => Some(cmd.to_string()),
                HandshakeAction::Ready => None,
            })
            .collect()
    }

    #[test]
    fn test_starts_connecting() {
        let machine = machine();
        assert_eq!(machine.state(), RegistrationState::Connecting);
        assert!(!machine.registration_sent());
    }

    #[test]
    fn test_hostname_ack_sends_user_then_nick() {
        let mut machine = machine();
        let actions = machine.feed(HOSTNAME);
        assert_eq!(
            sent(&actions),
            vec!["USER toothless 0 * :toothless", "NICK tooth"]
        );
        assert_eq!(machine.state(), RegistrationState::Registering);
    }

    #[test]
    fn test_registration_sent_exactly_once() {
        let mut machine = machine();
        let _ = machine.feed(HOSTNAME);
        assert!(machine.feed(HOSTNAME).is_empty());
        assert!(machine
            .feed(":irc.example.net NOTICE * :*** Found your hostname (cached)")
            .is_empty());
    }

    #[test]
    fn test_greeting_before_registration_is_ignored() {
        let mut machine = machine();
        assert!(machine.feed(MOTD_END).is_empty());
        assert_eq!(machine.state(), RegistrationState::Connecting);
    }

    #[test]
    fn test_full_flow_reaches_ready() {
        let mut machine = machine();
        let _ = machine.feed(":irc.example.net NOTICE * :*** Looking up your hostname...");
        assert_eq!(machine.state(), RegistrationState::Connecting);
        let _ = machine.feed(HOSTNAME);
        let _ = machine.feed(":irc.example.net 001 tooth :Welcome");
        assert_eq!(machine.state(), RegistrationState::Registering);
        let actions = machine.feed(MOTD_END);
        assert_eq!(actions, vec![HandshakeAction::Ready]);
        assert_eq!(machine.state(), RegistrationState::Ready);
    }

    #[test]
    fn test_ping_answered_in_every_open_state() {
        let mut machine = machine();
        let pong = vec![HandshakeAction::Send(Command::Pong("tok".into()))];

        assert_eq!(machine.feed("PING :tok"), pong);
        assert_eq!(machine.state(), RegistrationState::Connecting);

        let _ = machine.feed(HOSTNAME);
        assert_eq!(machine.feed("PING :tok"), pong);
        assert_eq!(machine.state(), RegistrationState::Registering);

        let _ = machine.feed(MOTD_END);
        assert_eq!(machine.feed("ping tok"), pong);
        assert_eq!(machine.state(), RegistrationState::Ready);

        machine.close();
        assert!(machine.feed("PING :tok").is_empty());
    }

    #[test]
    fn test_numeric_detector() {
        let mut machine = HandshakeMachine::new(
            HandshakeConfig::new("tooth", "toothless"),
            Box::new(NumericDetector),
        );
        let actions = machine.feed(":irc.example.net NOTICE AUTH :*** Checking Ident");
        assert_eq!(sent(&actions).len(), 2);
        assert!(machine.feed(":irc.example.net 375 tooth :- MOTD -").is_empty());
        assert_eq!(
            machine.feed(":irc.example.net 422 tooth :MOTD File is missing"),
            vec![HandshakeAction::Ready]
        );
    }
}
