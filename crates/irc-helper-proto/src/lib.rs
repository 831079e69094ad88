//! # irc-helper-proto
//!
//! The protocol layer of the irc-helper bot. Nothing in this crate touches a
//! socket: it turns bytes into lines, lines into [`Event`]s, outgoing
//! [`Command`]s into wire text, and drives the registration handshake as a
//! sans-IO state machine.
//!
//! ## Quick Start
//!
//! ```rust
//! use irc_helper_proto::{Command, Event};
//!
//! let event = Event::parse(":alice!x@host PRIVMSG #room :hello");
//! assert_eq!(event.sender, "alice");
//! assert_eq!(event.recipient, "#room");
//! assert_eq!(event.message, "hello");
//!
//! let reply = Command::privmsg("#room", "hi alice");
//! assert_eq!(reply.to_string(), "PRIVMSG #room :hi alice");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod command;
pub mod ctcp;
pub mod error;
pub mod event;
pub mod handshake;
#[cfg(feature = "tokio")]
pub mod line;

pub use self::command::{pong_for, Command};
pub use self::ctcp::Action;
pub use self::error::{ProtocolError, Result};
pub use self::event::Event;
pub use self::handshake::{
    HandshakeAction, HandshakeConfig, HandshakeMachine, NumericDetector, ReadinessDetector,
    RegistrationState, SubstringDetector,
};
#[cfg(feature = "tokio")]
pub use self::line::{LineCodec, MAX_LINE_LEN};
