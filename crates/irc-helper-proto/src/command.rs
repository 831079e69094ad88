//! Outgoing IRC commands.
//!
//! Only the subset the bot ever writes is modelled. Each variant serializes to
//! a single protocol line *without* the terminator; [`LineCodec`] appends the
//! CRLF when the command is written to the socket.
//!
//! [`LineCodec`]: crate::LineCodec

use std::fmt;

use crate::ctcp::Action;
use crate::error::{ProtocolError, Result};

/// An outgoing IRC command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `USER <user> 0 * :<user>`
    User(String),
    /// `NICK <nick>`
    Nick(String),
    /// `JOIN <channel>`
    Join(String),
    /// `PART <channel> [:<reason>]`
    Part(String, Option<String>),
    /// `PRIVMSG <target> :<text>`
    Privmsg(String, String),
    /// `PONG :<token>`
    Pong(String),
    /// `QUIT [:<farewell>]`
    Quit(Option<String>),
}

impl Command {
    /// Create a PRIVMSG to `target`.
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Self {
        Command::Privmsg(target.into(), text.into())
    }

    /// Create a CTCP ACTION (what `/me` produces) addressed to `target`.
    pub fn action(target: impl Into<String>, text: &str) -> Self {
        Command::Privmsg(target.into(), Action(text).to_string())
    }

    /// The protocol verb of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::User(_) => "USER",
            Command::Nick(_) => "NICK",
            Command::Join(_) => "JOIN",
            Command::Part(_, _) => "PART",
            Command::Privmsg(_, _) => "PRIVMSG",
            Command::Pong(_) => "PONG",
            Command::Quit(_) => "QUIT",
        }
    }

    /// Reject arguments that would smuggle a second line onto the wire.
    pub fn validate(&self) -> Result<()> {
        fn check(field: &'static str, value: &str) -> Result<()> {
            if value.contains(['\r', '\n']) {
                Err(ProtocolError::LineBreak { field })
            } else {
                Ok(())
            }
        }

        match self {
            Command::User(user) => check("user", user),
            Command::Nick(nick) => check("nick", nick),
            Command::Join(channel) => check("channel", channel),
            Command::Part(channel, reason) => {
                check("channel", channel)?;
                reason.as_deref().map_or(Ok(()), |r| check("reason", r))
            }
            Command::Privmsg(target, text) => {
                check("target", target)?;
                check("text", text)
            }
            Command::Pong(token) => check("token", token),
            Command::Quit(farewell) => farewell.as_deref().map_or(Ok(()), |f| check("farewell", f)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::User(user) => write!(f, "USER {user} 0 * :{user}"),
            Command::Nick(nick) => write!(f, "NICK {nick}"),
            Command::Join(channel) => write!(f, "JOIN {channel}"),
            Command::Part(channel, Some(reason)) => write!(f, "PART {channel} :{reason}"),
            Command::Part(channel, None) => write!(f, "PART {channel}"),
            Command::Privmsg(target, text) => write!(f, "PRIVMSG {target} :{text}"),
            Command::Pong(token) => write!(f, "PONG :{token}"),
            Command::Quit(Some(farewell)) => write!(f, "QUIT :{farewell}"),
            Command::Quit(None) => f.write_str("QUIT"),
        }
    }
}

/// Build the reply to a liveness probe.
///
/// Returns `Some(PONG)` carrying the probe's token when the first word of
/// `line` is `PING` (any case), and `None` for every other line. The answer
/// does not depend on connection state, which is why this lives outside the
/// handshake machine.
pub fn pong_for(line: &str) -> Option<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    if !verb.eq_ignore_ascii_case("PING") {
        return None;
    }
    let token = rest.trim_start();
    let token = token.strip_prefix(':').unwrap_or(token);
    Some(Command::Pong(token.to_owned()))
}
