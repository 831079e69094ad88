//! Inbound line parsing.
//!
//! Every inbound line becomes exactly one [`Event`]. The parser never fails:
//! a line that does not have the `[:prefix] COMMAND [recipient] [:message]`
//! shape still yields an event, with the fields it could not find left empty.

use crate::casemap;

/// A structured view of one inbound protocol line.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Event {
    /// Prefix text before the first `!` (the whole prefix for servers);
    /// empty without a prefix.
    pub sender: String,
    /// Command verb or numeric, as received.
    pub command: String,
    /// First middle parameter: the channel or nickname the line is addressed to.
    pub recipient: String,
    /// Everything after the first ` :` marker following the command.
    pub message: String,
    /// The line itself, without its terminator.
    pub raw: String,
}

impl Event {
    /// Parse one line. Trailing CR/LF are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use irc_helper_proto::Event;
    ///
    /// let event = Event::parse(":alice!x@host PRIVMSG #room :hello");
    /// assert_eq!(event.sender, "alice");
    /// assert_eq!(event.command, "PRIVMSG");
    /// assert_eq!(event.recipient, "#room");
    /// assert_eq!(event.message, "hello");
    /// ```
    pub fn parse(line: &str) -> Self {
        let raw = line.trim_end_matches(['\r', '\n']);
        let mut event = Event {
            raw: raw.to_owned(),
            ..Event::default()
        };

        let rest = match raw.strip_prefix(':') {
            Some(tail) => {
                let (prefix, rest) = tail.split_once(' ').unwrap_or((tail, ""));
                let (sender, _) = prefix.split_once('!').unwrap_or((prefix, ""));
                event.sender = sender.to_owned();
                rest
            }
            None => raw,
        };

        let rest = rest.trim_start_matches(' ');
        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing)),
            None => (rest, None),
        };

        let mut params = head.split(' ').filter(|p| !p.is_empty());
        if let Some(command) = params.next() {
            event.command = command.to_owned();
            event.recipient = params.next().unwrap_or_default().to_owned();
            event.message = trailing.unwrap_or_default().to_owned();
        }

        event
    }

    /// Whether this line is a PRIVMSG (case-insensitive).
    pub fn is_privmsg(&self) -> bool {
        self.command.eq_ignore_ascii_case("PRIVMSG")
    }

    /// Whether the command matches `verb`, ignoring case.
    pub fn is_command(&self, verb: &str) -> bool {
        self.command.eq_ignore_ascii_case(verb)
    }

    /// Whether the sender equals any of `names` under rfc1459 casemapping.
    pub fn is_from_any(&self, names: &[&str]) -> bool {
        !self.sender.is_empty() && names.iter().any(|n| casemap::eq(n, &self.sender))
    }

    /// The channel named by a JOIN or PART line.
    ///
    /// Servers disagree on whether the channel is a middle or trailing
    /// parameter, so both are accepted.
    pub fn channel(&self) -> &str {
        if self.recipient.is_empty() {
            &self.message
        } else {
            &self.recipient
        }
    }
}
