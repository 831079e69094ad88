//! CTCP ACTION wrapping.
//!
//! Actions (what `/me` sends) travel inside a PRIVMSG body delimited by
//! `\x01`. This is the only CTCP verb the bot speaks.
//!
//! # Example
//!
//! ```
//! use irc_helper_proto::ctcp::Action;
//!
//! let action = Action("dances");
//! assert_eq!(action.to_string(), "\x01ACTION dances\x01");
//! ```

use std::fmt;

/// The CTCP delimiter character (`\x01`).
const CTCP_DELIM: char = '\x01';

/// A CTCP ACTION body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Action<'a>(pub &'a str);

impl fmt::Display for Action<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CTCP_DELIM}ACTION {}{CTCP_DELIM}", self.0)
    }
}
