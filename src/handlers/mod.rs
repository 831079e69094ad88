//! Message handlers and the command router.
//!
//! A [`Handler`] inspects one PRIVMSG [`Event`] and reports an [`Outcome`].
//! The [`CommandRouter`] keeps two ordered handler lists (channel and private)
//! and stops at the first handler that claims the event. Flavor commands live
//! in the submodules; [`register_defaults`] wires them up in their canonical
//! order.

mod admin;
mod dragon;
mod flags;
mod registry;
mod tricks;
mod url;

pub use admin::{
    AppendWhitelistHandler, ListCommandsHandler, MoveChannelHandler, PurgeCommandsHandler,
    ReloadConfigHandler, TerminateHandler,
};
pub use dragon::{AttackHandler, EatHandler, SpitHandler, StomachHandler, VomitHandler};
pub use flags::{AddFlagHandler, RemoveFlagHandler};
pub use registry::CommandRouter;
pub use tricks::{ForgetHandler, LearnHandler};
pub use url::UrlTitleHandler;

use std::path::PathBuf;

use async_trait::async_trait;
use irc_helper_proto::{Event, casemap};
use rand::seq::SliceRandom;

use crate::config::{Config, fill};
use crate::connection::ConnectionManager;
use crate::error::BotResult;
use crate::permissions::{Flag, PermissionRegistry};
use crate::title::TitleFetcher;
use crate::triggers::TriggerStore;

/// Result of offering an event to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fully handled. Dispatch stops and triggers are not consulted.
    Claimed,
    /// Explicitly not this handler's event.
    NotClaimed,
    /// Acted on (or ignored) the event but lets the rest of the pipeline run.
    Indifferent,
}

/// Which handler list a handler is registered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Messages to the current channel.
    Channel,
    /// Messages addressed to the bot's nickname.
    Private,
    Both,
}

/// Mutable bot state that outlives a single event.
#[derive(Debug, Default)]
pub struct BotState {
    /// Victims eaten, in order of consumption.
    pub stomach: Vec<String>,
    /// Set by `terminate`; the run loop exits after the current event.
    pub shutdown_requested: bool,
    /// Where the config was loaded from, for `reload_config`.
    pub config_path: Option<PathBuf>,
}

/// Everything a handler may touch while handling one event.
pub struct Context<'a> {
    pub conn: &'a mut ConnectionManager,
    pub triggers: &'a TriggerStore,
    pub permissions: &'a PermissionRegistry,
    pub titles: &'a dyn TitleFetcher,
    pub config: &'a mut Config,
    pub state: &'a mut BotState,
}

impl Context<'_> {
    /// The bot's nickname.
    pub fn nick(&self) -> &str {
        &self.conn.session().nickname
    }

    /// Whether `user` holds the admin flag.
    pub async fn is_admin(&self, user: &str) -> BotResult<bool> {
        self.permissions.has_flag(Flag::Admin, user).await
    }

    /// Whether `user` may teach or forget tricks.
    pub async fn is_trainer(&self, user: &str) -> BotResult<bool> {
        self.permissions
            .has_any(&[Flag::Whitelist, Flag::Admin], user)
            .await
    }

    /// ACTION to the current channel.
    pub async fn act(&mut self, text: &str) -> BotResult<()> {
        self.conn.send_action(text, None).await
    }

    /// ACTION to one user.
    pub async fn act_to(&mut self, target: &str, text: &str) -> BotResult<()> {
        self.conn.send_action(text, Some(target)).await
    }

    /// Join `channel` and announce the arrival.
    pub async fn join_and_announce(&mut self, channel: &str) -> BotResult<()> {
        self.conn.join_channel(channel).await?;
        let arrival = self.config.messages.announce_arrival.clone();
        self.conn.send_action(&arrival, Some(channel)).await
    }
}

/// A message handler.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Inspect `event` and optionally act on it.
    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome>;
}

/// Split a channel command of the form `<nick>! <verb> <args>`.
///
/// The `<nick>!` prefix is matched under rfc1459 casemapping. Returns the lowercase
/// verb and the (possibly empty) argument text.
pub fn addressed<'m>(message: &'m str, nick: &str) -> Option<(String, &'m str)> {
    let (head, rest) = message.split_once(' ')?;
    let name = head.strip_suffix('!')?;
    if !casemap::eq(name, nick) {
        return None;
    }
    let (verb, args) = rest.split_once(' ').unwrap_or((rest, ""));
    Some((verb.to_lowercase(), args.trim()))
}

/// Split a private command into its lowercase verb and the remaining words.
pub fn private_command(message: &str) -> (String, Vec<&str>) {
    let mut words = message.split_whitespace();
    let verb = words.next().unwrap_or_default().to_lowercase();
    (verb, words.collect())
}

/// Pick a random line and substitute `key`, appending `value` when the line
/// has no placeholder for it.
pub fn pick_line(lines: &[String], fallback: &str, key: &str, value: &str) -> String {
    let line = lines
        .choose(&mut rand::thread_rng())
        .map_or(fallback, String::as_str);
    let placeholder = format!("{{{key}}}");
    if line.contains(&placeholder) {
        fill(line, &[(key, value)])
    } else {
        format!("{line} {value}")
    }
}

/// Register every built-in handler in canonical order.
pub fn register_defaults(router: &mut CommandRouter) {
    router.register(UrlTitleHandler, Scope::Channel);
    router.register(LearnHandler, Scope::Channel);
    router.register(ForgetHandler, Scope::Channel);
    router.register(AttackHandler, Scope::Channel);
    router.register(EatHandler, Scope::Channel);
    router.register(SpitHandler, Scope::Channel);
    router.register(StomachHandler, Scope::Channel);
    router.register(VomitHandler, Scope::Channel);

    router.register(PurgeCommandsHandler, Scope::Private);
    router.register(AppendWhitelistHandler, Scope::Private);
    router.register(TerminateHandler, Scope::Private);
    router.register(ListCommandsHandler, Scope::Private);
    router.register(AddFlagHandler, Scope::Private);
    router.register(RemoveFlagHandler, Scope::Private);
    router.register(ReloadConfigHandler, Scope::Private);
    router.register(MoveChannelHandler, Scope::Private);
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addressed_parses_verb_and_args() {
        assert_eq!(
            addressed("Tooth! learn ^hi -> hello", "tooth"),
            Some(("learn".to_string(), "^hi -> hello"))
        );
        assert_eq!(
            addressed("TOOTH! Stomach", "Tooth"),
            Some(("stomach".to_string(), ""))
        );
        assert_eq!(
            addressed("{tooth}! eat x", "[Tooth]"),
            Some(("eat".to_string(), "x"))
        );
        assert_eq!(addressed("Tooth learn x", "Tooth"), None);
        assert_eq!(addressed("Hiccup! learn x", "Tooth"), None);
        assert_eq!(addressed("Tooth!", "Tooth"), None);
    }

    #[test]
    fn test_private_command_words() {
        let (verb, args) = private_command("ADD_FLAG alice  w");
        assert_eq!(verb, "add_flag");
        assert_eq!(args, vec!["alice", "w"]);
        assert_eq!(private_command("").0, "");
    }

    #[test]
    fn test_pick_line_substitutes_or_appends() {
        let lines = vec!["pounces on {target}!".to_string()];
        assert_eq!(pick_line(&lines, "x", "target", "bob"), "pounces on bob!");
        let lines = vec!["roars at".to_string()];
        assert_eq!(pick_line(&lines, "x", "target", "bob"), "roars at bob");
        assert_eq!(pick_line(&[], "eyes {target}", "target", "bob"), "eyes bob");
    }
}
