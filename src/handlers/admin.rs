//! Private administrative commands.
//!
//! Everything here except `list_commands` requires the admin flag. Non-admins
//! are told off with the `deny_command` message and the event is claimed.

use async_trait::async_trait;
use irc_helper_proto::{Event, casemap};
use tracing::{info, warn};

use super::{Context, Handler, Outcome, private_command};
use crate::config::{Config, fill};
use crate::error::BotResult;

/// Reply with `deny_command` unless `sender` is an admin.
pub(super) async fn require_admin(ctx: &mut Context<'_>, sender: &str) -> BotResult<bool> {
    if ctx.is_admin(sender).await? {
        return Ok(true);
    }
    info!(%sender, "Denied admin command");
    let text = ctx.config.messages.deny_command.clone();
    ctx.act_to(sender, &text).await?;
    Ok(false)
}

/// `list_commands`: every learned rule, one message each.
pub struct ListCommandsHandler;

#[async_trait]
impl Handler for ListCommandsHandler {
    fn name(&self) -> &'static str {
        "list_commands"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        if private_command(&event.message).0 != "list_commands" {
            return Ok(Outcome::NotClaimed);
        }

        let sender = event.sender.as_str();
        let rules = ctx.triggers.rules().await?;
        if rules.is_empty() {
            let text = ctx.config.messages.list_commands_empty.clone();
            ctx.act_to(sender, &text).await?;
        }
        for rule in rules {
            let line = fill(
                &ctx.config.messages.print_command,
                &[("trigger", &rule.pattern), ("response", &rule.response)],
            );
            ctx.conn.send(&line, Some(sender)).await?;
        }
        Ok(Outcome::Claimed)
    }
}

/// `purge_commands`: forget every rule.
pub struct PurgeCommandsHandler;

#[async_trait]
impl Handler for PurgeCommandsHandler {
    fn name(&self) -> &'static str {
        "purge_commands"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        if private_command(&event.message).0 != "purge_commands" {
            return Ok(Outcome::NotClaimed);
        }
        let sender = event.sender.as_str();
        if !require_admin(ctx, sender).await? {
            return Ok(Outcome::Claimed);
        }

        let removed = ctx.triggers.purge().await?;
        info!(removed, by = %sender, "Purged triggers");
        let text = if removed == 0 {
            ctx.config.messages.purge_commands_superfluous.clone()
        } else {
            ctx.config.messages.purge_commands.clone()
        };
        ctx.act_to(sender, &text).await?;
        Ok(Outcome::Claimed)
    }
}

/// `append_whitelist <nick>...`
pub struct AppendWhitelistHandler;

#[async_trait]
impl Handler for AppendWhitelistHandler {
    fn name(&self) -> &'static str {
        "append_whitelist"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        let (verb, users) = private_command(&event.message);
        if verb != "append_whitelist" || users.is_empty() {
            return Ok(Outcome::NotClaimed);
        }
        let sender = event.sender.as_str();
        if !require_admin(ctx, sender).await? {
            return Ok(Outcome::Claimed);
        }

        for user in &users {
            ctx.permissions.add_flag(user, "whitelist").await?;
        }
        let users = users.join(", ");
        info!(%users, by = %sender, "Whitelisted");
        let text = fill(&ctx.config.messages.whitelisted, &[("users", &users)]);
        ctx.act_to(sender, &text).await?;
        Ok(Outcome::Claimed)
    }
}

/// `move_channel <#channel>`: part the current channel and join another.
pub struct MoveChannelHandler;

#[async_trait]
impl Handler for MoveChannelHandler {
    fn name(&self) -> &'static str {
        "move_channel"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        let (verb, args) = private_command(&event.message);
        let Some(channel) = args.first().filter(|_| verb == "move_channel") else {
            return Ok(Outcome::NotClaimed);
        };
        if !channel.starts_with(['#', '&']) {
            return Ok(Outcome::NotClaimed);
        }
        if !require_admin(ctx, &event.sender).await? {
            return Ok(Outcome::Claimed);
        }

        let channel = casemap::fold(channel);
        let reason = ctx.config.messages.switch_channel.clone();
        ctx.conn.leave_channel(Some(&reason)).await?;
        ctx.join_and_announce(&channel).await?;
        Ok(Outcome::Claimed)
    }
}

/// `reload_config`: re-read `[bot]` and `[messages]` from disk and grant the
/// admin flag to any newly listed admins.
pub struct ReloadConfigHandler;

#[async_trait]
impl Handler for ReloadConfigHandler {
    fn name(&self) -> &'static str {
        "reload_config"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        if private_command(&event.message).0 != "reload_config" {
            return Ok(Outcome::NotClaimed);
        }
        let sender = event.sender.as_str();
        if !require_admin(ctx, sender).await? {
            return Ok(Outcome::Claimed);
        }

        let loaded = match ctx.state.config_path.as_deref() {
            Some(path) => Config::load_validated_async(path)
                .await
                .map_err(|e| e.to_string()),
            None => Err("no config file".to_string()),
        };
        let text = match loaded {
            Ok(fresh) => {
                ctx.permissions.grant_admins(&fresh.bot.admins).await?;
                ctx.config.bot = fresh.bot;
                ctx.config.messages = fresh.messages;
                info!(by = %sender, "Config reloaded");
                ctx.config.messages.config_reloaded.clone()
            }
            Err(error) => {
                warn!(%error, "Config reload failed");
                ctx.config.messages.config_reload_failed.clone()
            }
        };
        ctx.act_to(sender, &text).await?;
        Ok(Outcome::Claimed)
    }
}

/// `terminate`: end the session cleanly.
pub struct TerminateHandler;

#[async_trait]
impl Handler for TerminateHandler {
    fn name(&self) -> &'static str {
        "terminate"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        if private_command(&event.message).0 != "terminate" {
            return Ok(Outcome::NotClaimed);
        }
        if !require_admin(ctx, &event.sender).await? {
            return Ok(Outcome::Claimed);
        }
        info!(by = %event.sender, "Termination requested");
        ctx.state.shutdown_requested = true;
        Ok(Outcome::Claimed)
    }
}
