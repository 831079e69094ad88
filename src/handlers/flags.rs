//! `add_flag <user> <flag>` and `remove_flag <user> <flag>`.

use async_trait::async_trait;
use irc_helper_proto::Event;
use tracing::info;

use super::admin::require_admin;
use super::{Context, Handler, Outcome, private_command};
use crate::config::fill;
use crate::error::{BotError, BotResult};
use crate::permissions::Flag;

#[derive(Clone, Copy)]
enum Change {
    Add,
    Remove,
}

async fn change_flag(
    ctx: &mut Context<'_>,
    event: &Event,
    verb: &str,
    change: Change,
) -> BotResult<Outcome> {
    let (command, args) = private_command(&event.message);
    if command != verb {
        return Ok(Outcome::NotClaimed);
    }
    let sender = event.sender.as_str();
    if !require_admin(ctx, sender).await? {
        return Ok(Outcome::Claimed);
    }

    let [user, flag] = args[..] else {
        let text = ctx.config.messages.unknown_flag.clone();
        ctx.act_to(sender, &text).await?;
        return Ok(Outcome::Claimed);
    };

    let result = match change {
        Change::Add => ctx.permissions.add_flag(user, flag).await,
        Change::Remove => ctx.permissions.remove_flag(user, flag).await,
    };
    let text = match result {
        Ok(flags) => {
            let name = flag.parse::<Flag>().map_or(flag, |f| f.name());
            let template = match change {
                Change::Add => &ctx.config.messages.flag_added,
                Change::Remove => &ctx.config.messages.flag_removed,
            };
            info!(%user, flag = %name, %flags, by = %sender, "Flags changed");
            fill(
                template,
                &[("flag", name), ("user", user), ("flags", &flags.to_string())],
            )
        }
        Err(BotError::UnknownFlag(_)) => ctx.config.messages.unknown_flag.clone(),
        Err(e) => return Err(e),
    };
    ctx.act_to(sender, &text).await?;
    Ok(Outcome::Claimed)
}

pub struct AddFlagHandler;

#[async_trait]
impl Handler for AddFlagHandler {
    fn name(&self) -> &'static str {
        "add_flag"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        change_flag(ctx, event, "add_flag", Change::Add).await
    }
}

pub struct RemoveFlagHandler;

#[async_trait]
impl Handler for RemoveFlagHandler {
    fn name(&self) -> &'static str {
        "remove_flag"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        change_flag(ctx, event, "remove_flag", Change::Remove).await
    }
}
