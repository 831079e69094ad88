//! Teaching and forgetting triggers from the channel.
//!
//! `<nick>! learn <pattern> -> <response>` and `<nick>! forget <pattern>`,
//! both restricted to whitelisted users and admins.

use async_trait::async_trait;
use irc_helper_proto::Event;
use tracing::info;

use super::{Context, Handler, Outcome, addressed};
use crate::config::fill;
use crate::error::{BotError, BotResult};

pub struct LearnHandler;

#[async_trait]
impl Handler for LearnHandler {
    fn name(&self) -> &'static str {
        "learn"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        let Some((verb, args)) = addressed(&event.message, ctx.nick()) else {
            return Ok(Outcome::NotClaimed);
        };
        if verb != "learn" {
            return Ok(Outcome::NotClaimed);
        }
        let Some((pattern, response)) = args.split_once(" -> ") else {
            return Ok(Outcome::NotClaimed);
        };

        let sender = event.sender.as_str();
        if !ctx.is_trainer(sender).await? {
            let text = fill(&ctx.config.messages.learn_deny, &[("nick", sender)]);
            ctx.act(&text).await?;
            return Ok(Outcome::Claimed);
        }

        let template = match ctx.triggers.learn(pattern, response, Some(sender)).await {
            Ok(true) => {
                info!(%pattern, %response, by = %sender, "Learned trigger");
                &ctx.config.messages.learn
            }
            Ok(false) => &ctx.config.messages.learn_superfluous,
            Err(BotError::InvalidPattern { .. }) => &ctx.config.messages.learn_error,
            Err(e) => return Err(e),
        };
        let text = fill(template, &[("nick", sender)]);
        ctx.act(&text).await?;
        Ok(Outcome::Claimed)
    }
}

pub struct ForgetHandler;

#[async_trait]
impl Handler for ForgetHandler {
    fn name(&self) -> &'static str {
        "forget"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        let Some((verb, pattern)) = addressed(&event.message, ctx.nick()) else {
            return Ok(Outcome::NotClaimed);
        };
        if verb != "forget" || pattern.is_empty() {
            return Ok(Outcome::NotClaimed);
        }

        let sender = event.sender.as_str();
        if !ctx.is_trainer(sender).await? {
            return Ok(Outcome::NotClaimed);
        }

        let template = if ctx.triggers.forget(pattern).await? > 0 {
            info!(%pattern, by = %sender, "Forgot trigger");
            &ctx.config.messages.forget
        } else {
            &ctx.config.messages.forget_superfluous
        };
        let text = fill(template, &[("nick", sender)]);
        ctx.act(&text).await?;
        Ok(Outcome::Claimed)
    }
}
