//! Dragon antics: attacking, eating, spitting and the stomach.

use async_trait::async_trait;
use irc_helper_proto::Event;

use super::{Context, Handler, Outcome, addressed, pick_line};
use crate::config::fill;
use crate::error::BotResult;

/// Parse `<nick>! <verb> ...` and return the arguments if the verb matches.
fn command<'m>(ctx: &Context<'_>, event: &'m Event, expected: &str) -> Option<&'m str> {
    addressed(&event.message, ctx.nick())
        .filter(|(verb, _)| verb == expected)
        .map(|(_, args)| args)
}

/// `<nick>! attack <target>`
pub struct AttackHandler;

#[async_trait]
impl Handler for AttackHandler {
    fn name(&self) -> &'static str {
        "attack"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        let Some(target) = command(ctx, event, "attack").filter(|t| !t.is_empty()) else {
            return Ok(Outcome::NotClaimed);
        };
        let line = pick_line(
            &ctx.config.messages.attacks,
            "doesn't have a valid attack for {target}!",
            "target",
            target,
        );
        ctx.act(&line).await?;
        Ok(Outcome::Claimed)
    }
}

/// `<nick>! eat <victim>`
pub struct EatHandler;

#[async_trait]
impl Handler for EatHandler {
    fn name(&self) -> &'static str {
        "eat"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        let Some(victim) = command(ctx, event, "eat").filter(|v| !v.is_empty()) else {
            return Ok(Outcome::NotClaimed);
        };

        let messages = &ctx.config.messages;
        let text = if ctx.config.bot.is_inedible(victim) {
            fill(&messages.eat_inedible, &[("victim", victim)])
        } else {
            if !ctx.state.stomach.iter().any(|v| v == victim) {
                ctx.state.stomach.push(victim.to_owned());
            }
            fill(&messages.eat, &[("victim", victim)])
        };
        ctx.act(&text).await?;
        Ok(Outcome::Indifferent)
    }
}

/// `<nick>! spit <victim>`
pub struct SpitHandler;

#[async_trait]
impl Handler for SpitHandler {
    fn name(&self) -> &'static str {
        "spit"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        let Some(victim) = command(ctx, event, "spit").filter(|v| !v.is_empty()) else {
            return Ok(Outcome::NotClaimed);
        };

        let template = match ctx.state.stomach.iter().position(|v| v == victim) {
            Some(index) => {
                ctx.state.stomach.remove(index);
                &ctx.config.messages.spit
            }
            None => &ctx.config.messages.spit_superfluous,
        };
        let text = fill(template, &[("victim", victim)]);
        ctx.act(&text).await?;
        Ok(Outcome::Indifferent)
    }
}

/// `<nick>! stomach`
pub struct StomachHandler;

#[async_trait]
impl Handler for StomachHandler {
    fn name(&self) -> &'static str {
        "stomach"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        if command(ctx, event, "stomach").is_none() {
            return Ok(Outcome::NotClaimed);
        }

        let text = if ctx.state.stomach.is_empty() {
            ctx.config.messages.stomach_empty.clone()
        } else {
            let victims = ctx.state.stomach.join(", ");
            fill(&ctx.config.messages.stomach, &[("victims", &victims)])
        };
        ctx.act(&text).await?;
        Ok(Outcome::Indifferent)
    }
}

/// `<nick>! vomit`
pub struct VomitHandler;

#[async_trait]
impl Handler for VomitHandler {
    fn name(&self) -> &'static str {
        "vomit"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        if command(ctx, event, "vomit").is_none() {
            return Ok(Outcome::NotClaimed);
        }

        let text = if ctx.state.stomach.is_empty() {
            ctx.config.messages.vomit_superfluous.clone()
        } else {
            ctx.state.stomach.clear();
            ctx.config.messages.vomit.clone()
        };
        ctx.act(&text).await?;
        Ok(Outcome::Indifferent)
    }
}
