//! Ordered handler lists and dispatch.

use std::sync::Arc;

use irc_helper_proto::{Event, casemap};
use tracing::{Instrument, debug, warn};

use super::{Context, Handler, Outcome, Scope};
use crate::error::BotResult;
use crate::telemetry::spans;

/// Two ordered handler lists, one per scope.
#[derive(Default)]
pub struct CommandRouter {
    channel: Vec<Arc<dyn Handler>>,
    private: Vec<Arc<dyn Handler>>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list(s) for `scope`. Duplicates are kept.
    pub fn register<H: Handler + 'static>(&mut self, handler: H, scope: Scope) {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        match scope {
            Scope::Channel => self.channel.push(handler),
            Scope::Private => self.private.push(handler),
            Scope::Both => {
                self.channel.push(Arc::clone(&handler));
                self.private.push(handler);
            }
        }
    }

    /// Number of handlers in (channel, private).
    pub fn len(&self) -> (usize, usize) {
        (self.channel.len(), self.private.len())
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty() && self.private.is_empty()
    }

    /// Which list `event` is routed to, if any.
    pub fn scope_for(&self, ctx: &Context<'_>, event: &Event) -> Option<Scope> {
        let session = ctx.conn.session();
        if session
            .current_channel
            .as_deref()
            .is_some_and(|c| casemap::eq(c, &event.recipient))
        {
            Some(Scope::Channel)
        } else if casemap::eq(&session.nickname, &event.recipient) {
            Some(Scope::Private)
        } else {
            None
        }
    }

    /// Offer `event` to the matching handlers in registration order.
    ///
    /// Returns `Claimed` if a handler claimed it, otherwise `Indifferent` if
    /// any handler reported so, otherwise `NotClaimed`. A handler failure that
    /// is not fatal is logged and counts as `NotClaimed`; fatal errors end
    /// dispatch and propagate.
    pub async fn dispatch(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        let handlers = match self.scope_for(ctx, event) {
            Some(Scope::Channel) => &self.channel,
            Some(Scope::Private) => &self.private,
            _ => return Ok(Outcome::NotClaimed),
        };

        let mut outcome = Outcome::NotClaimed;
        for handler in handlers {
            let span = spans::handler(handler.name(), &event.sender, &event.recipient);
            match handler.try_handle(ctx, event).instrument(span).await {
                Ok(Outcome::Claimed) => {
                    debug!(handler = handler.name(), "Claimed");
                    return Ok(Outcome::Claimed);
                }
                Ok(Outcome::Indifferent) => outcome = Outcome::Indifferent,
                Ok(Outcome::NotClaimed) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(
                        handler = handler.name(),
                        code = e.error_code(),
                        error = %e,
                        "Handler failed"
                    );
                }
            }
        }
        Ok(outcome)
    }
}
