//! Announce the title of a URL posted on its own.

use async_trait::async_trait;
use irc_helper_proto::Event;

use super::{Context, Handler, Outcome};
use crate::config::fill;
use crate::error::BotResult;
use crate::title::is_url;

pub struct UrlTitleHandler;

#[async_trait]
impl Handler for UrlTitleHandler {
    fn name(&self) -> &'static str {
        "url_title"
    }

    async fn try_handle(&self, ctx: &mut Context<'_>, event: &Event) -> BotResult<Outcome> {
        let url = event.message.trim();
        if !is_url(url) {
            return Ok(Outcome::NotClaimed);
        }

        // Awaited inline so the announcement precedes replies to later lines.
        let title = ctx.titles.fetch_title(url).await;
        let text = fill(&ctx.config.messages.urltitle, &[("title", &title)]);
        ctx.act(&text).await?;
        Ok(Outcome::Indifferent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::Harness;

    #[tokio::test]
    async fn test_announces_title() {
        let mut h = Harness::new().await;
        let event = Event::parse(":bob!b@h PRIVMSG #room :https://example.com/dragons");
        let outcome = UrlTitleHandler.try_handle(&mut h.ctx(), &event).await.unwrap();
        assert_eq!(outcome, Outcome::Indifferent);
        assert_eq!(
            h.sent().await,
            vec!["PRIVMSG #room :\x01ACTION finds the URL title to be: \x02\"How to Train Your Dragon\"\x01"]
        );
    }

    #[tokio::test]
    async fn test_ignores_text_around_url() {
        let mut h = Harness::new().await;
        let event = Event::parse(":bob!b@h PRIVMSG #room :look https://example.com");
        let outcome = UrlTitleHandler.try_handle(&mut h.ctx(), &event).await.unwrap();
        assert_eq!(outcome, Outcome::NotClaimed);
        assert!(h.sent().await.is_empty());
    }
}
