//! Page title lookup for URLs posted in the channel.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

/// Returned whenever a title cannot be determined.
pub const UNAVAILABLE: &str = "unavailable";

/// HTTP request timeout.
const TITLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Response bodies are only scanned up to this many bytes.
const MAX_BODY: usize = 512 * 1024;

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title regex is valid")
});

// http(s)/ftp(s) URL with a domain or dotted-quad host, optional port and path.
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:http|ftp)s?://(?:(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+(?:[a-z]{2,6}\.?|[a-z0-9-]{2,}\.?)|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})(?::\d+)?(?:/?|[/?]\S+)$",
    )
    .expect("url regex is valid")
});

/// Whether `text` is exactly one URL the title fetcher can follow.
pub fn is_url(text: &str) -> bool {
    URL.is_match(text.trim())
}

/// Pull the `<title>` text out of an HTML document, whitespace collapsed.
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE.captures(html)?.get(1)?.as_str();
    let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

/// Resolves a URL to its page title.
#[async_trait]
pub trait TitleFetcher: Send + Sync {
    /// The page title, or [`UNAVAILABLE`] on any failure.
    async fn fetch_title(&self, url: &str) -> String;
}

/// [`TitleFetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTitleFetcher {
    client: reqwest::Client,
}

impl HttpTitleFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(TITLE_TIMEOUT)
            .user_agent(concat!("irc-helper/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    async fn try_fetch(&self, url: &str) -> Result<Option<String>, reqwest::Error> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() >= MAX_BODY {
                break;
            }
        }
        Ok(extract_title(&String::from_utf8_lossy(&body)))
    }
}

impl Default for HttpTitleFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TitleFetcher for HttpTitleFetcher {
    async fn fetch_title(&self, url: &str) -> String {
        match self.try_fetch(url).await {
            Ok(Some(title)) => title,
            Ok(None) => {
                debug!(%url, "Page has no title");
                UNAVAILABLE.to_string()
            }
            Err(e) => {
                debug!(%url, error = %e, "Title fetch failed");
                UNAVAILABLE.to_string()
            }
        }
    }
}
