//! Remote data source: a JSONPlaceholder-style posts API.

use serde::Deserialize;

use crate::error::Result;
use crate::models::{server_id, Quote, RawQuote};
use crate::util::now_ms;

/// Default remote endpoint.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Category assigned to records fetched from the remote source.
pub const SERVER_CATEGORY: &str = "Server";

/// Acknowledgement returned by a remote write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAck {
    /// Identifier the remote assigned, when it returned one
    pub id: Option<i64>,
}

/// Abstract remote source the sync engine talks to.
#[allow(async_fn_in_trait)]
pub trait QuoteRemote {
    /// Fetch up to `limit` records mapped into quotes.
    async fn fetch_quotes(&self, limit: usize) -> Result<Vec<Quote>>;

    /// Create a remote record; the ack id mints the local record's new id.
    async fn push_quote(&self, category: &str, text: &str, updated_at: i64) -> Result<RemoteAck>;
}

/// HTTP implementation over `reqwest`.
#[derive(Clone)]
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::builder().build()?,
        })
    }
}

impl QuoteRemote for HttpRemote {
    async fn fetch_quotes(&self, limit: usize) -> Result<Vec<Quote>> {
        let url = format!("{}/posts?_limit={limit}", self.base_url);
        let posts: Vec<Post> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(count = posts.len(), "fetched remote snapshot");

        // Synthesized descending timestamps give remote records a
        // deterministic relative order: first result newest.
        let now = now_ms();
        let quotes = posts
            .iter()
            .enumerate()
            .map(|(index, post)| map_post(post, now - (index as i64) * 1000))
            .filter(Quote::is_valid)
            .collect();
        Ok(quotes)
    }

    async fn push_quote(&self, category: &str, text: &str, updated_at: i64) -> Result<RemoteAck> {
        let url = format!("{}/posts", self.base_url);
        let response: PushResponse = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "title": category,
                "body": text,
                "updatedAt": updated_at,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(RemoteAck { id: response.id })
    }
}

#[derive(Debug, Deserialize)]
struct Post {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    #[serde(default)]
    id: Option<i64>,
}

fn map_post(post: &Post, updated_at: i64) -> Quote {
    let text = post
        .body
        .clone()
        .filter(|body| !body.trim().is_empty())
        .or_else(|| post.title.clone())
        .unwrap_or_default();

    RawQuote {
        id: Some(server_id(post.id)),
        text: Some(text),
        category: Some(SERVER_CATEGORY.to_string()),
        updated_at: Some(updated_at),
        pending: Some(false),
    }
    .normalize()
}
