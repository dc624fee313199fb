//! Quote model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::{collapse_whitespace, now_ms};

/// Category substituted when a record arrives without one.
pub const DEFAULT_CATEGORY: &str = "General";

const LOCAL_ID_PREFIX: &str = "local-";
const SERVER_ID_PREFIX: &str = "server-";

/// A quote in the collection.
///
/// Serializes camelCase (`updatedAt`) so exports stay compatible with
/// previously exported files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Unique identifier; the prefix marks provenance (`local-` / `server-`)
    pub id: String,
    /// Quote text, trimmed and whitespace-collapsed
    pub text: String,
    /// Category, trimmed and whitespace-collapsed
    pub category: String,
    /// Last local modification time (Unix ms)
    pub updated_at: i64,
    /// Created or edited locally, not yet acknowledged by the remote source
    pub pending: bool,
}

impl Quote {
    /// Create a new locally-authored quote, marked pending for the next push.
    #[must_use]
    pub fn new_local(text: impl Into<String>, category: impl Into<String>) -> Self {
        RawQuote {
            id: None,
            text: Some(text.into()),
            category: Some(category.into()),
            updated_at: Some(now_ms()),
            pending: Some(true),
        }
        .normalize()
    }

    /// Check that text and category are non-empty after trimming.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.text.trim().is_empty() && !self.category.trim().is_empty()
    }

    /// Content-based identity used for id-independent deduplication.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        format!(
            "{}::{}",
            self.text.trim().to_lowercase(),
            self.category.trim().to_lowercase()
        )
    }

    /// Re-run normalization on an already-built quote.
    #[must_use]
    pub fn normalized(self) -> Self {
        RawQuote::from(self).normalize()
    }
}

/// Mint an id for a locally-created record.
#[must_use]
pub fn local_id() -> String {
    format!("{LOCAL_ID_PREFIX}{}", Uuid::now_v7())
}

/// Id for a record fetched from the remote source.
#[must_use]
pub fn server_id(remote_id: i64) -> String {
    format!("{SERVER_ID_PREFIX}{remote_id}")
}

/// Id minted after a successful push, from the remote acknowledgement.
///
/// The uuid suffix keeps ids unique even when the remote hands out the same
/// identifier for every write (placeholder APIs do).
#[must_use]
pub fn server_push_id(ack_id: Option<i64>) -> String {
    match ack_id {
        Some(id) => format!("{SERVER_ID_PREFIX}{id}-{}", Uuid::now_v7()),
        None => format!("{SERVER_ID_PREFIX}{}", Uuid::now_v7()),
    }
}

/// Loosely-typed quote shape accepted from persisted blobs and import files.
///
/// All fields are optional; [`RawQuote::normalize`] fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawQuote {
    pub id: Option<String>,
    pub text: Option<String>,
    pub category: Option<String>,
    pub updated_at: Option<i64>,
    pub pending: Option<bool>,
}

impl RawQuote {
    /// Build a well-formed [`Quote`]: fresh id when missing, whitespace
    /// collapsed, default category for blanks, current time for a missing
    /// timestamp. Idempotent aside from regenerating missing id/timestamp.
    #[must_use]
    pub fn normalize(self) -> Quote {
        let category = collapse_whitespace(self.category.as_deref().unwrap_or(DEFAULT_CATEGORY));

        Quote {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(local_id),
            text: collapse_whitespace(self.text.as_deref().unwrap_or("")),
            category: if category.is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category
            },
            updated_at: self.updated_at.unwrap_or_else(now_ms),
            pending: self.pending.unwrap_or(false),
        }
    }
}

impl From<Quote> for RawQuote {
    fn from(quote: Quote) -> Self {
        Self {
            id: Some(quote.id),
            text: Some(quote.text),
            category: Some(quote.category),
            updated_at: Some(quote.updated_at),
            pending: Some(quote.pending),
        }
    }
}

/// Starter collection used when no persisted data exists.
#[must_use]
pub fn seed_defaults() -> Vec<Quote> {
    let now = now_ms();
    [
        (
            "The best way to get started is to quit talking and begin doing.",
            "Motivation",
            now - 10_000,
        ),
        (
            "Life is what happens when you're busy making other plans.",
            "Life",
            now - 9_000,
        ),
        (
            "Code is like humor. When you have to explain it, it's bad.",
            "Programming",
            now - 8_000,
        ),
    ]
    .into_iter()
    .map(|(text, category, updated_at)| Quote {
        id: local_id(),
        text: text.to_string(),
        category: category.to_string(),
        updated_at,
        pending: false,
    })
    .collect()
}
