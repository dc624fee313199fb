//! Quote collection persistence and session-scoped display state.

use super::{
    KeyValueStore, LAST_CATEGORY_KEY, LAST_FILTER_KEY, LAST_QUOTE_KEY, QUOTES_KEY,
};
use crate::error::Result;
use crate::models::{Quote, RawQuote};

/// Persists the full quote collection as one serialized blob, plus the
/// last-selected filter preference.
pub struct QuoteStore<S> {
    kv: S,
}

impl<S: KeyValueStore> QuoteStore<S> {
    pub const fn new(kv: S) -> Self {
        Self { kv }
    }

    /// Load the persisted collection.
    ///
    /// Returns `None` when no prior data exists or the blob does not parse
    /// as an array; malformed entries inside a well-formed array are
    /// skipped. Never errors — callers fall back to the seeded defaults.
    pub fn load(&self) -> Option<Vec<Quote>> {
        let raw = self.kv.get(QUOTES_KEY).ok().flatten()?;
        let entries: Vec<serde_json::Value> = serde_json::from_str(&raw).ok()?;

        let quotes = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value::<RawQuote>(entry).ok())
            .map(RawQuote::normalize)
            .filter(Quote::is_valid)
            .collect();
        Some(quotes)
    }

    /// Persist the full collection (whole-blob overwrite).
    pub fn save(&mut self, quotes: &[Quote]) -> Result<()> {
        let blob = serde_json::to_string(quotes)?;
        self.kv.set(QUOTES_KEY, &blob)
    }

    /// Erase the persisted collection and the filter preference.
    pub fn clear(&mut self) -> Result<()> {
        self.kv.remove(QUOTES_KEY)?;
        self.kv.remove(LAST_FILTER_KEY)
    }

    /// Last category filter the user selected, if any.
    pub fn last_filter(&self) -> Option<String> {
        self.kv.get(LAST_FILTER_KEY).ok().flatten()
    }

    pub fn set_last_filter(&mut self, filter: &str) -> Result<()> {
        self.kv.set(LAST_FILTER_KEY, filter)
    }
}

/// Per-run display state: last shown quote and last selected category.
pub struct SessionState<S> {
    kv: S,
}

impl<S: KeyValueStore> SessionState<S> {
    pub const fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn last_quote(&self) -> Option<Quote> {
        let raw = self.kv.get(LAST_QUOTE_KEY).ok().flatten()?;
        let quote: Quote = serde_json::from_str(&raw).ok()?;
        quote.is_valid().then_some(quote)
    }

    pub fn set_last_quote(&mut self, quote: &Quote) -> Result<()> {
        self.kv.set(LAST_QUOTE_KEY, &serde_json::to_string(quote)?)
    }

    pub fn last_category(&self) -> Option<String> {
        self.kv.get(LAST_CATEGORY_KEY).ok().flatten()
    }

    pub fn set_last_category(&mut self, category: &str) -> Result<()> {
        self.kv.set(LAST_CATEGORY_KEY, category)
    }
}
