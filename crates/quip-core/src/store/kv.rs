//! Key-value storage trait and the in-memory (session-scoped) backend.

use std::collections::HashMap;

use crate::error::Result;

/// Durable key for the serialized quote collection.
pub const QUOTES_KEY: &str = "quip.quotes.v1";
/// Durable key for the last-selected category filter.
pub const LAST_FILTER_KEY: &str = "quip.last_filter.v1";
/// Session key for the last-displayed quote.
pub const LAST_QUOTE_KEY: &str = "quip.last_quote.v1";
/// Session key for the last-selected display category.
pub const LAST_CATEGORY_KEY: &str = "quip.last_category.v1";

/// String key-value storage.
///
/// Implemented durably by [`super::SqliteKeyValueStore`] and ephemerally by
/// [`MemoryKeyValueStore`].
pub trait KeyValueStore {
    /// Read a value, `None` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, overwriting any previous one
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a key; deleting an absent key is a no-op
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store scoped to a single run. Used for session state and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
