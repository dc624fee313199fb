//! Storage layer for Quip

mod kv;
mod quotes;
mod sqlite;

pub use kv::{
    KeyValueStore, MemoryKeyValueStore, LAST_CATEGORY_KEY, LAST_FILTER_KEY, LAST_QUOTE_KEY,
    QUOTES_KEY,
};
pub use quotes::{QuoteStore, SessionState};
pub use sqlite::SqliteKeyValueStore;
