//! quip-core - Core library for Quip
//!
//! This crate contains the quote model, local store, dedup/merge engine,
//! outbox, and sync orchestrator shared by all Quip interfaces.

pub mod book;
pub mod error;
pub mod export;
pub mod merge;
pub mod models;
pub mod outbox;
pub mod remote;
pub mod store;
pub mod sync;
pub mod util;

pub use book::QuoteBook;
pub use error::{Error, Result};
pub use models::{Conflict, Quote, RawQuote, Resolution};
pub use sync::{SyncEngine, SyncReport, SyncState};
