//! Data models for Quip

mod conflict;
mod quote;

pub use conflict::{Conflict, Resolution};
pub use quote::{
    local_id, seed_defaults, server_id, server_push_id, Quote, RawQuote, DEFAULT_CATEGORY,
};
