//! Outbox: push locally-created records to the remote source.

use crate::models::{server_push_id, Quote};
use crate::remote::QuoteRemote;
use crate::util::now_ms;

/// Push every pending record once.
///
/// Works from a snapshot of the pending set taken at cycle start; records
/// that become pending during the pass wait for the next cycle. A failed
/// push leaves its record untouched (still pending) and the batch
/// continues. Returns the records that were successfully pushed; the
/// caller persists once if the list is non-empty.
pub async fn push_pending<R: QuoteRemote>(quotes: &mut Vec<Quote>, remote: &R) -> Vec<Quote> {
    let pending: Vec<Quote> = quotes.iter().filter(|q| q.pending).cloned().collect();
    if pending.is_empty() {
        return Vec::new();
    }

    let mut pushed = Vec::new();
    for quote in pending {
        match remote
            .push_quote(&quote.category, &quote.text, quote.updated_at)
            .await
        {
            Ok(ack) => {
                if let Some(slot) = quotes.iter_mut().find(|q| q.id == quote.id) {
                    slot.id = server_push_id(ack.id);
                    slot.pending = false;
                    slot.updated_at = now_ms();
                    pushed.push(slot.clone());
                }
            }
            Err(error) => {
                tracing::warn!(id = %quote.id, %error, "push failed; record stays pending");
            }
        }
    }

    tracing::debug!(pushed = pushed.len(), "outbox pass finished");
    pushed
}
