//! The owned quote collection: in-memory state plus its persistence handle.
//!
//! Every component that mutates quotes goes through a [`QuoteBook`] borrow;
//! there are no ambient globals. The pending conflict list lives here too,
//! so resolution survives across sync cycles until the user acts on it.

use rand::seq::IndexedRandom;

use crate::error::{Error, Result};
use crate::export::render_json_export;
use crate::merge::MergeOutcome;
use crate::models::{local_id, seed_defaults, Conflict, Quote, RawQuote, Resolution};
use crate::store::{KeyValueStore, QuoteStore};
use crate::util::now_ms;

/// The quote collection, its pending conflicts, and the durable store.
pub struct QuoteBook<S: KeyValueStore> {
    quotes: Vec<Quote>,
    conflicts: Vec<Conflict>,
    store: QuoteStore<S>,
}

impl<S: KeyValueStore> QuoteBook<S> {
    /// Load the persisted collection, falling back to the seed defaults
    /// when nothing (or nothing parseable) is stored, then persist.
    pub fn open(kv: S) -> Result<Self> {
        let store = QuoteStore::new(kv);
        let quotes = store
            .load()
            .filter(|quotes| !quotes.is_empty())
            .unwrap_or_else(seed_defaults);

        let mut book = Self {
            quotes,
            conflicts: Vec::new(),
            store,
        };
        book.save()?;
        Ok(book)
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Validate and append a locally-authored quote, persist, return it.
    pub fn add(&mut self, text: &str, category: &str) -> Result<Quote> {
        let quote = Quote::new_local(text, category);
        if !quote.is_valid() {
            return Err(Error::InvalidInput(
                "quote text and category must not be empty".to_string(),
            ));
        }

        self.quotes.push(quote.clone());
        self.save()?;
        Ok(quote)
    }

    /// Sorted distinct categories across the collection.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> =
            self.quotes.iter().map(|q| q.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Quotes matching the category filter; `None` means all.
    pub fn filtered(&self, category: Option<&str>) -> Vec<&Quote> {
        self.quotes
            .iter()
            .filter(|q| category.is_none_or(|c| q.category == c))
            .collect()
    }

    /// Random quote from the filter pool.
    pub fn pick_random(&self, category: Option<&str>) -> Option<&Quote> {
        self.filtered(category).choose(&mut rand::rng()).copied()
    }

    /// Import externally supplied records.
    ///
    /// Records missing both id and timestamp are treated as new
    /// user-authored entries (fresh id, current time, pending). Everything
    /// is normalized and validated; content duplicates of the existing
    /// collection are dropped by fingerprint. Returns the count added.
    pub fn import_values(&mut self, values: Vec<serde_json::Value>) -> Result<usize> {
        let mut seen: std::collections::HashSet<String> =
            self.quotes.iter().map(Quote::fingerprint).collect();
        let mut added = 0;

        for value in values {
            let Ok(mut raw) = serde_json::from_value::<RawQuote>(value) else {
                continue;
            };
            if raw.id.is_none() && raw.updated_at.is_none() {
                raw.id = Some(local_id());
                raw.updated_at = Some(now_ms());
                raw.pending = Some(true);
            }

            let quote = raw.normalize();
            if !quote.is_valid() {
                continue;
            }
            if seen.insert(quote.fingerprint()) {
                self.quotes.push(quote);
                added += 1;
            }
        }

        if added > 0 {
            self.save()?;
        }
        Ok(added)
    }

    /// Import a JSON array payload; parse failure leaves the collection
    /// untouched.
    pub fn import_json(&mut self, payload: &str) -> Result<usize> {
        let values: Vec<serde_json::Value> = serde_json::from_str(payload)?;
        self.import_values(values)
    }

    /// Pretty-printed JSON of the full collection, no filtering.
    pub fn export_json(&self) -> Result<String> {
        Ok(render_json_export(&self.quotes)?)
    }

    /// Replace the collection with the seed defaults and persist.
    pub fn reset_defaults(&mut self) -> Result<()> {
        self.quotes = seed_defaults();
        self.save()
    }

    /// Erase the persisted collection and preferences. The in-memory
    /// collection is left as-is; the next open reseeds.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()
    }

    pub fn last_filter(&self) -> Option<String> {
        self.store.last_filter()
    }

    pub fn set_last_filter(&mut self, filter: &str) -> Result<()> {
        self.store.set_last_filter(filter)
    }

    /// Install a merge outcome: re-normalize, persist, and replace the
    /// conflict list wholesale (previous unresolved conflicts are
    /// discarded — at most one merge's conflicts are tracked at a time).
    pub fn apply_merge(&mut self, outcome: MergeOutcome) -> Result<usize> {
        self.quotes = outcome
            .quotes
            .into_iter()
            .map(Quote::normalized)
            .collect();
        self.conflicts = outcome.conflicts;
        self.save()?;
        Ok(self.conflicts.len())
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Resolve one pending conflict.
    ///
    /// Keeping local restores the local snapshot with a fresh timestamp and
    /// re-queues it for push; keeping server finalizes the already-merged
    /// server version. The conflict is removed either way.
    pub fn resolve(&mut self, id: &str, choice: Resolution) -> Result<Quote> {
        let position = self
            .conflicts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(format!("no pending conflict for id {id}")))?;
        let conflict = self.conflicts.remove(position);

        let replacement = match choice {
            Resolution::Local => Quote {
                updated_at: now_ms(),
                pending: true,
                ..conflict.local
            },
            Resolution::Server => Quote {
                pending: false,
                ..conflict.server
            },
        };

        if let Some(slot) = self.quotes.iter_mut().find(|q| q.id == id) {
            *slot = replacement.clone();
        }
        self.save()?;
        Ok(replacement)
    }

    /// Drop all pending conflicts, leaving the merged collection as-is.
    pub fn dismiss_conflicts(&mut self) {
        self.conflicts.clear();
    }

    pub(crate) fn quotes_mut(&mut self) -> &mut Vec<Quote> {
        &mut self.quotes
    }

    pub(crate) fn save(&mut self) -> Result<()> {
        self.store.save(&self.quotes)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::merge::merge_remote;
    use crate::store::MemoryKeyValueStore;

    fn open_empty() -> QuoteBook<MemoryKeyValueStore> {
        QuoteBook::open(MemoryKeyValueStore::new()).unwrap()
    }

    #[test]
    fn open_seeds_defaults_when_store_is_empty() {
        let book = open_empty();
        assert_eq!(book.len(), 3);
        assert!(book.categories().contains(&"Motivation".to_string()));
    }

    #[test]
    fn open_reuses_persisted_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quip.db");

        {
            let kv = crate::store::SqliteKeyValueStore::open(&path).unwrap();
            let mut book = QuoteBook::open(kv).unwrap();
            book.add("persisted", "Cat").unwrap();
        }

        let kv = crate::store::SqliteKeyValueStore::open(&path).unwrap();
        let book = QuoteBook::open(kv).unwrap();
        assert_eq!(book.len(), 4);
        assert!(book.quotes().iter().any(|q| q.text == "persisted"));
    }

    #[test]
    fn add_validates_and_persists() {
        let mut book = open_empty();
        let before = book.len();

        let quote = book.add("  brand   new  ", "Fresh").unwrap();
        assert_eq!(quote.text, "brand new");
        assert!(quote.pending);
        assert_eq!(book.len(), before + 1);

        assert!(matches!(
            book.add("   ", "Fresh"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(book.add("text", " "), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn categories_are_sorted_and_deduped() {
        let mut book = open_empty();
        book.add("a", "Zed").unwrap();
        book.add("b", "Zed").unwrap();

        let categories = book.categories();
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);
        assert_eq!(
            categories.iter().filter(|c| c.as_str() == "Zed").count(),
            1
        );
    }

    #[test]
    fn filtered_respects_category() {
        let mut book = open_empty();
        book.add("only one", "Unique").unwrap();

        assert_eq!(book.filtered(Some("Unique")).len(), 1);
        assert_eq!(book.filtered(None).len(), book.len());
        assert!(book.filtered(Some("Missing")).is_empty());
    }

    #[test]
    fn pick_random_draws_from_filter_pool() {
        let mut book = open_empty();
        book.add("target", "Solo").unwrap();

        let picked = book.pick_random(Some("Solo")).unwrap();
        assert_eq!(picked.text, "target");
        assert!(book.pick_random(Some("Missing")).is_none());
        assert!(book.pick_random(None).is_some());
    }

    #[test]
    fn import_treats_bare_records_as_new_entries() {
        let mut book = open_empty();
        let added = book
            .import_json(r#"[{"text":"New quote","category":"Cat"}]"#)
            .unwrap();
        assert_eq!(added, 1);

        let imported = book
            .quotes()
            .iter()
            .find(|q| q.text == "New quote")
            .unwrap();
        assert!(imported.pending);
        assert!(imported.id.starts_with("local-"));
        assert!(imported.updated_at > 0);
    }

    #[test]
    fn import_dedups_by_fingerprint() {
        let mut book = open_empty();
        let existing = book.quotes()[0].clone();

        let payload = serde_json::to_string(&vec![RawQuote::from(existing)]).unwrap();
        let added = book.import_json(&payload).unwrap();
        assert_eq!(added, 0);
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn import_skips_malformed_and_invalid_items() {
        let mut book = open_empty();
        let added = book
            .import_json(
                r#"[
                    42,
                    {"text":"   ","category":"Cat"},
                    {"text":"kept","category":"Cat"}
                ]"#,
            )
            .unwrap();
        assert_eq!(added, 1);
    }

    #[test]
    fn import_rejects_non_array_payload() {
        let mut book = open_empty();
        let before = book.len();

        assert!(matches!(
            book.import_json("{\"nope\":1}"),
            Err(Error::Serialization(_))
        ));
        assert_eq!(book.len(), before);
    }

    #[test]
    fn export_is_pretty_printed_and_complete() {
        let book = open_empty();
        let exported = book.export_json().unwrap();
        assert!(exported.contains("\n"));
        assert!(exported.contains("updatedAt"));

        let parsed: Vec<Quote> = serde_json::from_str(&exported).unwrap();
        assert_eq!(parsed.len(), book.len());
    }

    #[test]
    fn reset_defaults_replaces_collection() {
        let mut book = open_empty();
        book.add("extra", "Cat").unwrap();
        assert_eq!(book.len(), 4);

        book.reset_defaults().unwrap();
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn resolve_keep_local_restores_and_requeues() {
        let mut book = open_empty();
        book.add("A", "X").unwrap();
        let id = book.quotes().last().unwrap().id.clone();

        let mut server = book.quotes().last().unwrap().clone();
        server.text = "B".to_string();
        server.pending = false;

        let outcome = merge_remote(book.quotes(), &[server]);
        book.apply_merge(outcome).unwrap();
        assert!(book.has_conflicts());
        assert_eq!(
            book.quotes().iter().find(|q| q.id == id).unwrap().text,
            "B"
        );

        let restored = book.resolve(&id, Resolution::Local).unwrap();
        assert_eq!(restored.text, "A");
        assert!(restored.pending);
        assert!(!book.has_conflicts());
        assert_eq!(
            book.quotes().iter().find(|q| q.id == id).unwrap().text,
            "A"
        );
    }

    #[test]
    fn resolve_keep_server_finalizes_merged_version() {
        let mut book = open_empty();
        book.add("A", "X").unwrap();
        let id = book.quotes().last().unwrap().id.clone();

        let mut server = book.quotes().last().unwrap().clone();
        server.text = "B".to_string();

        let outcome = merge_remote(book.quotes(), &[server]);
        book.apply_merge(outcome).unwrap();

        let kept = book.resolve(&id, Resolution::Server).unwrap();
        assert_eq!(kept.text, "B");
        assert!(!kept.pending);
        assert!(!book.has_conflicts());
    }

    #[test]
    fn resolve_unknown_id_is_not_found() {
        let mut book = open_empty();
        assert!(matches!(
            book.resolve("missing", Resolution::Local),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn dismiss_conflicts_clears_the_queue() {
        let mut book = open_empty();
        book.add("A", "X").unwrap();
        let mut server = book.quotes().last().unwrap().clone();
        server.text = "B".to_string();

        let outcome = merge_remote(book.quotes(), &[server]);
        book.apply_merge(outcome).unwrap();
        assert!(book.has_conflicts());

        book.dismiss_conflicts();
        assert!(!book.has_conflicts());
    }

    #[test]
    fn last_filter_round_trips() {
        let mut book = open_empty();
        assert!(book.last_filter().is_none());
        book.set_last_filter("Life").unwrap();
        assert_eq!(book.last_filter().unwrap(), "Life");
    }
}
