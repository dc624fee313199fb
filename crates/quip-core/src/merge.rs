//! Dedup/merge engine: reconcile the local collection with a remote snapshot.
//!
//! Pure logic, no I/O. The caller persists the merged collection and takes
//! ownership of the conflict list.

use std::collections::{HashMap, HashSet};

use crate::models::{Conflict, Quote};

/// Result of one merge pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Updated collection, insertion order preserved
    pub quotes: Vec<Quote>,
    /// One entry per shared id whose fields diverged
    pub conflicts: Vec<Conflict>,
}

/// Merge a remote snapshot into the local collection.
///
/// Shared ids with any field difference take the server version immediately
/// (server wins by default) and record a conflict for later user override.
/// Unknown ids are appended unless an existing record already carries the
/// same content fingerprint, which prevents duplicate display of identical
/// text+category pairs re-imported under a different id.
#[must_use]
pub fn merge_remote(local: &[Quote], remote: &[Quote]) -> MergeOutcome {
    let by_id: HashMap<&str, &Quote> = local.iter().map(|q| (q.id.as_str(), q)).collect();

    let mut merged: Vec<Quote> = local.to_vec();
    let mut fingerprints: HashSet<String> = merged.iter().map(Quote::fingerprint).collect();
    let mut conflicts = Vec::new();

    for server in remote {
        if let Some(&local_snapshot) = by_id.get(server.id.as_str()) {
            if local_snapshot == server {
                continue;
            }
            if let Some(slot) = merged.iter_mut().find(|q| q.id == server.id) {
                *slot = server.clone();
                conflicts.push(Conflict::new(local_snapshot.clone(), server.clone()));
            }
        } else {
            let fingerprint = server.fingerprint();
            if fingerprints.insert(fingerprint) {
                merged.push(server.clone());
            }
        }
    }

    MergeOutcome {
        quotes: merged,
        conflicts,
    }
}
