//! Sync orchestrator: drives the push → fetch → merge cycle.

use crate::error::Result;
use crate::merge::merge_remote;
use crate::outbox::push_pending;
use crate::remote::QuoteRemote;
use crate::store::KeyValueStore;
use crate::QuoteBook;

/// Default number of remote records fetched per cycle.
pub const DEFAULT_FETCH_LIMIT: usize = 20;

/// Where the engine stands after the most recent cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// No sync has run yet, or the engine is between cycles
    #[default]
    Idle,
    /// A cycle is in flight
    Syncing,
    /// Last cycle completed without conflicts
    Synced,
    /// Last cycle completed and left this many conflicts pending
    SyncedWithConflicts(usize),
    /// Last cycle aborted (fetch or persistence failure)
    Failed,
}

impl SyncState {
    /// User-facing status line.
    #[must_use]
    pub fn status_text(self) -> String {
        match self {
            Self::Idle => "Idle".to_string(),
            Self::Syncing => "Syncing...".to_string(),
            Self::Synced => "Synced".to_string(),
            Self::SyncedWithConflicts(count) => format!("Synced with {count} conflict(s)"),
            Self::Failed => "Sync failed".to_string(),
        }
    }
}

/// What one sync trigger accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReport {
    /// Full cycle ran
    Completed {
        /// Pending records successfully pushed
        pushed: usize,
        /// Conflicts awaiting resolution after the merge
        conflicts: usize,
    },
    /// A cycle was already in flight; this trigger was coalesced
    Skipped,
}

/// Drives sync cycles against one remote source.
///
/// One engine, one logical flow of control: a trigger that lands while a
/// cycle is in flight is coalesced into it rather than queued, so
/// overlapping cycles can never interleave writes to the store.
pub struct SyncEngine<R> {
    remote: R,
    fetch_limit: usize,
    state: SyncState,
    in_flight: bool,
}

impl<R: QuoteRemote> SyncEngine<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            state: SyncState::Idle,
            in_flight: false,
        }
    }

    #[must_use]
    pub const fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = limit;
        self
    }

    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// Run one cycle: push pending records, fetch the remote snapshot,
    /// merge, persist, surface conflicts.
    ///
    /// Per-record push failures never abort the cycle; a fetch or
    /// persistence failure abandons it with [`SyncState::Failed`] and the
    /// next trigger retries independently.
    pub async fn sync<S: KeyValueStore>(
        &mut self,
        book: &mut QuoteBook<S>,
    ) -> Result<SyncReport> {
        if self.in_flight {
            tracing::debug!("sync already in flight; trigger coalesced");
            return Ok(SyncReport::Skipped);
        }

        self.in_flight = true;
        self.state = SyncState::Syncing;
        let result = self.run_cycle(book).await;
        self.in_flight = false;

        match &result {
            Ok(SyncReport::Completed { conflicts, .. }) => {
                self.state = if *conflicts == 0 {
                    SyncState::Synced
                } else {
                    SyncState::SyncedWithConflicts(*conflicts)
                };
            }
            Ok(SyncReport::Skipped) => {}
            Err(error) => {
                tracing::warn!(%error, "sync cycle failed");
                self.state = SyncState::Failed;
            }
        }
        result
    }

    async fn run_cycle<S: KeyValueStore>(
        &mut self,
        book: &mut QuoteBook<S>,
    ) -> Result<SyncReport> {
        let pushed = push_pending(book.quotes_mut(), &self.remote).await;
        if !pushed.is_empty() {
            book.save()?;
        }

        let snapshot = self.remote.fetch_quotes(self.fetch_limit).await?;
        let outcome = merge_remote(book.quotes(), &snapshot);
        let conflicts = book.apply_merge(outcome)?;

        Ok(SyncReport::Completed {
            pushed: pushed.len(),
            conflicts,
        })
    }
}
