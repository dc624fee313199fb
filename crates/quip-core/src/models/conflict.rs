//! Sync conflict model

use serde::{Deserialize, Serialize};

use super::Quote;

/// Which side wins a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Restore the local snapshot and re-queue it for push
    Local,
    /// Keep the already-merged server version
    #[default]
    Server,
}

/// One id where the local and server replicas disagree after a merge pass.
///
/// Ephemeral: conflicts live only until resolved or dismissed, and at most
/// one merge's conflicts are tracked at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Shared record id
    pub id: String,
    /// Local version at the time of the merge
    pub local: Quote,
    /// Server version that replaced it
    pub server: Quote,
    /// Default winner until the user overrides it
    pub resolution: Resolution,
}

impl Conflict {
    /// Record a divergence between a local and a server snapshot.
    ///
    /// The server wins by default; the user may override per conflict.
    #[must_use]
    pub fn new(local: Quote, server: Quote) -> Self {
        Self {
            id: server.id.clone(),
            local,
            server,
            resolution: Resolution::Server,
        }
    }
}
