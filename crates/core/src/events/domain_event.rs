//! Domain event types.

use serde::{Deserialize, Serialize};

use crate::prices::PriceSnapshot;
use crate::records::Record;

/// Domain events emitted by the scheduler as polls complete.
///
/// These events represent facts about freshly synced data. Runtime adapters
/// translate them into platform-specific actions (UI pushes, websocket
/// broadcasts, desktop notifications, etc.).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DomainEvent {
    /// A feed poll stored previously unseen records for one source.
    NewRecords {
        source_id: String,
        /// The stored batch, most recent first
        records: Vec<Record>,
    },

    /// A feed poll for one source failed; other sources are unaffected.
    SourceError { source_id: String, message: String },

    /// A price poll succeeded. Carries the full merged snapshot, not just
    /// the instruments that changed.
    PriceUpdate { snapshot: PriceSnapshot },

    /// Derived connectivity changed, or the scheduler just started.
    NetworkStatus { is_online: bool },
}

impl DomainEvent {
    /// Creates a NewRecords event.
    pub fn new_records(source_id: String, records: Vec<Record>) -> Self {
        Self::NewRecords { source_id, records }
    }

    /// Creates a SourceError event.
    pub fn source_error(source_id: String, message: String) -> Self {
        Self::SourceError { source_id, message }
    }

    /// Creates a PriceUpdate event.
    pub fn price_update(snapshot: PriceSnapshot) -> Self {
        Self::PriceUpdate { snapshot }
    }

    /// Creates a NetworkStatus event.
    pub fn network_status(is_online: bool) -> Self {
        Self::NetworkStatus { is_online }
    }
}
