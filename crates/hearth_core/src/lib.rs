//! Core domain logic for the Sovereign Hearth energy-card system.
//! This crate is the single source of truth for card, intention and
//! continuity invariants; presentation layers only call in and subscribe.

pub mod config;
pub mod db;
pub mod events;
pub mod hearth;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::HearthConfig;
pub use events::{EventHub, EventSink, HearthEvent, NoopSink, RecordingSink};
pub use hearth::{Hearth, HearthOpenError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::artifact::{Artifact, SessionId};
pub use model::card::{CardId, CardPatch, CardStats, CardValidationError, TaskRecord};
pub use model::intention::IntentionDescriptor;
pub use repo::state_store::{
    MemoryStateStore, SqliteStateStore, StateStore, StoreError, StoreResult,
};
pub use service::card_store::{
    export_file_name, CardStore, CardStoreError, ExportDocument, ImportSummary, IntentionFilter,
};
pub use service::continuity::{ContinuityError, ContinuityTracker};
pub use service::intention_registry::{ActiveChange, IntentionRegistry, RegistryError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
