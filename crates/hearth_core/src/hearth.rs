//! Owning coordinator wiring the card store, intention registry and
//! continuity tracker together.
//!
//! # Responsibility
//! - Construct every component explicitly over one shared `StateStore`.
//! - Expose collaborator-level use cases (create under the active intention,
//!   continuity prompt from current stats, import/export).
//!
//! # Invariants
//! - Components never look each other up; cross-component reads go through
//!   this type.
//! - Creating a card while `weaving` is active records an `energy_card`
//!   artifact for it.

use crate::config::HearthConfig;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::events::{EventHub, EventSink, HearthEvent};
use crate::model::artifact::Artifact;
use crate::model::card::{CardId, CardPatch, CardStats, TaskRecord};
use crate::model::intention::IntentionDescriptor;
use crate::repo::state_store::{SqliteStateStore, StateStore};
use crate::service::card_store::{
    CardStore, CardStoreError, CardStoreResult, ExportDocument, ImportSummary, IntentionFilter,
};
use crate::service::continuity::{ContinuityError, ContinuityTracker, CONTINUITY_INTENTION};
use crate::service::intention_registry::{ActiveChange, IntentionRegistry, RegistryError};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

const CARD_ARTIFACT_KIND: &str = "energy_card";
const CARD_ARTIFACT_PURPOSE: &str = "New task created in Sovereign Hearth system";

/// Failure while opening a hearth.
#[derive(Debug)]
pub enum HearthOpenError {
    Db(DbError),
    Registry(RegistryError),
}

impl Display for HearthOpenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HearthOpenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Registry(err) => Some(err),
        }
    }
}

impl From<DbError> for HearthOpenError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RegistryError> for HearthOpenError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

/// The three core components plus the event hub they report to.
pub struct Hearth {
    cards: CardStore,
    intentions: IntentionRegistry,
    continuity: ContinuityTracker,
    hub: Rc<EventHub>,
}

impl Hearth {
    /// Wires components over `store` with the builtin catalog.
    pub fn new(store: Rc<dyn StateStore>) -> Self {
        let hub = Rc::new(EventHub::new());
        let events: Rc<dyn EventSink> = hub.clone();
        let intentions = IntentionRegistry::builtin(Rc::clone(&events));
        Self::assemble(store, intentions, hub)
    }

    /// Wires components over `store` with a custom catalog.
    pub fn with_catalog(
        store: Rc<dyn StateStore>,
        descriptors: Vec<IntentionDescriptor>,
        default_intention: &str,
    ) -> Result<Self, RegistryError> {
        let hub = Rc::new(EventHub::new());
        let events: Rc<dyn EventSink> = hub.clone();
        let intentions = IntentionRegistry::new(descriptors, default_intention, events)?;
        Ok(Self::assemble(store, intentions, hub))
    }

    /// Opens the SQLite database named by `config` and wires the core.
    pub fn open(config: &HearthConfig) -> Result<Self, HearthOpenError> {
        let conn = open_db(config.db_path())?;
        Self::from_connection(conn, &config.default_intention)
    }

    /// In-memory SQLite variant of [`Hearth::open`].
    pub fn open_in_memory(default_intention: &str) -> Result<Self, HearthOpenError> {
        Self::from_connection(open_db_in_memory()?, default_intention)
    }

    fn from_connection(
        conn: rusqlite::Connection,
        default_intention: &str,
    ) -> Result<Self, HearthOpenError> {
        let store: Rc<dyn StateStore> = Rc::new(SqliteStateStore::new(conn));
        let hub = Rc::new(EventHub::new());
        let events: Rc<dyn EventSink> = hub.clone();
        let intentions = IntentionRegistry::builtin_with_default(default_intention, events)?;
        Ok(Self::assemble(store, intentions, hub))
    }

    fn assemble(store: Rc<dyn StateStore>, intentions: IntentionRegistry, hub: Rc<EventHub>) -> Self {
        let events: Rc<dyn EventSink> = hub.clone();
        Self {
            cards: CardStore::load(Rc::clone(&store), Rc::clone(&events)),
            continuity: ContinuityTracker::load(store, events),
            intentions,
            hub,
        }
    }

    /// Registers a listener for every subsequent core event.
    pub fn subscribe(&self, listener: impl Fn(&HearthEvent) + 'static) {
        self.hub.subscribe(listener);
    }

    pub fn cards(&self) -> &CardStore {
        &self.cards
    }

    pub fn intentions(&self) -> &IntentionRegistry {
        &self.intentions
    }

    pub fn continuity(&self) -> &ContinuityTracker {
        &self.continuity
    }

    /// Creates a card under the active intention.
    ///
    /// A failing continuity write is logged and does not fail the creation.
    /// The artifact is recorded whenever the card exists in memory, including
    /// when only its snapshot write failed.
    pub fn create_card(&mut self, essence: &str, details: Option<&str>) -> CardStoreResult<TaskRecord> {
        let intention = self.intentions.active().to_string();
        let created = self.cards.create(essence, &intention, details);
        let kept = match &created {
            Ok(record) => Some(record.clone()),
            Err(CardStoreError::Persistence(_)) => self.cards.records().last().cloned(),
            Err(_) => None,
        };
        if let Some(record) = kept.filter(|_| intention == CONTINUITY_INTENTION) {
            if let Err(err) = self.continuity.record_artifact(
                CARD_ARTIFACT_KIND,
                &record.essence,
                CARD_ARTIFACT_PURPOSE,
                &intention,
            ) {
                warn!(
                    "event=card_artifact module=hearth status=error card_id={} error={err}",
                    record.id
                );
            }
        }
        created
    }

    pub fn update_card(&mut self, id: CardId, patch: &CardPatch) -> CardStoreResult<Option<TaskRecord>> {
        self.cards.update(id, patch)
    }

    pub fn toggle_card(&mut self, id: CardId) -> CardStoreResult<Option<TaskRecord>> {
        self.cards.toggle_completion(id)
    }

    pub fn toggle_cards(&mut self, ids: &[CardId]) -> CardStoreResult<usize> {
        self.cards.toggle_many(ids)
    }

    pub fn check_all(&mut self) -> CardStoreResult<usize> {
        self.cards.set_all_completed(true)
    }

    pub fn uncheck_all(&mut self) -> CardStoreResult<usize> {
        self.cards.set_all_completed(false)
    }

    pub fn delete_card(&mut self, id: CardId) -> CardStoreResult<Option<TaskRecord>> {
        self.cards.delete(id)
    }

    /// Cards matching `filter` in insertion order.
    pub fn list(&self, filter: &IntentionFilter) -> Vec<&TaskRecord> {
        self.cards.list_by_intention(filter)
    }

    /// Cards under the active intention, as shown by the card view.
    pub fn active_cards(&self) -> Vec<&TaskRecord> {
        self.list(&IntentionFilter::Key(self.intentions.active().to_string()))
    }

    pub fn stats(&self) -> CardStats {
        self.cards.stats()
    }

    pub fn set_intention(&mut self, key: &str) -> ActiveChange {
        self.intentions.set_active(key)
    }

    /// Intention-specific context text for card `id`.
    pub fn task_context(&self, id: CardId) -> Option<String> {
        let record = self.cards.get(id)?;
        self.intentions.task_context(record)
    }

    /// Records an artifact under the active intention.
    pub fn record_artifact(
        &mut self,
        kind: &str,
        name: &str,
        purpose: &str,
    ) -> Result<Artifact, ContinuityError> {
        let intention = self.intentions.active().to_string();
        self.continuity.record_artifact(kind, name, purpose, &intention)
    }

    /// Continuity prompt over every card and the current progress.
    pub fn continuity_prompt(&self) -> String {
        self.continuity.generate_prompt(
            self.cards.records(),
            self.intentions.active(),
            self.cards.stats().progress,
        )
    }

    pub fn export(&self) -> ExportDocument {
        self.cards.export()
    }

    pub fn export_json(&self) -> CardStoreResult<String> {
        self.cards.export_json()
    }

    pub fn import_json(&mut self, text: &str) -> Result<ImportSummary, CardStoreError> {
        self.cards.import_json(text)
    }
}
