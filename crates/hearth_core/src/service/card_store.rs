//! Energy card store: record lifecycle, filtering, stats, import/export.
//!
//! # Responsibility
//! - Own the record collection and the id counter.
//! - Persist the full `{records, nextId}` snapshot after every mutation.
//! - Validate bulk import documents before replacing state.
//!
//! # Invariants
//! - Ids are never reused, including after deletion or import.
//! - `list_by_intention` preserves insertion order.
//! - A rejected import leaves both memory and the persisted snapshot untouched.
//! - Unknown ids are silent no-ops returning `None`.

use crate::events::{EventSink, HearthEvent};
use crate::model::card::{CardId, CardPatch, CardStats, CardValidationError, TaskRecord};
use crate::repo::state_store::{StateStore, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Fixed durable-store key for the card snapshot.
pub const CARDS_STATE_KEY: &str = "sovereign_energy_cards";
/// Schema version written into export documents.
pub const EXPORT_VERSION: &str = "1.0";
const ALL_INTENTIONS: &str = "all";

/// Card store failure surfaced to collaborators.
#[derive(Debug)]
pub enum CardStoreError {
    Validation(CardValidationError),
    Persistence(StoreError),
    Encode(serde_json::Error),
}

impl Display for CardStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "failed to persist cards: {err}"),
            Self::Encode(err) => write!(f, "failed to encode cards: {err}"),
        }
    }
}

impl Error for CardStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<CardValidationError> for CardStoreError {
    fn from(value: CardValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for CardStoreError {
    fn from(value: StoreError) -> Self {
        Self::Persistence(value)
    }
}

pub type CardStoreResult<T> = Result<T, CardStoreError>;

/// Intention filter for listing; `All` bypasses filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentionFilter {
    All,
    Key(String),
}

impl IntentionFilter {
    /// Maps the `"all"` sentinel to [`IntentionFilter::All`].
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed == ALL_INTENTIONS {
            Self::All
        } else {
            Self::Key(trimmed.to_string())
        }
    }

    pub fn matches(&self, record: &TaskRecord) -> bool {
        match self {
            Self::All => true,
            Self::Key(key) => record.intention == *key,
        }
    }
}

/// Versioned snapshot handed to external export sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub version: String,
    pub cards: Vec<TaskRecord>,
    pub stats: CardStats,
}

/// Result of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub next_id: CardId,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCards {
    #[serde(alias = "cards", default)]
    records: Vec<TaskRecord>,
    #[serde(rename = "nextId", alias = "nextCardId", default)]
    next_id: Option<CardId>,
}

/// Owner of the energy card collection.
pub struct CardStore {
    records: Vec<TaskRecord>,
    next_id: CardId,
    store: Rc<dyn StateStore>,
    events: Rc<dyn EventSink>,
}

impl CardStore {
    /// Restores state from `store`, falling back to an empty collection.
    ///
    /// Read or decode failures are logged and never propagated.
    pub fn load(store: Rc<dyn StateStore>, events: Rc<dyn EventSink>) -> Self {
        let (records, next_id) = match store.get(CARDS_STATE_KEY) {
            Ok(Some(raw)) => match decode_snapshot(&raw) {
                Ok((records, next_id)) => {
                    info!(
                        "event=cards_load module=cards status=ok count={} next_id={next_id}",
                        records.len()
                    );
                    (records, next_id)
                }
                Err(err) => {
                    warn!(
                        "event=cards_load module=cards status=error error_code=state_corrupt error={err}"
                    );
                    (Vec::new(), 1)
                }
            },
            Ok(None) => {
                info!("event=cards_load module=cards status=ok count=0 state=absent");
                (Vec::new(), 1)
            }
            Err(err) => {
                warn!(
                    "event=cards_load module=cards status=error error_code=state_unreadable error={err}"
                );
                (Vec::new(), 1)
            }
        };

        Self {
            records,
            next_id,
            store,
            events,
        }
    }

    /// Creates a pending card and persists it.
    pub fn create(
        &mut self,
        essence: &str,
        intention: &str,
        details: Option<&str>,
    ) -> CardStoreResult<TaskRecord> {
        let following = self
            .next_id
            .checked_add(1)
            .ok_or(CardValidationError::IdOutOfRange(self.next_id))?;
        let record = TaskRecord::new(self.next_id, essence, intention, details, Utc::now())?;
        self.next_id = following;
        self.records.push(record.clone());
        self.events.emit(&HearthEvent::CardCreated { id: record.id });
        self.persist("create")?;
        Ok(record)
    }

    /// Merges `patch` into card `id`.
    pub fn update(&mut self, id: CardId, patch: &CardPatch) -> CardStoreResult<Option<TaskRecord>> {
        let Some(record) = self.records.iter_mut().find(|record| record.id == id) else {
            return Ok(None);
        };
        record.apply(patch, Utc::now())?;
        let updated = record.clone();
        self.events.emit(&HearthEvent::CardUpdated { id });
        self.persist("update")?;
        Ok(Some(updated))
    }

    /// Flips completion state of card `id`.
    pub fn toggle_completion(&mut self, id: CardId) -> CardStoreResult<Option<TaskRecord>> {
        let Some(record) = self.records.iter_mut().find(|record| record.id == id) else {
            return Ok(None);
        };
        record.toggle(Utc::now());
        let toggled = record.clone();
        self.events.emit(&HearthEvent::CompletionToggled {
            id,
            completed: toggled.completed,
        });
        self.persist("toggle")?;
        Ok(Some(toggled))
    }

    /// Toggles every known id in `ids`, skipping unknown ones.
    ///
    /// Returns how many cards were toggled; persists once.
    pub fn toggle_many(&mut self, ids: &[CardId]) -> CardStoreResult<usize> {
        let now = Utc::now();
        let mut toggled = 0;
        for &id in ids {
            if let Some(record) = self.records.iter_mut().find(|record| record.id == id) {
                record.toggle(now);
                toggled += 1;
                self.events.emit(&HearthEvent::CompletionToggled {
                    id,
                    completed: record.completed,
                });
            }
        }
        if toggled > 0 {
            self.persist("toggle_many")?;
        }
        Ok(toggled)
    }

    /// Marks every card completed (or pending) and returns how many changed.
    pub fn set_all_completed(&mut self, completed: bool) -> CardStoreResult<usize> {
        let now = Utc::now();
        let mut changed = 0;
        for record in self.records.iter_mut().filter(|r| r.completed != completed) {
            record.completed = completed;
            record.updated = now;
            changed += 1;
            self.events.emit(&HearthEvent::CompletionToggled {
                id: record.id,
                completed,
            });
        }
        if changed > 0 {
            self.persist("set_all_completed")?;
        }
        Ok(changed)
    }

    /// Removes card `id`; the id is retired permanently.
    pub fn delete(&mut self, id: CardId) -> CardStoreResult<Option<TaskRecord>> {
        let Some(index) = self.records.iter().position(|record| record.id == id) else {
            return Ok(None);
        };
        let removed = self.records.remove(index);
        self.events.emit(&HearthEvent::CardDeleted { id });
        self.persist("delete")?;
        Ok(Some(removed))
    }

    pub fn get(&self, id: CardId) -> Option<&TaskRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// All cards in insertion order.
    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn list_by_intention(&self, filter: &IntentionFilter) -> Vec<&TaskRecord> {
        self.records
            .iter()
            .filter(|record| filter.matches(record))
            .collect()
    }

    /// Id the next created card will receive.
    pub fn next_id(&self) -> CardId {
        self.next_id
    }

    pub fn stats(&self) -> CardStats {
        CardStats::from_records(&self.records)
    }

    pub fn export(&self) -> ExportDocument {
        ExportDocument {
            exported_at: Utc::now(),
            version: EXPORT_VERSION.to_string(),
            cards: self.records.clone(),
            stats: self.stats(),
        }
    }

    /// Pretty-printed JSON export for file sinks.
    pub fn export_json(&self) -> CardStoreResult<String> {
        serde_json::to_string_pretty(&self.export()).map_err(CardStoreError::Encode)
    }

    /// Parses `text` as an import document; see [`CardStore::import`].
    pub fn import_json(&mut self, text: &str) -> CardStoreResult<ImportSummary> {
        let document: Value = serde_json::from_str(text).map_err(|err| {
            CardValidationError::MalformedDocument(format!("invalid JSON: {err}"))
        })?;
        self.import(&document)
    }

    /// Replaces the whole collection with `document.cards`.
    ///
    /// # Errors
    /// - `Validation` when `cards` is missing, not an array, or holds an
    ///   invalid or duplicate record, or an id with no successor. State is
    ///   untouched in that case.
    /// - `Persistence` when the new snapshot cannot be written; the in-memory
    ///   replacement is kept.
    pub fn import(&mut self, document: &Value) -> CardStoreResult<ImportSummary> {
        let (records, next_id) = match parse_import_cards(document) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("event=cards_import module=cards status=rejected error={err}");
                return Err(err.into());
            }
        };

        self.next_id = next_id;
        self.records = records;
        let summary = ImportSummary {
            imported: self.records.len(),
            next_id: self.next_id,
        };
        info!(
            "event=cards_import module=cards status=ok count={} next_id={}",
            summary.imported, summary.next_id
        );
        self.events.emit(&HearthEvent::ImportCompleted {
            imported: summary.imported,
        });
        self.persist("import")?;
        Ok(summary)
    }

    fn persist(&self, operation: &'static str) -> CardStoreResult<()> {
        let snapshot = PersistedCards {
            records: self.records.clone(),
            next_id: Some(self.next_id),
        };
        let encoded = serde_json::to_string(&snapshot).map_err(CardStoreError::Encode)?;
        self.store.set(CARDS_STATE_KEY, &encoded).map_err(|err| {
            error!(
                "event=cards_persist module=cards status=error operation={operation} error={err}"
            );
            CardStoreError::Persistence(err)
        })
    }
}

/// File name used when writing an export for `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("sovereign-hearth-export-{}.json", date.format("%Y-%m-%d"))
}

fn parse_import_cards(document: &Value) -> Result<(Vec<TaskRecord>, CardId), CardValidationError> {
    let cards = document
        .get("cards")
        .filter(|cards| cards.is_array())
        .ok_or(CardValidationError::MissingCards)?;
    let records: Vec<TaskRecord> = serde_json::from_value(cards.clone())
        .map_err(|err| CardValidationError::MalformedDocument(err.to_string()))?;

    let mut seen = BTreeSet::new();
    for record in &records {
        record.validate()?;
        if !seen.insert(record.id) {
            return Err(CardValidationError::DuplicateId(record.id));
        }
    }
    let next_id = next_id_after(&records)?;
    Ok((records, next_id))
}

fn decode_snapshot(raw: &str) -> Result<(Vec<TaskRecord>, CardId), String> {
    let persisted: PersistedCards = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    let floor = next_id_after(&persisted.records).map_err(|err| err.to_string())?;
    let next_id = persisted.next_id.map_or(floor, |stored| stored.max(floor));
    Ok((persisted.records, next_id))
}

fn next_id_after(records: &[TaskRecord]) -> Result<CardId, CardValidationError> {
    let highest = records.iter().map(|record| record.id).max().unwrap_or(0);
    highest
        .checked_add(1)
        .ok_or(CardValidationError::IdOutOfRange(highest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_parse_recognizes_all_sentinel() {
        assert_eq!(IntentionFilter::parse(" all "), IntentionFilter::All);
        assert_eq!(
            IntentionFilter::parse("weaving"),
            IntentionFilter::Key("weaving".to_string())
        );
    }

    #[test]
    fn export_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(export_file_name(date), "sovereign-hearth-export-2024-03-09.json");
    }

    #[test]
    fn parse_import_cards_rejects_non_array_cards() {
        let err = parse_import_cards(&json!({ "cards": { "id": 1 } })).unwrap_err();
        assert_eq!(err, CardValidationError::MissingCards);
    }

    #[test]
    fn legacy_snapshot_field_names_are_accepted() {
        let persisted: PersistedCards = serde_json::from_str(
            r#"{"cards":[{"id":4,"essence":"a","intention":"weaving"}],"nextCardId":9}"#,
        )
        .unwrap();
        assert_eq!(persisted.records.len(), 1);
        assert_eq!(persisted.next_id, Some(9));
    }

    #[test]
    fn snapshot_decode_raises_floor_and_rejects_last_id() {
        let (records, next_id) = decode_snapshot(
            r#"{"records":[{"id":3,"essence":"a","intention":"weaving"}],"nextId":2}"#,
        )
        .unwrap();
        assert_eq!((records.len(), next_id), (1, 4));

        let err = decode_snapshot(&format!(
            r#"{{"records":[{{"id":{},"essence":"a","intention":"weaving"}}]}}"#,
            CardId::MAX
        ))
        .unwrap_err();
        assert!(err.contains("no room"));
    }
}
