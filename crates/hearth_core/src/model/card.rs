//! Energy card domain model.
//!
//! # Responsibility
//! - Define the canonical task record ("energy card") owned by the card store.
//! - Provide validation and patch-merge helpers used by every write path.
//!
//! # Invariants
//! - `id` is assigned by the store, monotonic, and never reused.
//! - `essence` is non-empty after trimming.
//! - `updated` is refreshed on every mutation and never precedes `created`
//!   for records created by this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned numeric identifier for an energy card.
pub type CardId = u64;

/// One intention-scoped task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: CardId,
    /// Short human-readable title.
    pub essence: String,
    /// Free-form constraints or notes; `None` when never provided.
    #[serde(default, deserialize_with = "deserialize_details")]
    pub details: Option<String>,
    #[serde(default)]
    pub completed: bool,
    /// Key into the intention catalog.
    pub intention: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated: DateTime<Utc>,
}

impl TaskRecord {
    /// Creates a pending record stamped with `now` for both timestamps.
    ///
    /// `essence` is trimmed; blank `details` collapse to `None`.
    pub fn new(
        id: CardId,
        essence: &str,
        intention: impl Into<String>,
        details: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, CardValidationError> {
        let record = Self {
            id,
            essence: essence.trim().to_string(),
            details: normalize_details(details),
            completed: false,
            intention: intention.into(),
            created: now,
            updated: now,
        };
        record.validate()?;
        Ok(record)
    }

    /// Checks the record-level invariants.
    pub fn validate(&self) -> Result<(), CardValidationError> {
        if self.essence.trim().is_empty() {
            return Err(CardValidationError::EmptyEssence);
        }
        if self.intention.trim().is_empty() {
            return Err(CardValidationError::EmptyIntention);
        }
        Ok(())
    }

    /// Merges a partial update and refreshes `updated`.
    ///
    /// The record is left untouched when the patch would break an invariant.
    pub fn apply(&mut self, patch: &CardPatch, now: DateTime<Utc>) -> Result<(), CardValidationError> {
        let mut next = self.clone();
        if let Some(essence) = patch.essence.as_deref() {
            next.essence = essence.trim().to_string();
        }
        if let Some(details) = patch.details.as_deref() {
            next.details = normalize_details(Some(details));
        }
        if let Some(completed) = patch.completed {
            next.completed = completed;
        }
        if let Some(intention) = patch.intention.as_deref() {
            next.intention = intention.trim().to_string();
        }
        next.validate()?;
        next.updated = now;
        *self = next;
        Ok(())
    }

    /// Flips completion state and refreshes `updated`.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.updated = now;
    }
}

/// Partial update for [`TaskRecord::apply`].
///
/// `None` leaves a field as-is. An empty `details` string clears details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPatch {
    pub essence: Option<String>,
    pub details: Option<String>,
    pub completed: Option<bool>,
    pub intention: Option<String>,
}

impl CardPatch {
    pub fn details(value: impl Into<String>) -> Self {
        Self {
            details: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn completed(value: bool) -> Self {
        Self {
            completed: Some(value),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.essence.is_none()
            && self.details.is_none()
            && self.completed.is_none()
            && self.intention.is_none()
    }
}

/// Derived progress aggregate over a record collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStats {
    pub total: usize,
    pub completed: usize,
    /// Rounded percentage in `0..=100`; `0` for an empty collection.
    pub progress: u8,
}

impl CardStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TaskRecord>) -> Self {
        let (total, completed) = records.into_iter().fold((0, 0), |(total, done), record| {
            (total + 1, done + usize::from(record.completed))
        });
        Self {
            total,
            completed,
            progress: progress_percent(completed, total),
        }
    }
}

/// `round(100 * completed / total)`, defined as `0` when `total == 0`.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (completed as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Record-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardValidationError {
    EmptyEssence,
    EmptyIntention,
    DuplicateId(CardId),
    /// No id follows this one; the counter would overflow.
    IdOutOfRange(CardId),
    MissingCards,
    MalformedDocument(String),
}

impl Display for CardValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEssence => write!(f, "essence cannot be empty"),
            Self::EmptyIntention => write!(f, "intention cannot be empty"),
            Self::DuplicateId(id) => write!(f, "duplicate card id {id} in import document"),
            Self::IdOutOfRange(id) => write!(f, "card id {id} leaves no room for a next id"),
            Self::MissingCards => write!(f, "import document must contain a `cards` array"),
            Self::MalformedDocument(details) => write!(f, "malformed import document: {details}"),
        }
    }
}

impl Error for CardValidationError {}

fn normalize_details(details: Option<&str>) -> Option<String> {
    details
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

// Exports from the original web app carry `details: ""` for cards without notes.
fn deserialize_details<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(normalize_details(raw.as_deref()))
}
