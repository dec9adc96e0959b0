//! Intention catalog and active-intention selection.
//!
//! # Responsibility
//! - Hold the immutable descriptor catalog built at startup.
//! - Track the single active intention key.
//!
//! # Invariants
//! - Exactly one catalog key is active at any time.
//! - Only `set_active` changes the active key.
//! - Unknown keys passed to `set_active` are an explicit, logged no-op.

use crate::events::{EventSink, HearthEvent};
use crate::model::card::TaskRecord;
use crate::model::intention::{builtin_descriptors, IntentionDescriptor, WEAVING};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

static INTENTION_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid intention key regex"));

/// Catalog construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    EmptyCatalog,
    InvalidKey(String),
    DuplicateKey(String),
    UnknownDefault(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCatalog => write!(f, "intention catalog cannot be empty"),
            Self::InvalidKey(key) => write!(f, "intention key is invalid: `{key}`"),
            Self::DuplicateKey(key) => write!(f, "intention key already registered: `{key}`"),
            Self::UnknownDefault(key) => {
                write!(f, "default intention `{key}` is not in the catalog")
            }
        }
    }
}

impl Error for RegistryError {}

/// Outcome of [`IntentionRegistry::set_active`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveChange {
    Changed { previous: String },
    Unchanged,
    UnknownKey(String),
}

/// Descriptor catalog plus the active pointer.
pub struct IntentionRegistry {
    descriptors: Vec<IntentionDescriptor>,
    active: usize,
    events: Rc<dyn EventSink>,
}

impl IntentionRegistry {
    /// Builds a registry whose initial active key is `default_key`.
    pub fn new(
        descriptors: Vec<IntentionDescriptor>,
        default_key: &str,
        events: Rc<dyn EventSink>,
    ) -> Result<Self, RegistryError> {
        if descriptors.is_empty() {
            return Err(RegistryError::EmptyCatalog);
        }
        for (index, descriptor) in descriptors.iter().enumerate() {
            if !is_valid_intention_key(&descriptor.key) {
                return Err(RegistryError::InvalidKey(descriptor.key.clone()));
            }
            if descriptors[..index].iter().any(|d| d.key == descriptor.key) {
                return Err(RegistryError::DuplicateKey(descriptor.key.clone()));
            }
        }
        let active = descriptors
            .iter()
            .position(|descriptor| descriptor.key == default_key.trim())
            .ok_or_else(|| RegistryError::UnknownDefault(default_key.to_string()))?;

        Ok(Self {
            descriptors,
            active,
            events,
        })
    }

    /// Standard four-intention catalog with `weaving` active.
    pub fn builtin(events: Rc<dyn EventSink>) -> Self {
        let descriptors = builtin_descriptors();
        let active = descriptors
            .iter()
            .position(|descriptor| descriptor.key == WEAVING)
            .unwrap_or(0);
        Self {
            descriptors,
            active,
            events,
        }
    }

    /// Builtin catalog starting at `default_key`.
    pub fn builtin_with_default(
        default_key: &str,
        events: Rc<dyn EventSink>,
    ) -> Result<Self, RegistryError> {
        Self::new(builtin_descriptors(), default_key, events)
    }

    /// Switches the active intention.
    ///
    /// Emits `IntentionChanged` only when the key differs from the current one.
    pub fn set_active(&mut self, key: &str) -> ActiveChange {
        let Some(index) = self.position(key) else {
            warn!(
                "event=intention_select module=intentions status=ignored reason=unknown_key key={}",
                key.trim()
            );
            return ActiveChange::UnknownKey(key.trim().to_string());
        };
        if index == self.active {
            return ActiveChange::Unchanged;
        }

        let previous = self.active().to_string();
        self.active = index;
        info!(
            "event=intention_select module=intentions status=ok previous={previous} active={}",
            self.active()
        );
        self.events.emit(&HearthEvent::IntentionChanged {
            previous: previous.clone(),
            active: self.active().to_string(),
        });
        ActiveChange::Changed { previous }
    }

    pub fn active(&self) -> &str {
        &self.descriptors[self.active].key
    }

    pub fn active_descriptor(&self) -> &IntentionDescriptor {
        &self.descriptors[self.active]
    }

    pub fn descriptor(&self, key: &str) -> Option<&IntentionDescriptor> {
        self.position(key).map(|index| &self.descriptors[index])
    }

    /// Catalog keys in declaration order.
    pub fn keys(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.key.as_str()).collect()
    }

    pub fn descriptors(&self) -> &[IntentionDescriptor] {
        &self.descriptors
    }

    /// Renders the context text for `record` using its intention's generator.
    pub fn task_context(&self, record: &TaskRecord) -> Option<String> {
        self.descriptor(&record.intention)
            .map(|descriptor| descriptor.render_context(record))
    }

    fn position(&self, key: &str) -> Option<usize> {
        let key = key.trim();
        self.descriptors.iter().position(|d| d.key == key)
    }
}

fn is_valid_intention_key(key: &str) -> bool {
    INTENTION_KEY_RE.is_match(key)
}
