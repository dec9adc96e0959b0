//! Continuity artifacts and session identity.
//!
//! # Invariants
//! - Artifacts are append-only; nothing in core edits or removes them.
//! - A `SessionId` is generated once per tracker and never persisted alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SESSION_FRAGMENT_LEN: usize = 9;

/// One logged outcome produced while working under an intention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Serialized as `type` to match the persisted log schema.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub purpose: String,
    pub intention: String,
    pub timestamp: DateTime<Utc>,
    pub session: SessionId,
}

/// Human-readable correlation token: `session_<fragment>_<millis base36>`.
///
/// Not a uniqueness or security guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a new token stamped with `now`.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let random = u128::from_le_bytes(*Uuid::new_v4().as_bytes());
        let mut fragment = to_base36(random);
        fragment.truncate(SESSION_FRAGMENT_LEN);
        let millis = u128::try_from(now.timestamp_millis()).unwrap_or_default();
        Self(format!("session_{fragment}_{}", to_base36(millis)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
