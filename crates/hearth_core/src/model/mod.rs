//! Domain model for energy cards, intentions and continuity artifacts.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep serialized field names stable for snapshots and exports.
//!
//! # Invariants
//! - Every card is identified by a store-assigned `CardId` that is never reused.
//! - Artifacts are append-only.

pub mod artifact;
pub mod card;
pub mod intention;
