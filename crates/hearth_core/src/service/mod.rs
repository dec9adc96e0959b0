//! Core components.
//!
//! # Responsibility
//! - Own mutable state for cards, intentions and continuity.
//! - Stay storage-agnostic by persisting through `StateStore`.

pub mod card_store;
pub mod continuity;
pub mod intention_registry;
