//! Persistence abstractions and implementations.
//!
//! # Invariants
//! - Components persist whole snapshots through `StateStore`; no component
//!   touches SQL directly.

pub mod state_store;
