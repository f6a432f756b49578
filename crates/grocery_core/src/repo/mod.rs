//! Repository layer: persistence adapter and typed state records.
//!
//! # Responsibility
//! - Define the key-value contract the state is persisted through.
//! - Keep SQLite and JSON details out of the service layer.
//!
//! # Invariants
//! - A batch of writes is applied atomically or not at all.
//! - Read paths reject malformed records instead of masking them.

pub mod kv_repo;
pub mod state_repo;
