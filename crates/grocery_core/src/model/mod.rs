//! Grocery domain model.
//!
//! # Responsibility
//! - Define the in-memory object graph mirrored by persisted JSON records.
//! - Own sorting and fallback rules shared by every manager.
//!
//! # Invariants
//! - Every store keeps at least one section usable as a fallback.
//! - `current_store_index` always addresses an existing store.

pub mod state;
pub mod store;
