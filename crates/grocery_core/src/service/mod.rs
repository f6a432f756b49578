//! Use-case services over grocery state.
//!
//! # Responsibility
//! - Validate user requests before any mutation.
//! - Commit mutations through the injected `StateRepository`.
//!
//! # Invariants
//! - A rejected or failed operation leaves state untouched.
//! - The active store's items are kept in section order after each commit.

pub mod grocery_service;
pub mod item_service;
pub mod paste_service;
pub mod store_service;
