//! Application state root.
//!
//! # Responsibility
//! - Own the store collection, active store selection and the
//!   item-to-section cache as one explicit value.
//! - Repair persisted state that violates model invariants.
//!
//! # Invariants
//! - `stores` is never empty after `normalize`.
//! - `current_store_index < stores.len()` after `normalize`.

use crate::model::store::{Store, DEFAULT_STORE_NAME};
use std::collections::BTreeMap;

/// Item names and sections seeded into a fresh cache.
const DEFAULT_ITEM_SECTIONS: &[(&str, &str)] = &[
    ("Milk", "Dairy"),
    ("Cream", "Dairy"),
    ("Cheese", "Frozen"),
    ("Apples", "Produce"),
    ("Bananas", "Produce"),
    ("Bread", "Bakery"),
    ("Bagels", "Bakery"),
    ("Chicken", "Meat"),
    ("Beef", "Meat"),
    ("Ice Cream", "Frozen"),
    ("Frozen Pizza", "Frozen"),
    ("Cereal", "Food Aisles (Cereal and Sauces)"),
    ("Pasta", "Food Aisles (Cereal and Sauces)"),
];

/// Last section chosen per item name. Best-effort; entries may go stale.
pub type ItemSections = BTreeMap<String, String>;

/// Returns the cache contents used on first load.
pub fn default_item_sections() -> ItemSections {
    DEFAULT_ITEM_SECTIONS
        .iter()
        .map(|(name, section)| (name.to_string(), section.to_string()))
        .collect()
}

/// Whole persisted application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroceryState {
    pub stores: Vec<Store>,
    pub current_store_index: usize,
    pub item_sections: ItemSections,
}

impl Default for GroceryState {
    fn default() -> Self {
        Self {
            stores: vec![Store::with_default_sections(DEFAULT_STORE_NAME)],
            current_store_index: 0,
            item_sections: default_item_sections(),
        }
    }
}

impl GroceryState {
    /// Currently selected store.
    pub fn active_store(&self) -> &Store {
        &self.stores[self.current_store_index]
    }

    /// Currently selected store, mutably.
    pub fn active_store_mut(&mut self) -> &mut Store {
        &mut self.stores[self.current_store_index]
    }

    /// Repairs invariants after load or bulk replacement.
    ///
    /// Returns `true` when anything had to be changed.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        if self.stores.is_empty() {
            self.stores
                .push(Store::with_default_sections(DEFAULT_STORE_NAME));
            changed = true;
        }
        if self.current_store_index >= self.stores.len() {
            self.current_store_index = 0;
            changed = true;
        }
        for store in &mut self.stores {
            changed |= store.normalize();
        }
        changed
    }
}
