//! Store, section and item records.
//!
//! # Responsibility
//! - Define the canonical `Store` and `Item` shapes persisted as JSON.
//! - Provide section lookup, fallback selection and the display sort.
//!
//! # Invariants
//! - `sections` holds unique names and is never empty after `normalize`.
//! - Item order is only changed by the stable section sort or by explicit
//!   reorder requests.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Section every store carries; orphaned items land here.
pub const FALLBACK_SECTION: &str = "Aisle Items";

/// Store name used when nothing has been persisted yet.
pub const DEFAULT_STORE_NAME: &str = "Default Store";

/// Ordered section template copied into every new store.
pub const DEFAULT_SECTIONS: &[&str] = &[
    "Electronics",
    "Home Appliances",
    "Garage Stuff",
    "Bakery",
    "Produce",
    "Meat",
    "Dairy",
    "Frozen",
    "Toilet Paper Section",
    "Food Aisles (Cereal and Sauces)",
    "Pharmacy",
    "Snacks and Candy",
    "Middle Aisles",
];

/// One purchasable entry on a store list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    /// Name of a section in the owning store; may dangle transiently.
    pub section: String,
    #[serde(default)]
    pub completed: bool,
}

impl Item {
    /// Creates an incomplete item.
    pub fn new(name: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            section: section.into(),
            completed: false,
        }
    }
}

/// A shopping venue with its own aisle order and item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub name: String,
    #[serde(default)]
    pub sections: Vec<String>,
    /// Stores persisted before per-store lists existed have no `items` key.
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Store {
    /// Creates a store seeded with the default section template.
    pub fn with_default_sections(name: impl Into<String>) -> Self {
        let mut store = Self {
            name: name.into(),
            sections: DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect(),
            items: Vec::new(),
        };
        store.normalize();
        store
    }

    /// Returns whether `name` is one of this store's sections.
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.iter().any(|section| section == name)
    }

    /// Position of `name` in the section order, `None` when absent.
    pub fn section_position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|section| section == name)
    }

    /// Section that orphaned items are reassigned to.
    ///
    /// Prefers `FALLBACK_SECTION`, then the first section, then the literal
    /// fallback name when the list is empty.
    pub fn fallback_section(&self) -> String {
        if self.has_section(FALLBACK_SECTION) {
            return FALLBACK_SECTION.to_string();
        }
        self.sections
            .first()
            .cloned()
            .unwrap_or_else(|| FALLBACK_SECTION.to_string())
    }

    /// Drops repeated section names, keeping the first occurrence, and
    /// ensures the fallback section exists.
    ///
    /// Returns `true` when the section list changed.
    pub fn normalize(&mut self) -> bool {
        let before = self.sections.len();
        let mut seen = HashSet::new();
        self.sections.retain(|section| seen.insert(section.clone()));
        let mut changed = self.sections.len() != before;

        if !self.has_section(FALLBACK_SECTION) {
            self.sections.push(FALLBACK_SECTION.to_string());
            changed = true;
        }
        changed
    }

    /// Stable sort of items by their section position.
    ///
    /// Items whose section is missing from `sections` sort first, matching
    /// a position of `-1`.
    pub fn sort_items(&mut self) {
        let sections = &self.sections;
        self.items.sort_by_key(|item| {
            sections
                .iter()
                .position(|section| *section == item.section)
                .map_or(-1, |position| position as i64)
        });
    }
}
