//! Store and section use-cases.
//!
//! # Responsibility
//! - Select, add, rename and delete stores.
//! - Add, move, rename and delete sections of the active store.
//!
//! # Invariants
//! - The last remaining store is never deleted.
//! - Section names stay unique within a store.
//! - Renaming a section relabels its items; deleting one reassigns them to
//!   the fallback section in the same commit.

use crate::model::store::{Store, FALLBACK_SECTION};
use crate::repo::state_repo::StateRepository;
use crate::service::grocery_service::{
    check_index, normalize_name, GroceryService, ServiceError, ServiceResult,
};

/// Direction for `move_section`. The only section reordering primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionMove {
    /// Towards index 0.
    Up,
    /// Towards the end of the list.
    Down,
}

impl SectionMove {
    fn neighbor(self, index: usize, len: usize) -> Option<usize> {
        match self {
            Self::Up => index.checked_sub(1),
            Self::Down => Some(index + 1).filter(|next| *next < len),
        }
    }
}

/// Outcome of `delete_section`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDeletion {
    pub removed: String,
    /// Section that orphaned items now point at.
    pub fallback: String,
    pub reassigned_items: usize,
}

impl<R: StateRepository> GroceryService<R> {
    /// Makes `index` the active store.
    pub fn select_store(&mut self, index: usize) -> ServiceResult<()> {
        if let Err(err) = check_index("store", index, self.stores().len()) {
            return self.reject("store_select", err);
        }
        self.commit("store_select", |state| {
            state.current_store_index = index;
            Ok(())
        })
    }

    /// Appends a store seeded with the default sections and selects it.
    ///
    /// Returns `None` without touching state when `name` is blank.
    pub fn add_store(&mut self, name: &str) -> ServiceResult<Option<usize>> {
        let Some(name) = normalize_name(name) else {
            return Ok(None);
        };
        self.commit("store_add", |state| {
            state.stores.push(Store::with_default_sections(name));
            state.current_store_index = state.stores.len() - 1;
            Ok(Some(state.current_store_index))
        })
    }

    /// Renames the active store. Blank or unchanged names are a no-op.
    pub fn rename_store(&mut self, new_name: &str) -> ServiceResult<bool> {
        let Some(new_name) = normalize_name(new_name) else {
            return Ok(false);
        };
        if self.active_store().name == new_name {
            return Ok(false);
        }
        self.commit("store_rename", |state| {
            state.active_store_mut().name = new_name;
            Ok(true)
        })
    }

    /// Deletes the active store and selects the first one.
    pub fn delete_store(&mut self) -> ServiceResult<Store> {
        if self.stores().len() <= 1 {
            return self.reject("store_delete", ServiceError::LastStore);
        }
        self.commit("store_delete", |state| {
            let removed = state.stores.remove(state.current_store_index);
            state.current_store_index = 0;
            Ok(removed)
        })
    }

    /// Appends a section to the active store. Blank names are a no-op.
    pub fn add_section(&mut self, name: &str) -> ServiceResult<bool> {
        let Some(name) = normalize_name(name) else {
            return Ok(false);
        };
        if self.active_store().has_section(&name) {
            return self.reject("section_add", ServiceError::DuplicateSection(name));
        }
        self.commit("section_add", |state| {
            state.active_store_mut().sections.push(name);
            Ok(true)
        })
    }

    /// Swaps a section with its neighbor.
    ///
    /// Returns `false` when the neighbor would fall outside the list.
    pub fn move_section(&mut self, index: usize, direction: SectionMove) -> ServiceResult<bool> {
        let len = self.active_store().sections.len();
        if let Err(err) = check_index("section", index, len) {
            return self.reject("section_move", err);
        }
        let Some(neighbor) = direction.neighbor(index, len) else {
            return Ok(false);
        };
        self.commit("section_move", |state| {
            state.active_store_mut().sections.swap(index, neighbor);
            Ok(true)
        })
    }

    /// Renames a section and relabels every item pointing at it.
    ///
    /// Returns `false` when the name is unchanged.
    pub fn edit_section(&mut self, index: usize, new_name: &str) -> ServiceResult<bool> {
        let store = self.active_store();
        if let Err(err) = check_index("section", index, store.sections.len()) {
            return self.reject("section_edit", err);
        }
        let Some(new_name) = normalize_name(new_name) else {
            return self.reject("section_edit", ServiceError::EmptyName);
        };
        if store.sections[index] == new_name {
            return Ok(false);
        }
        if store.has_section(&new_name) {
            return self.reject("section_edit", ServiceError::DuplicateSection(new_name));
        }

        self.commit("section_edit", |state| {
            let store = state.active_store_mut();
            let old_name = std::mem::replace(&mut store.sections[index], new_name.clone());
            for item in store.items.iter_mut().filter(|item| item.section == old_name) {
                item.section = new_name.clone();
            }
            Ok(true)
        })
    }

    /// Removes a section and reassigns its items to the fallback section.
    ///
    /// Asking the user for confirmation is the caller's job.
    pub fn delete_section(&mut self, index: usize) -> ServiceResult<SectionDeletion> {
        if let Err(err) = check_index("section", index, self.active_store().sections.len()) {
            return self.reject("section_delete", err);
        }
        self.commit("section_delete", |state| {
            let store = state.active_store_mut();
            let removed = store.sections.remove(index);
            if store.sections.is_empty() {
                store.sections.push(FALLBACK_SECTION.to_string());
            }
            let fallback = store.fallback_section();

            let mut reassigned_items = 0;
            for item in store.items.iter_mut().filter(|item| item.section == removed) {
                item.section = fallback.clone();
                reassigned_items += 1;
            }
            Ok(SectionDeletion {
                removed,
                fallback,
                reassigned_items,
            })
        })
    }
}
