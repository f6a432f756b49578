//! Item use-cases for the active store.
//!
//! Indices are display positions: the active store's items are re-sorted by
//! section after every commit, so the position a caller sees is the one it
//! passes back.
//!
//! `reorder_item` moves an item in the underlying sequence before that
//! sort runs. Within a section the move sticks; across sections the sort
//! puts the item back in its own section block, so the request has no
//! visible effect. Callers rely on this, keep it.

use crate::model::store::Item;
use crate::repo::state_repo::StateRepository;
use crate::service::grocery_service::{
    check_index, normalize_name, GroceryService, ServiceError, ServiceResult,
};

impl<R: StateRepository> GroceryService<R> {
    /// Appends an incomplete item and returns its display index.
    pub fn add_item(&mut self, name: &str, section: &str) -> ServiceResult<usize> {
        let Some(name) = normalize_name(name) else {
            return self.reject("item_add", ServiceError::EmptyName);
        };
        if !self.active_store().has_section(section) {
            return self.reject(
                "item_add",
                ServiceError::SectionNotFound(section.to_string()),
            );
        }
        self.commit("item_add", |state| {
            state.active_store_mut().items.push(Item::new(name, section));
            Ok(())
        })?;

        let items = &self.active_store().items;
        Ok(items
            .iter()
            .rposition(|item| item.section == section)
            .unwrap_or(items.len().saturating_sub(1)))
    }

    /// Flips the completion flag and returns the new value.
    pub fn toggle_complete(&mut self, index: usize) -> ServiceResult<bool> {
        if let Err(err) = check_index("item", index, self.active_store().items.len()) {
            return self.reject("item_toggle", err);
        }
        self.commit("item_toggle", |state| {
            let item = &mut state.active_store_mut().items[index];
            item.completed = !item.completed;
            Ok(item.completed)
        })
    }

    /// Removes one item by position.
    pub fn delete_item(&mut self, index: usize) -> ServiceResult<Item> {
        if let Err(err) = check_index("item", index, self.active_store().items.len()) {
            return self.reject("item_delete", err);
        }
        self.commit("item_delete", |state| {
            Ok(state.active_store_mut().items.remove(index))
        })
    }

    /// Moves an item to another existing section of the active store.
    ///
    /// Returns `false` when the item is already in `section`.
    pub fn edit_item_section(&mut self, index: usize, section: &str) -> ServiceResult<bool> {
        let store = self.active_store();
        if let Err(err) = check_index("item", index, store.items.len()) {
            return self.reject("item_edit_section", err);
        }
        if !store.has_section(section) {
            return self.reject(
                "item_edit_section",
                ServiceError::SectionNotFound(section.to_string()),
            );
        }
        if store.items[index].section == section {
            return Ok(false);
        }
        self.commit("item_edit_section", |state| {
            state.active_store_mut().items[index].section = section.to_string();
            Ok(true)
        })
    }

    /// Removes the item at `from` and reinserts it at `to`, then re-sorts.
    ///
    /// Returns `false` when `from == to`.
    pub fn reorder_item(&mut self, from: usize, to: usize) -> ServiceResult<bool> {
        let len = self.active_store().items.len();
        if let Err(err) = check_index("item", from, len).and(check_index("item", to, len)) {
            return self.reject("item_reorder", err);
        }
        if from == to {
            return Ok(false);
        }
        self.commit("item_reorder", |state| {
            let items = &mut state.active_store_mut().items;
            let moved = items.remove(from);
            items.insert(to, moved);
            Ok(true)
        })
    }
}
