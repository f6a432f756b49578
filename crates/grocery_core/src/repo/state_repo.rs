//! Typed grocery state records on top of the key-value adapter.
//!
//! # Responsibility
//! - Decode/encode the `stores`, `currentStoreIndex` and `itemSections`
//!   records.
//! - Seed first-run state and migrate the legacy flat `items` record.
//! - Export/import raw records as one JSON object.
//!
//! # Invariants
//! - Every save removes the legacy `items` record in the same batch, so a
//!   migration is committed together with the state that absorbed it.
//! - Loaded state is normalized before it is returned.

use crate::model::state::{default_item_sections, GroceryState, ItemSections};
use crate::model::store::{Item, Store, DEFAULT_STORE_NAME};
use crate::repo::kv_repo::{KvRepository, KvWrite, RepoError, RepoResult};
use log::info;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Record holding the store list.
pub const STORES_KEY: &str = "stores";
/// Record holding the active store index.
pub const CURRENT_STORE_INDEX_KEY: &str = "currentStoreIndex";
/// Pre-multi-store flat item list, migrated on load.
pub const LEGACY_ITEMS_KEY: &str = "items";
/// Record holding the item-to-section cache.
pub const ITEM_SECTIONS_KEY: &str = "itemSections";

const KNOWN_KEYS: &[&str] = &[
    STORES_KEY,
    CURRENT_STORE_INDEX_KEY,
    LEGACY_ITEMS_KEY,
    ITEM_SECTIONS_KEY,
];

/// What `load_state` had to do to produce a valid state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// No `stores` record existed.
    pub first_run: bool,
    /// Items moved from the legacy flat list into the first store.
    pub legacy_items_migrated: usize,
    /// Persisted state violated an invariant and was repaired.
    pub repaired: bool,
}

/// Typed access to persisted grocery state.
pub trait StateRepository {
    /// Loads, migrates and normalizes state.
    fn load_state(&self) -> RepoResult<(GroceryState, LoadReport)>;
    /// Persists the whole state atomically.
    fn save_state(&self, state: &GroceryState) -> RepoResult<()>;
}

/// `StateRepository` storing each record as JSON text.
pub struct JsonStateRepository<K: KvRepository> {
    kv: K,
}

impl<K: KvRepository> JsonStateRepository<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Underlying record store.
    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Returns every known record as parsed JSON, keyed by record name.
    pub fn export_records(&self) -> RepoResult<BTreeMap<String, Value>> {
        let mut records = BTreeMap::new();
        for key in KNOWN_KEYS {
            if let Some(raw) = self.kv.get(key)? {
                let value = serde_json::from_str::<Value>(&raw).map_err(|err| {
                    RepoError::InvalidData {
                        key: key.to_string(),
                        message: err.to_string(),
                    }
                })?;
                records.insert(key.to_string(), value);
            }
        }
        Ok(records)
    }

    /// Writes known records from an exported object, ignoring other keys.
    ///
    /// String values are treated as raw JSON text, which is how a browser
    /// `localStorage` dump stores them. Returns the number of records
    /// written.
    pub fn import_records(&self, records: &BTreeMap<String, Value>) -> RepoResult<usize> {
        let mut writes = Vec::new();
        for key in KNOWN_KEYS {
            let Some(value) = records.get(*key) else {
                continue;
            };
            let raw = match value {
                Value::String(text) => {
                    serde_json::from_str::<Value>(text).map_err(|err| RepoError::InvalidData {
                        key: key.to_string(),
                        message: err.to_string(),
                    })?;
                    text.clone()
                }
                other => other.to_string(),
            };
            writes.push(KvWrite::put(key, raw));
        }
        self.kv.write_batch(&writes)?;
        info!(
            "event=records_import module=repo status=ok records={}",
            writes.len()
        );
        Ok(writes.len())
    }

    fn read_record<T: DeserializeOwned>(&self, key: &str) -> RepoResult<Option<T>> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str::<Option<T>>(&raw).map_err(|err| RepoError::InvalidData {
            key: key.to_string(),
            message: err.to_string(),
        })
    }
}

impl<K: KvRepository> StateRepository for JsonStateRepository<K> {
    fn load_state(&self) -> RepoResult<(GroceryState, LoadReport)> {
        let mut report = LoadReport::default();

        let stored = self.read_record::<Vec<Store>>(STORES_KEY)?;
        report.first_run = stored.is_none();
        let mut stores =
            stored.unwrap_or_else(|| vec![Store::with_default_sections(DEFAULT_STORE_NAME)]);

        if let Some(legacy) = self.read_record::<Vec<Item>>(LEGACY_ITEMS_KEY)? {
            if stores.is_empty() {
                stores.push(Store::with_default_sections(DEFAULT_STORE_NAME));
            }
            report.legacy_items_migrated = legacy.len();
            stores[0].items.extend(legacy);
        }

        let raw_index = self
            .read_record::<i64>(CURRENT_STORE_INDEX_KEY)?
            .unwrap_or(0);
        let current_store_index = usize::try_from(raw_index).unwrap_or(usize::MAX);

        let item_sections = self
            .read_record::<ItemSections>(ITEM_SECTIONS_KEY)?
            .unwrap_or_else(default_item_sections);

        let mut state = GroceryState {
            stores,
            current_store_index,
            item_sections,
        };
        report.repaired = state.normalize();

        info!(
            "event=state_load module=repo status=ok first_run={} stores={} legacy_items_migrated={} repaired={}",
            report.first_run,
            state.stores.len(),
            report.legacy_items_migrated,
            report.repaired
        );
        Ok((state, report))
    }

    fn save_state(&self, state: &GroceryState) -> RepoResult<()> {
        let encode = |key: &str, result: serde_json::Result<String>| {
            result.map_err(|err| RepoError::InvalidData {
                key: key.to_string(),
                message: err.to_string(),
            })
        };
        let writes = [
            KvWrite::put(
                STORES_KEY,
                encode(STORES_KEY, serde_json::to_string(&state.stores))?,
            ),
            KvWrite::put(
                CURRENT_STORE_INDEX_KEY,
                state.current_store_index.to_string(),
            ),
            KvWrite::put(
                ITEM_SECTIONS_KEY,
                encode(
                    ITEM_SECTIONS_KEY,
                    serde_json::to_string(&state.item_sections),
                )?,
            ),
            KvWrite::remove(LEGACY_ITEMS_KEY),
        ];
        self.kv.write_batch(&writes)
    }
}
