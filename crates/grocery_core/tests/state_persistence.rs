use grocery_core::db::{open_db, open_db_in_memory};
use grocery_core::repo::state_repo::{
    CURRENT_STORE_INDEX_KEY, ITEM_SECTIONS_KEY, LEGACY_ITEMS_KEY, STORES_KEY,
};
use grocery_core::{
    GroceryService, JsonStateRepository, KvRepository, KvWrite, MemoryKvRepository, RepoError,
    RepoResult, ServiceError, SqliteKvRepository, Store, DEFAULT_SECTIONS, DEFAULT_STORE_NAME,
    FALLBACK_SECTION,
};
use serde_json::{json, Value};
use std::cell::Cell;
use std::collections::BTreeMap;

#[test]
fn first_load_seeds_default_store_and_persists_it() {
    let kv = MemoryKvRepository::new();
    let (service, report) = GroceryService::open(JsonStateRepository::new(&kv)).unwrap();

    assert!(report.first_run);
    assert_eq!(report.legacy_items_migrated, 0);
    assert_eq!(service.stores().len(), 1);

    let store = service.active_store();
    assert_eq!(store.name, DEFAULT_STORE_NAME);
    assert_eq!(store.sections.len(), DEFAULT_SECTIONS.len() + 1);
    assert_eq!(store.sections.last().unwrap(), FALLBACK_SECTION);
    assert!(store.items.is_empty());
    assert_eq!(service.item_sections().get("Bread").unwrap(), "Bakery");

    let stored: Vec<Store> = serde_json::from_str(&kv.get(STORES_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored, service.stores());
    assert_eq!(kv.get(CURRENT_STORE_INDEX_KEY).unwrap().as_deref(), Some("0"));
    assert!(kv.get(ITEM_SECTIONS_KEY).unwrap().is_some());
}

#[test]
fn legacy_item_list_moves_into_first_store_and_key_is_removed() {
    let kv = MemoryKvRepository::with_records([
        (
            STORES_KEY,
            r#"[{"name":"Main","sections":["Produce","Dairy"]},{"name":"Other","sections":["Dairy"]}]"#,
        ),
        (
            LEGACY_ITEMS_KEY,
            r#"[{"name":"Milk","section":"Dairy","completed":true},{"name":"Apple","section":"Produce"}]"#,
        ),
    ]);

    let (service, report) = GroceryService::open(JsonStateRepository::new(&kv)).unwrap();

    assert!(!report.first_run);
    assert_eq!(report.legacy_items_migrated, 2);
    let first = &service.stores()[0];
    let names: Vec<&str> = first.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["Apple", "Milk"]);
    assert!(first.items[1].completed);
    assert!(service.stores()[1].items.is_empty());
    assert_eq!(kv.get(LEGACY_ITEMS_KEY).unwrap(), None);
}

#[test]
fn legacy_items_without_stores_record_land_in_default_store() {
    let kv = MemoryKvRepository::with_records([(
        LEGACY_ITEMS_KEY,
        r#"[{"name":"Bread","section":"Bakery","completed":false}]"#,
    )]);

    let (service, report) = GroceryService::open(JsonStateRepository::new(&kv)).unwrap();

    assert!(report.first_run);
    assert_eq!(report.legacy_items_migrated, 1);
    assert_eq!(service.active_store().name, DEFAULT_STORE_NAME);
    assert_eq!(service.active_store().items.len(), 1);
}

#[test]
fn load_adds_fallback_section_and_clamps_index() {
    let kv = MemoryKvRepository::with_records([
        (STORES_KEY, r#"[{"name":"Main","sections":["Produce"],"items":[]}]"#),
        (CURRENT_STORE_INDEX_KEY, "7"),
    ]);

    let (service, report) = GroceryService::open(JsonStateRepository::new(&kv)).unwrap();

    assert!(report.repaired);
    assert_eq!(service.current_store_index(), 0);
    assert_eq!(
        service.active_store().sections,
        vec!["Produce".to_string(), FALLBACK_SECTION.to_string()]
    );
}

#[test]
fn load_drops_repeated_sections_so_deleting_one_keeps_items() {
    let kv = MemoryKvRepository::with_records([(
        STORES_KEY,
        r#"[{"name":"Main","sections":["Dairy","Produce","Dairy","Aisle Items"],
            "items":[{"name":"Milk","section":"Dairy"}]}]"#,
    )]);

    let (mut service, report) = GroceryService::open(JsonStateRepository::new(&kv)).unwrap();

    assert!(report.repaired);
    assert_eq!(
        service.active_store().sections,
        vec!["Dairy", "Produce", FALLBACK_SECTION]
    );

    service.delete_section(1).unwrap();
    assert_eq!(service.active_store().sections, vec!["Dairy", FALLBACK_SECTION]);
    assert_eq!(service.active_store().items[0].section, "Dairy");

    let stored: Value = serde_json::from_str(&kv.get(STORES_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored[0]["sections"], json!(["Dairy", FALLBACK_SECTION]));
}

#[test]
fn sqlite_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grocery.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let repo = JsonStateRepository::new(SqliteKvRepository::try_new(&conn).unwrap());
        let (mut service, _) = GroceryService::open(repo).unwrap();
        service.add_store("Corner Shop").unwrap();
        service.add_item("Milk", "Dairy").unwrap();
    }

    let conn = open_db(&path).unwrap();
    let repo = JsonStateRepository::new(SqliteKvRepository::try_new(&conn).unwrap());
    let (service, report) = GroceryService::open(repo).unwrap();

    assert!(!report.first_run);
    assert_eq!(service.stores().len(), 2);
    assert_eq!(service.current_store_index(), 1);
    assert_eq!(service.active_store().name, "Corner Shop");
    assert_eq!(service.active_store().items[0].name, "Milk");
}

#[test]
fn export_then_import_reproduces_state() {
    let conn = open_db_in_memory().unwrap();
    let source = JsonStateRepository::new(SqliteKvRepository::try_new(&conn).unwrap());
    let (mut service, _) = GroceryService::open(source).unwrap();
    service.add_section("Deli").unwrap();
    let exported = service.repository().export_records().unwrap();
    assert!(exported.contains_key(STORES_KEY));
    assert!(!exported.contains_key(LEGACY_ITEMS_KEY));

    let target_kv = MemoryKvRepository::new();
    let target = JsonStateRepository::new(&target_kv);
    assert_eq!(target.import_records(&exported).unwrap(), 3);
    let (imported, _) = GroceryService::open(target).unwrap();

    assert_eq!(imported.state(), service.state());
}

#[test]
fn import_accepts_browser_dump_with_string_values_and_ignores_unknown_keys() {
    let mut dump: BTreeMap<String, Value> = BTreeMap::new();
    dump.insert(
        STORES_KEY.to_string(),
        Value::String(r#"[{"name":"Home","sections":["Dairy"]}]"#.to_string()),
    );
    dump.insert(
        LEGACY_ITEMS_KEY.to_string(),
        Value::String(r#"[{"name":"Milk","section":"Dairy","completed":false}]"#.to_string()),
    );
    dump.insert("theme".to_string(), json!("dark"));

    let kv = MemoryKvRepository::new();
    let repo = JsonStateRepository::new(&kv);
    assert_eq!(repo.import_records(&dump).unwrap(), 2);
    assert_eq!(kv.get("theme").unwrap(), None);

    let (service, report) = GroceryService::open(repo).unwrap();
    assert_eq!(report.legacy_items_migrated, 1);
    assert_eq!(service.active_store().name, "Home");
    assert_eq!(service.active_store().items[0].section, "Dairy");
}

#[test]
fn import_rejects_string_value_that_is_not_json() {
    let mut dump: BTreeMap<String, Value> = BTreeMap::new();
    dump.insert(STORES_KEY.to_string(), json!("not json"));

    let kv = MemoryKvRepository::new();
    let err = JsonStateRepository::new(&kv)
        .import_records(&dump)
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData { .. }));
    assert!(kv.keys().unwrap().is_empty());
}

/// Record store whose writes can be switched to fail.
#[derive(Default)]
struct FlakyKv {
    inner: MemoryKvRepository,
    fail_writes: Cell<bool>,
}

impl KvRepository for FlakyKv {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        self.inner.get(key)
    }

    fn write_batch(&self, writes: &[KvWrite]) -> RepoResult<()> {
        if self.fail_writes.get() {
            return Err(RepoError::InvalidData {
                key: "batch".to_string(),
                message: "disk full".to_string(),
            });
        }
        self.inner.write_batch(writes)
    }

    fn keys(&self) -> RepoResult<Vec<String>> {
        self.inner.keys()
    }
}

#[test]
fn failed_save_leaves_in_memory_state_untouched() {
    let kv = FlakyKv::default();
    let (mut service, _) = GroceryService::open(JsonStateRepository::new(&kv)).unwrap();
    service.add_item("Milk", "Dairy").unwrap();
    let before = service.state().clone();

    kv.fail_writes.set(true);
    let err = service.add_section("Deli").unwrap_err();
    assert!(matches!(err, ServiceError::Repo(_)));
    let err = service.delete_item(0).unwrap_err();
    assert!(matches!(err, ServiceError::Repo(_)));

    assert_eq!(service.state(), &before);
}
