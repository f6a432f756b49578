//! Key-value persistence adapter.
//!
//! # Responsibility
//! - Provide string-keyed JSON text records with atomic batch writes.
//! - Offer a SQLite implementation and an in-memory one.
//!
//! # Invariants
//! - `write_batch` applies every write or none of them.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for record persistence and decoding.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Connection was handed over before migrations created the table.
    SchemaNotReady,
    /// A persisted record exists but cannot be decoded.
    InvalidData { key: String, message: String },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::SchemaNotReady => write!(f, "kv_records table is missing; run migrations first"),
            Self::InvalidData { key, message } => {
                write!(f, "invalid persisted record `{key}`: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::SchemaNotReady | Self::InvalidData { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One mutation inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Put { key: String, value: String },
    Remove { key: String },
}

impl KvWrite {
    pub fn put(key: &str, value: impl Into<String>) -> Self {
        Self::Put {
            key: key.to_string(),
            value: value.into(),
        }
    }

    pub fn remove(key: &str) -> Self {
        Self::Remove {
            key: key.to_string(),
        }
    }
}

/// Synchronous string-keyed record store.
pub trait KvRepository {
    /// Reads one raw record.
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    /// Applies all writes atomically.
    fn write_batch(&self, writes: &[KvWrite]) -> RepoResult<()>;
    /// Lists stored keys in ascending order.
    fn keys(&self) -> RepoResult<Vec<String>>;
}

impl<K: KvRepository + ?Sized> KvRepository for &K {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).get(key)
    }

    fn write_batch(&self, writes: &[KvWrite]) -> RepoResult<()> {
        (**self).write_batch(writes)
    }

    fn keys(&self) -> RepoResult<Vec<String>> {
        (**self).keys()
    }
}

/// SQLite-backed record store over the `kv_records` table.
pub struct SqliteKvRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvRepository<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `SchemaNotReady` when `kv_records` does not exist.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_records'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::SchemaNotReady);
        }
        Ok(Self { conn })
    }
}

impl KvRepository for SqliteKvRepository<'_> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_records WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_batch(&self, writes: &[KvWrite]) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for write in writes {
            match write {
                KvWrite::Put { key, value } => {
                    tx.execute(
                        "INSERT INTO kv_records (key, value) VALUES (?1, ?2)
                         ON CONFLICT(key) DO UPDATE SET
                            value = excluded.value,
                            updated_at = (strftime('%s', 'now') * 1000);",
                        params![key, value],
                    )?;
                }
                KvWrite::Remove { key } => {
                    tx.execute("DELETE FROM kv_records WHERE key = ?1;", [key])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn keys(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_records ORDER BY key ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

/// In-memory record store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryKvRepository {
    records: RefCell<BTreeMap<String, String>>,
}

impl MemoryKvRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with raw records.
    pub fn with_records<I, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            records: RefCell::new(
                records
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
        }
    }
}

impl KvRepository for MemoryKvRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.records.borrow().get(key).cloned())
    }

    fn write_batch(&self, writes: &[KvWrite]) -> RepoResult<()> {
        let mut records = self.records.borrow_mut();
        for write in writes {
            match write {
                KvWrite::Put { key, value } => {
                    records.insert(key.clone(), value.clone());
                }
                KvWrite::Remove { key } => {
                    records.remove(key);
                }
            }
        }
        Ok(())
    }

    fn keys(&self) -> RepoResult<Vec<String>> {
        Ok(self.records.borrow().keys().cloned().collect())
    }
}
