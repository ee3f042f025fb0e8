//! Key-value store abstraction.
//!
//! # Responsibility
//! - Define the storage contract every service is written against.
//! - Provide an all-or-nothing transaction boundary for read-modify-write
//!   sequences over one or more keys.
//!
//! # Invariants
//! - Every successful write bumps the key's `version` by exactly one.
//! - A transaction closure that returns `Err` leaves the store unchanged.
//! - `compare_and_set` never writes when the observed version differs.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite_store;

pub use sqlite_store::SqliteKvStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by key-value store backends.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Backend schema is missing the required table.
    MissingTable(&'static str),
    /// Optimistic write observed a different version than expected.
    VersionConflict {
        key: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingTable(table) => write!(f, "store table `{table}` is missing"),
            Self::VersionConflict {
                key,
                expected,
                actual,
            } => write!(
                f,
                "version conflict on `{key}`: expected {}, found {}",
                describe_version(*expected),
                describe_version(*actual)
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

fn describe_version(version: Option<u64>) -> String {
    version.map_or_else(|| "absent".to_string(), |value| value.to_string())
}

/// One stored value with its write metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub value: String,
    /// Starts at 1 and increases on every write to the key.
    pub version: u64,
    /// Epoch milliseconds of the last write.
    pub updated_at: i64,
}

/// Read/write operations available on a store handle and inside a
/// transaction scope.
pub trait KvAccess {
    /// Reads one entry with its version metadata.
    fn get_entry(&self, key: &str) -> StoreResult<Option<StoredEntry>>;

    /// Writes a value and returns the key's new version.
    fn set(&self, key: &str, value: &str) -> StoreResult<u64>;

    /// Removes a key. Returns whether it existed.
    fn remove(&self, key: &str) -> StoreResult<bool>;

    /// Lists keys starting with `prefix`, sorted ascending.
    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Reads one value without metadata.
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.get_entry(key)?.map(|entry| entry.value))
    }
}

/// Store handle with transactional and optimistic write support.
pub trait KvStore: KvAccess {
    /// Runs `f` inside one exclusive write transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`.
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn KvAccess) -> Result<T, E>,
        E: From<StoreError>;

    /// Writes `value` only when the key's current version equals
    /// `expected_version` (`None` means the key must be absent).
    fn compare_and_set(
        &self,
        key: &str,
        expected_version: Option<u64>,
        value: &str,
    ) -> StoreResult<u64>;
}
