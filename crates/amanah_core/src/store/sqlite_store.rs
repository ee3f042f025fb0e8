//! SQLite-backed key-value store.
//!
//! Entries live in the `kv_entries` table created by migration 1.
//! Transactions use `BEGIN IMMEDIATE`, so a second connection on the same
//! database file blocks (up to the busy timeout) instead of interleaving a
//! stale read-modify-write.

use super::{KvAccess, KvStore, StoreError, StoreResult, StoredEntry};
use crate::model::now_epoch_ms;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

const KV_TABLE: &str = "kv_entries";

/// Key-value store over a migrated SQLite connection.
#[derive(Clone, Copy)]
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `MissingTable` when the connection has not been migrated.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [KV_TABLE],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(StoreError::MissingTable(KV_TABLE));
        }
        Ok(Self { conn })
    }
}

impl KvAccess for SqliteKvStore<'_> {
    fn get_entry(&self, key: &str) -> StoreResult<Option<StoredEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT value, version, updated_at FROM kv_entries WHERE key = ?1;",
                [key],
                |row| {
                    Ok(StoredEntry {
                        value: row.get(0)?,
                        version: row.get::<_, i64>(1)? as u64,
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<u64> {
        let version: i64 = self.conn.query_row(
            "INSERT INTO kv_entries (key, value, version, updated_at)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                version = kv_entries.version + 1,
                updated_at = excluded.updated_at
             RETURNING version;",
            params![key, value, now_epoch_ms()],
            |row| row.get(0),
        )?;
        debug!(
            "event=kv_set module=store status=ok key={key} version={version} bytes={}",
            value.len()
        );
        Ok(version as u64)
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_entries WHERE substr(key, 1, ?2) = ?1 ORDER BY key ASC;")?;
        let mut rows = stmt.query(params![prefix, prefix.chars().count() as i64])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get(0)?);
        }
        Ok(keys)
    }
}

impl KvStore for SqliteKvStore<'_> {
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn KvAccess) -> Result<T, E>,
        E: From<StoreError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        let scoped = SqliteKvStore { conn: &tx };

        match f(&scoped) {
            Ok(value) => {
                tx.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=kv_transaction module=store status=error error_code=rollback_failed error={rollback_err}"
                    );
                }
                Err(err)
            }
        }
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected_version: Option<u64>,
        value: &str,
    ) -> StoreResult<u64> {
        self.transaction(|access| {
            let actual = access.get_entry(key)?.map(|entry| entry.version);
            if actual != expected_version {
                warn!(
                    "event=kv_cas module=store status=rejected key={key} error_code=version_conflict"
                );
                return Err(StoreError::VersionConflict {
                    key: key.to_string(),
                    expected: expected_version,
                    actual,
                });
            }
            access.set(key, value)
        })
    }
}
