//! Generic whole-collection load/save over `KvAccess`.

use super::{RepoError, RepoResult};
use crate::store::KvAccess;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// What a missing collection reads as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeedMode {
    /// Write and return the built-in demo dataset.
    #[default]
    Demo,
    /// Return an empty collection and write nothing.
    Empty,
}

impl SeedMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "demo" => Some(Self::Demo),
            "empty" | "none" => Some(Self::Empty),
            _ => None,
        }
    }
}

/// A record type bound to its storage key and seed dataset.
pub struct Collection<T> {
    key: &'static str,
    defaults: fn(i64) -> Vec<T>,
}

impl<T> Collection<T> {
    pub const fn new(key: &'static str, defaults: fn(i64) -> Vec<T>) -> Self {
        Self { key, defaults }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl<T: Serialize + DeserializeOwned> Collection<T> {
    /// Loads the whole collection.
    ///
    /// Missing: seeded per `seed`. Undecodable: logged, defaults returned,
    /// stored value left in place.
    pub fn load(&self, access: &dyn KvAccess, seed: SeedMode, now_ms: i64) -> RepoResult<Vec<T>> {
        let Some(raw) = access.get(self.key)? else {
            return match seed {
                SeedMode::Demo => {
                    let defaults = (self.defaults)(now_ms);
                    if !defaults.is_empty() {
                        self.save(access, &defaults)?;
                        info!(
                            "event=collection_seed module=repo status=ok key={} count={}",
                            self.key,
                            defaults.len()
                        );
                    }
                    Ok(defaults)
                }
                SeedMode::Empty => Ok(Vec::new()),
            };
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => Ok(items),
            Err(err) => {
                warn!(
                    "event=collection_load module=repo status=error key={} error_code=decode_failed error={}",
                    self.key, err
                );
                Ok(match seed {
                    SeedMode::Demo => (self.defaults)(now_ms),
                    SeedMode::Empty => Vec::new(),
                })
            }
        }
    }

    /// Replaces the whole collection.
    pub fn save(&self, access: &dyn KvAccess, items: &[T]) -> RepoResult<()> {
        let encoded = serde_json::to_string(items).map_err(|source| RepoError::Encode {
            key: self.key.to_string(),
            source,
        })?;
        access.set(self.key, &encoded)?;
        Ok(())
    }
}

/// Loads a single JSON value. Undecodable values read as `None`.
pub fn load_value<T: DeserializeOwned>(access: &dyn KvAccess, key: &str) -> RepoResult<Option<T>> {
    let Some(raw) = access.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!(
                "event=value_load module=repo status=error key={key} error_code=decode_failed error={err}"
            );
            Ok(None)
        }
    }
}

pub fn save_value<T: Serialize + ?Sized>(access: &dyn KvAccess, key: &str, value: &T) -> RepoResult<()> {
    let encoded = serde_json::to_string(value).map_err(|source| RepoError::Encode {
        key: key.to_string(),
        source,
    })?;
    access.set(key, &encoded)?;
    Ok(())
}

pub fn remove_value(access: &dyn KvAccess, key: &str) -> RepoResult<bool> {
    Ok(access.remove(key)?)
}
