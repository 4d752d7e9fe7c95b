//! In-memory [`KeyValueStore`] implementation for tests and embedding.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Faults can be injected per
//! key prefix so partial-failure paths can be exercised without a real
//! backend.

use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{KeyValueStore, UpdateFn};

#[derive(Default)]
struct Faults {
    reads: Vec<String>,
    writes: Vec<String>,
    removes: Vec<String>,
}

fn matches_any(prefixes: &[String], key: &str) -> bool {
    prefixes.iter().any(|p| key.starts_with(p.as_str()))
}

/// In-memory store for testing.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    faults: RwLock<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read of a key starting with `prefix` fail.
    pub fn fail_reads_matching(&self, prefix: &str) {
        write_lock(&self.faults).reads.push(prefix.to_string());
    }

    /// Make every write of a key starting with `prefix` fail.
    ///
    /// An `insert_new` touching such a key fails as a whole, and an
    /// `update` of such a key fails once it tries to write.
    pub fn fail_writes_matching(&self, prefix: &str) {
        write_lock(&self.faults).writes.push(prefix.to_string());
    }

    /// Make every removal of a key starting with `prefix` fail.
    pub fn fail_removes_matching(&self, prefix: &str) {
        write_lock(&self.faults).removes.push(prefix.to_string());
    }

    pub fn clear_faults(&self) {
        *write_lock(&self.faults) = Faults::default();
    }

    /// Sorted snapshot of every live key.
    pub fn keys(&self) -> BTreeSet<String> {
        read_lock(&self.entries).keys().cloned().collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        read_lock(&self.entries).contains_key(key)
    }

    /// Write directly, bypassing fault injection.
    pub fn insert_raw(&self, key: &str, value: &str) {
        write_lock(&self.entries).insert(key.to_string(), value.to_string());
    }

    /// Remove directly, bypassing fault injection.
    pub fn remove_raw(&self, key: &str) {
        write_lock(&self.entries).remove(key);
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if matches_any(&read_lock(&self.faults).reads, key) {
            bail!("simulated read failure for key '{}'", key);
        }
        Ok(read_lock(&self.entries).get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if matches_any(&read_lock(&self.faults).writes, key) {
            bail!("simulated write failure for key '{}'", key);
        }
        write_lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if matches_any(&read_lock(&self.faults).removes, key) {
            bail!("simulated remove failure for key '{}'", key);
        }
        write_lock(&self.entries).remove(key);
        Ok(())
    }

    async fn insert_new(&self, entries: &[(String, String)]) -> Result<bool> {
        {
            let faults = read_lock(&self.faults);
            if let Some((key, _)) = entries.iter().find(|(k, _)| matches_any(&faults.writes, k)) {
                bail!("simulated write failure for key '{}'", key);
            }
        }
        let mut map = write_lock(&self.entries);
        if entries.iter().any(|(key, _)| map.contains_key(key)) {
            return Ok(false);
        }
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        Ok(true)
    }

    async fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<()> {
        let write_fails = {
            let faults = read_lock(&self.faults);
            if matches_any(&faults.reads, key) {
                bail!("simulated read failure for key '{}'", key);
            }
            matches_any(&faults.writes, key)
        };
        let mut map = write_lock(&self.entries);
        if let Some(next) = apply(map.get(key).cloned())? {
            if write_fails {
                bail!("simulated write failure for key '{}'", key);
            }
            map.insert(key.to_string(), next);
        }
        Ok(())
    }
}
