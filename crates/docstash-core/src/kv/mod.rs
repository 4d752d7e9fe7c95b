//! Key-value persistence abstraction for docstash.
//!
//! The [`KeyValueStore`] trait is the only persistence primitive the core
//! relies on: exact-key get, set and remove over string values, plus two
//! atomic primitives that several processes may run against one store at
//! once. There is no scan or query operation.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

/// Read-modify-write step for [`KeyValueStore::update`].
///
/// Receives the current value and returns the value to store, or `None` to
/// leave the key untouched. An error aborts the update without writing.
pub type UpdateFn<'a> = dyn FnMut(Option<String>) -> Result<Option<String>> + Send + 'a;

/// Abstract durable string store.
///
/// All operations are async (via `async-trait`). The in-memory
/// implementation returns immediately-ready futures.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](KeyValueStore::get) | Read one key; `None` when absent |
/// | [`set`](KeyValueStore::set) | Write one key, replacing any value |
/// | [`remove`](KeyValueStore::remove) | Delete one key; absent keys are not an error |
/// | [`insert_new`](KeyValueStore::insert_new) | Write several keys atomically, only if none exist yet |
/// | [`update`](KeyValueStore::update) | Read, transform and write one key with no other writer in between |
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Store every pair, or none of them.
    ///
    /// Returns `Ok(false)` without writing anything when any of the keys
    /// already holds a value.
    async fn insert_new(&self, entries: &[(String, String)]) -> Result<bool>;

    /// Atomically replace the value under `key` with `apply(current)`.
    ///
    /// No other writer, in this process or another one sharing the
    /// backend, can change `key` between the read and the write. `apply`
    /// runs exactly once.
    async fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<()>;
}
