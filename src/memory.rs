//! In-process implementation of [`KeyValueStore`].
//!
//! Behaves like a single Redis instance for the primitives the engine uses:
//! string values, per-key expiry (checked lazily on access), integer
//! counters, glob-style KEYS. Cloning a `MemoryStore` gives a new handle
//! onto the same data, the way two clients share one server, and each handle
//! has its own connection state.
//!
//! The store can be taken offline or have its connections dropped, which
//! makes it the stand-in for an unreachable server in tests.

use globset::Glob;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::entry::Entry;
use crate::error::{StoreError, StoreResult};
use crate::store::KeyValueStore;

#[derive(Debug)]
struct Shared {
    entries: RwLock<IndexMap<String, Entry>>,
    online: AtomicBool,
    /// Bumped to invalidate every open handle.
    epoch: AtomicU64,
    open: AtomicU64,
    calls: AtomicU64,
}

/// A shared in-memory key-value store.
#[derive(Debug)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    /// Epoch this handle connected in, if any.
    connected_epoch: Option<u64>,
}

impl MemoryStore {
    /// Create an empty, online store. The handle starts disconnected.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: RwLock::new(IndexMap::new()),
                online: AtomicBool::new(true),
                epoch: AtomicU64::new(0),
                open: AtomicU64::new(0),
                calls: AtomicU64::new(0),
            }),
            connected_epoch: None,
        }
    }

    /// Take the store offline or bring it back. While offline every call,
    /// including `connect`, fails with a connection error.
    pub fn set_online(&self, online: bool) {
        self.shared.online.store(online, Ordering::SeqCst);
    }

    /// Drop every open connection, as if the server restarted.
    pub fn drop_connections(&self) {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        self.shared.open.store(0, Ordering::SeqCst);
    }

    /// Number of handles currently holding an open connection.
    pub fn open_connections(&self) -> u64 {
        self.shared.open.load(Ordering::SeqCst)
    }

    /// Number of data calls served so far, across all handles.
    pub fn call_count(&self) -> u64 {
        self.shared.calls.load(Ordering::SeqCst)
    }

    /// Read a raw stored value without going through a connection.
    pub fn peek(&self, key: &str) -> Option<String> {
        let entries = self.read_lock().ok()?;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(Entry::as_string)
    }

    /// Number of entries, possibly including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.read_lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all expired entries and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = match self.write_lock() {
            Ok(e) => e,
            Err(_) => return 0,
        };

        let initial_len = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        initial_len - entries.len()
    }

    // Private helper methods

    /// Gate every data call: count it, then check the server and the
    /// connection.
    fn begin_call(&self) -> StoreResult<()> {
        self.shared.calls.fetch_add(1, Ordering::SeqCst);
        if !self.shared.online.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("store offline".to_string()));
        }
        if !self.is_connected() {
            return Err(StoreError::NotConnected);
        }
        Ok(())
    }

    fn read_lock(&self) -> StoreResult<RwLockReadGuard<'_, IndexMap<String, Entry>>> {
        self.shared
            .entries
            .read()
            .map_err(|_| StoreError::Connection("store lock poisoned".to_string()))
    }

    fn write_lock(&self) -> StoreResult<RwLockWriteGuard<'_, IndexMap<String, Entry>>> {
        self.shared
            .entries
            .write()
            .map_err(|_| StoreError::Connection("store lock poisoned".to_string()))
    }

    /// Get a live entry, dropping it first if it has expired.
    fn live<'a>(entries: &'a mut IndexMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
        if entries.get(key).is_some_and(Entry::is_expired) {
            entries.shift_remove(key);
        }
        entries.get_mut(key)
    }

    fn add_to(&mut self, key: &str, delta: i64) -> StoreResult<i64> {
        self.begin_call()?;
        let mut entries = self.write_lock()?;

        let current = match Self::live(&mut entries, key) {
            Some(entry) => entry.as_string().parse::<i64>().map_err(|_| {
                StoreError::Response("value is not an integer or out of range".to_string())
            })?,
            None => 0,
        };
        let next = current.checked_add(delta).ok_or_else(|| {
            StoreError::Response("increment or decrement would overflow".to_string())
        })?;

        match Self::live(&mut entries, key) {
            Some(entry) => entry.replace_value(next.to_string()),
            None => {
                entries.insert(key.to_string(), Entry::new(next.to_string()));
            }
        }
        Ok(next)
    }
}

// A clone is a new client on the same data; it starts disconnected.
impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            connected_epoch: None,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn connect(&mut self) -> StoreResult<()> {
        if !self.shared.online.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("connection refused".to_string()));
        }
        if !self.is_connected() {
            self.connected_epoch = Some(self.shared.epoch.load(Ordering::SeqCst));
            self.shared.open.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected_epoch == Some(self.shared.epoch.load(Ordering::SeqCst))
    }

    fn disconnect(&mut self) {
        if self.is_connected() {
            self.shared.open.fetch_sub(1, Ordering::SeqCst);
        }
        self.connected_epoch = None;
    }

    fn get(&mut self, key: &str) -> StoreResult<Option<String>> {
        self.begin_call()?;
        let mut entries = self.write_lock()?;
        Ok(Self::live(&mut entries, key).map(|entry| entry.as_string()))
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.begin_call()?;
        let mut entries = self.write_lock()?;
        entries.insert(key.to_string(), Entry::new(value.to_string()));
        Ok(())
    }

    fn set_with_expiry(&mut self, key: &str, value: &str, seconds: u64) -> StoreResult<()> {
        self.begin_call()?;
        let entry = match seconds {
            0 => None,
            _ => Entry::with_ttl(value.to_string(), Duration::from_secs(seconds)),
        }
        .ok_or_else(|| invalid_expire_time("setex"))?;

        let mut entries = self.write_lock()?;
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    fn set_if_absent(&mut self, key: &str, value: &str) -> StoreResult<bool> {
        self.begin_call()?;
        let mut entries = self.write_lock()?;
        if Self::live(&mut entries, key).is_some() {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry::new(value.to_string()));
        Ok(true)
    }

    fn expire(&mut self, key: &str, seconds: u64) -> StoreResult<bool> {
        self.begin_call()?;
        let mut entries = self.write_lock()?;
        match Self::live(&mut entries, key) {
            Some(entry) => {
                if !entry.expire_in(Duration::from_secs(seconds)) {
                    return Err(invalid_expire_time("expire"));
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn incr_by(&mut self, key: &str, delta: i64) -> StoreResult<i64> {
        self.add_to(key, delta)
    }

    fn decr_by(&mut self, key: &str, delta: i64) -> StoreResult<i64> {
        let delta = delta
            .checked_neg()
            .ok_or_else(|| StoreError::Response("decrement would overflow".to_string()))?;
        self.add_to(key, delta)
    }

    fn del(&mut self, keys: &[String]) -> StoreResult<u64> {
        self.begin_call()?;
        let mut entries = self.write_lock()?;
        let mut removed = 0;
        for key in keys {
            if let Some(entry) = entries.shift_remove(key.as_str()) {
                if !entry.is_expired() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    fn keys_matching(&mut self, pattern: &str) -> StoreResult<Vec<String>> {
        self.begin_call()?;
        let matcher = Glob::new(pattern)
            .map_err(|e| StoreError::Response(format!("invalid pattern '{}': {}", pattern, e)))?
            .compile_matcher();

        let entries = self.read_lock()?;
        let now = Instant::now();
        Ok(entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired_at(now) && matcher.is_match(key.as_str()))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

fn invalid_expire_time(command: &str) -> StoreError {
    StoreError::Response(format!("invalid expire time in '{}' command", command))
}
