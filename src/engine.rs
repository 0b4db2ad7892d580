//! The cache engine.
//!
//! [`RedisEngine`] implements the [`CacheEngine`] contract on top of any
//! [`KeyValueStore`]. It owns its store handle and settings, derives
//! physical keys from the configured prefix, runs values through the
//! [`codec`](crate::codec), and sends every store result through the
//! [`FailurePolicy`].
//!
//! A dropped connection is re-opened lazily on the next call. When the
//! engine goes out of scope the connection is closed, unless the settings
//! ask for a persistent one.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::codec;
use crate::config::RedisConfig;
use crate::error::{EngineError, EngineResult, StoreResult};
use crate::groups;
use crate::operation::Operation;
use crate::policy::FailurePolicy;
use crate::redis_store::RedisStore;
use crate::settings::EngineSettings;
use crate::stats::{EngineStats, StatsSnapshot};
use crate::store::KeyValueStore;

/// The operations a host framework expects from a cache engine.
///
/// Failures follow the engine's failure policy: with `throw_exceptions`
/// off, a store outage never produces an `Err`, only the fallback values
/// documented on each method.
pub trait CacheEngine {
    /// Settings the engine was built with.
    fn settings(&self) -> &EngineSettings;

    /// Fetch a value. `Ok(None)` is a miss.
    fn read(&mut self, key: &str) -> EngineResult<Option<Value>>;

    /// Store a value. A `duration_secs` of 0 stores it without expiry.
    /// Returns `true` on a suppressed failure too.
    fn write(&mut self, key: &str, value: &Value, duration_secs: u64) -> EngineResult<bool>;

    /// Atomically add `offset` and return the new value. `Ok(None)` on a
    /// suppressed failure.
    fn increment(&mut self, key: &str, offset: i64) -> EngineResult<Option<i64>>;

    /// Atomically subtract `offset` and return the new value. `Ok(None)` on
    /// a suppressed failure.
    fn decrement(&mut self, key: &str, offset: i64) -> EngineResult<Option<i64>>;

    /// Remove a key. `true` only if something was removed.
    fn delete(&mut self, key: &str) -> EngineResult<bool>;

    /// With `check` set, report whether clearing is supported without
    /// touching the store. Otherwise remove every key under the prefix.
    fn clear(&mut self, check: bool) -> EngineResult<bool>;

    /// Current token of every configured group. Empty on a suppressed
    /// failure.
    fn groups(&mut self) -> EngineResult<Vec<String>>;

    /// Invalidate every key built from the group's current token.
    fn clear_group(&mut self, group: &str) -> EngineResult<bool>;

    /// Store a value only if the key does not exist yet.
    fn add(&mut self, key: &str, value: &Value, duration_secs: u64) -> EngineResult<bool>;

    /// Expiry is left to the store, so there is nothing to collect.
    fn gc(&mut self) -> bool {
        true
    }
}

/// A cache engine over a remote key-value store.
#[derive(Debug)]
pub struct RedisEngine<S: KeyValueStore = RedisStore> {
    store: S,
    settings: EngineSettings,
    policy: FailurePolicy,
    stats: Arc<EngineStats>,
}

impl RedisEngine<RedisStore> {
    /// Build an engine for the cache server described by `config`.
    ///
    /// Fails with [`EngineError::Unavailable`] if the client cannot be
    /// created from the configuration.
    pub fn from_config(config: &RedisConfig, settings: EngineSettings) -> EngineResult<Self> {
        let store = config.cache_store()?;
        Self::init(store, settings)
    }
}

impl<S: KeyValueStore> RedisEngine<S> {
    /// Create an engine and connect it.
    ///
    /// A failed connection is handled by the failure policy: in the default
    /// mode the engine is still returned and reconnects on first use.
    pub fn init(store: S, settings: EngineSettings) -> EngineResult<Self> {
        let settings = settings.build()?;
        let mut engine = Self {
            store,
            policy: FailurePolicy::from_throw_exceptions(settings.throw_exceptions),
            settings,
            stats: Arc::new(EngineStats::new()),
        };
        engine.connect()?;
        Ok(engine)
    }

    /// Open the connection if it is not already open.
    ///
    /// Returns `Ok(false)` for a suppressed connection failure.
    pub fn connect(&mut self) -> EngineResult<bool> {
        if self.store.is_connected() {
            return Ok(true);
        }

        let result = self.store.connect();
        match self.policy.resolve(Operation::Connect, result, &self.stats)? {
            Some(()) => {
                debug!(prefix = %self.settings.prefix, "cache engine connected");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether the store connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.store.is_connected()
    }

    /// Close the connection now, regardless of `persistent`.
    pub fn close(mut self) {
        self.store.disconnect();
    }

    /// Get a snapshot of the engine statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Get a reference to the internal statistics counter.
    pub fn stats_ref(&self) -> Arc<EngineStats> {
        Arc::clone(&self.stats)
    }

    /// The store key for a caller key.
    pub fn physical_key(&self, key: &str) -> EngineResult<String> {
        if key.is_empty() {
            return Err(EngineError::InvalidKey("key must not be empty".to_string()));
        }
        Ok(format!("{}{}", self.settings.prefix, key))
    }

    /// Run `f` against a connected store and resolve the outcome through
    /// the failure policy. `Ok(None)` means the failure was suppressed.
    fn call<T>(
        &mut self,
        operation: Operation,
        f: impl FnOnce(&mut S, &EngineSettings) -> StoreResult<T>,
    ) -> EngineResult<Option<T>> {
        let result = reconnect(&mut self.store).and_then(|()| f(&mut self.store, &self.settings));
        self.policy.resolve(operation, result, &self.stats)
    }
}

fn reconnect<S: KeyValueStore>(store: &mut S) -> StoreResult<()> {
    if store.is_connected() {
        return Ok(());
    }
    debug!("cache store connection lost, reconnecting");
    store.connect()
}

impl<S: KeyValueStore> CacheEngine for RedisEngine<S> {
    fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn read(&mut self, key: &str) -> EngineResult<Option<Value>> {
        let key = self.physical_key(key)?;
        let stored = self.call(Operation::Read, |store, _| store.get(&key))?.flatten();

        match stored {
            Some(raw) => {
                self.stats.record_hit();
                Ok(Some(codec::decode(&raw)))
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    fn write(&mut self, key: &str, value: &Value, duration_secs: u64) -> EngineResult<bool> {
        let key = self.physical_key(key)?;
        let encoded = codec::encode(value);

        let written = self.call(Operation::Write, |store, _| {
            if duration_secs == 0 {
                store.set(&key, &encoded)
            } else {
                store.set_with_expiry(&key, &encoded, duration_secs)
            }
        })?;

        if written.is_some() {
            self.stats.record_write();
        }
        // A suppressed failure still reports success so the host does not
        // log its own write warning.
        Ok(true)
    }

    fn increment(&mut self, key: &str, offset: i64) -> EngineResult<Option<i64>> {
        let key = self.physical_key(key)?;
        self.call(Operation::Increment, |store, _| store.incr_by(&key, offset))
    }

    fn decrement(&mut self, key: &str, offset: i64) -> EngineResult<Option<i64>> {
        let key = self.physical_key(key)?;
        self.call(Operation::Decrement, |store, _| store.decr_by(&key, offset))
    }

    fn delete(&mut self, key: &str) -> EngineResult<bool> {
        let key = self.physical_key(key)?;
        let removed = self
            .call(Operation::Delete, |store, _| store.del(&[key]))?
            .unwrap_or(0);

        if removed > 0 {
            self.stats.record_delete();
        }
        Ok(removed > 0)
    }

    fn clear(&mut self, check: bool) -> EngineResult<bool> {
        if check {
            return Ok(true);
        }

        let removed = self.call(Operation::Clear, |store, settings| {
            let keys = store.keys_matching(&format!("{}*", settings.prefix))?;
            if keys.is_empty() {
                return Ok(0);
            }
            store.del(&keys)
        })?;

        if let Some(removed) = removed {
            debug!(prefix = %self.settings.prefix, removed, "cache cleared");
        }
        Ok(true)
    }

    fn groups(&mut self) -> EngineResult<Vec<String>> {
        let tokens = self.call(Operation::Groups, |store, settings| {
            groups::tokens(store, &settings.prefix, &settings.groups)
        })?;
        Ok(tokens.unwrap_or_default())
    }

    fn clear_group(&mut self, group: &str) -> EngineResult<bool> {
        if group.is_empty() {
            return Err(EngineError::InvalidKey("group name must not be empty".to_string()));
        }

        let bumped = self
            .call(Operation::ClearGroup, |store, settings| {
                groups::invalidate(store, &settings.prefix, group)
            })?
            .unwrap_or(false);

        if bumped {
            self.stats.record_group_invalidation();
        }
        Ok(bumped)
    }

    fn add(&mut self, key: &str, value: &Value, duration_secs: u64) -> EngineResult<bool> {
        let key = self.physical_key(key)?;
        let encoded = codec::encode(value);

        // SETNX has no expiry argument, so the TTL is set by a second call.
        // A crash between the two leaves the key without expiry.
        let created = self
            .call(Operation::Add, |store, _| {
                if !store.set_if_absent(&key, &encoded)? {
                    return Ok(false);
                }
                if duration_secs > 0 {
                    store.expire(&key, duration_secs)?;
                }
                Ok(true)
            })?
            .unwrap_or(false);

        if created {
            self.stats.record_write();
        }
        Ok(created)
    }
}

impl<S: KeyValueStore> Drop for RedisEngine<S> {
    fn drop(&mut self) {
        if !self.settings.persistent && self.store.is_connected() {
            self.store.disconnect();
        }
    }
}
