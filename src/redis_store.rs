//! [`KeyValueStore`] backed by a Redis server.
//!
//! Uses the blocking connection of the `redis` crate. An optional global key
//! prefix is added to every key on the way in and stripped from KEYS results
//! on the way out, so keys returned by `keys_matching` can be passed straight
//! back to `del`.

use redis::{Client, Connection, ConnectionLike};
use std::time::Duration;
use tracing::debug;

use crate::config::ConnectionParams;
use crate::error::{StoreError, StoreResult};
use crate::store::KeyValueStore;

/// A single Redis connection, opened lazily.
pub struct RedisStore {
    client: Client,
    connection: Option<Connection>,
    key_prefix: String,
    timeout: Option<Duration>,
}

impl RedisStore {
    /// Create a store for the given connection parameters.
    ///
    /// No network traffic happens here; this only validates the URL. Call
    /// [`KeyValueStore::connect`] to open the connection.
    pub fn open(params: &ConnectionParams, key_prefix: impl Into<String>) -> StoreResult<Self> {
        let client = Client::open(params.url())?;
        Ok(Self {
            client,
            connection: None,
            key_prefix: key_prefix.into(),
            timeout: params.timeout_secs.map(Duration::from_secs),
        })
    }

    /// The global prefix added to every key.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    fn strip<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(self.key_prefix.as_str()).unwrap_or(key)
    }

    fn conn(&mut self) -> StoreResult<&mut Connection> {
        self.connection.as_mut().ok_or(StoreError::NotConnected)
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("key_prefix", &self.key_prefix)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl KeyValueStore for RedisStore {
    fn connect(&mut self) -> StoreResult<()> {
        if self.is_connected() {
            return Ok(());
        }

        let connection = match self.timeout {
            Some(timeout) => {
                let connection = self.client.get_connection_with_timeout(timeout)?;
                connection.set_read_timeout(Some(timeout))?;
                connection.set_write_timeout(Some(timeout))?;
                connection
            }
            None => self.client.get_connection()?,
        };

        debug!(prefix = %self.key_prefix, "redis connection established");
        self.connection = Some(connection);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| c.is_open())
    }

    fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            debug!(prefix = %self.key_prefix, "redis connection closed");
        }
    }

    fn get(&mut self, key: &str) -> StoreResult<Option<String>> {
        let key = self.key(key);
        Ok(redis::cmd("GET").arg(key).query(self.conn()?)?)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let key = self.key(key);
        Ok(redis::cmd("SET").arg(key).arg(value).query(self.conn()?)?)
    }

    fn set_with_expiry(&mut self, key: &str, value: &str, seconds: u64) -> StoreResult<()> {
        let key = self.key(key);
        Ok(redis::cmd("SETEX")
            .arg(key)
            .arg(seconds)
            .arg(value)
            .query(self.conn()?)?)
    }

    fn set_if_absent(&mut self, key: &str, value: &str) -> StoreResult<bool> {
        let key = self.key(key);
        Ok(redis::cmd("SETNX").arg(key).arg(value).query(self.conn()?)?)
    }

    fn expire(&mut self, key: &str, seconds: u64) -> StoreResult<bool> {
        let key = self.key(key);
        Ok(redis::cmd("EXPIRE").arg(key).arg(seconds).query(self.conn()?)?)
    }

    fn incr_by(&mut self, key: &str, delta: i64) -> StoreResult<i64> {
        let key = self.key(key);
        Ok(redis::cmd("INCRBY").arg(key).arg(delta).query(self.conn()?)?)
    }

    fn decr_by(&mut self, key: &str, delta: i64) -> StoreResult<i64> {
        let key = self.key(key);
        Ok(redis::cmd("DECRBY").arg(key).arg(delta).query(self.conn()?)?)
    }

    fn incr(&mut self, key: &str) -> StoreResult<i64> {
        let key = self.key(key);
        Ok(redis::cmd("INCR").arg(key).query(self.conn()?)?)
    }

    fn del(&mut self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let keys: Vec<String> = keys.iter().map(|k| self.key(k)).collect();
        Ok(redis::cmd("DEL").arg(keys).query(self.conn()?)?)
    }

    fn keys_matching(&mut self, pattern: &str) -> StoreResult<Vec<String>> {
        let pattern = self.key(pattern);
        let keys: Vec<String> = redis::cmd("KEYS").arg(pattern).query(self.conn()?)?;
        Ok(keys.iter().map(|k| self.strip(k).to_string()).collect())
    }
}
