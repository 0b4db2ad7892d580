//! The remote key-value client seam.
//!
//! The engine never talks to Redis directly. It goes through
//! [`KeyValueStore`], the small set of primitives it needs, so that the
//! Redis client and the in-memory store are interchangeable.

use crate::error::StoreResult;

/// Synchronous key-value primitives consumed by the engine.
///
/// Every data call is one blocking round-trip and may fail with a
/// [`StoreError`](crate::error::StoreError). Atomicity of `incr_by`,
/// `decr_by`, `incr`, `set_if_absent` and `del` is the store's job; the
/// engine does no locking of its own.
pub trait KeyValueStore {
    /// Open the connection. Implementations treat a second call on a live
    /// connection as a no-op.
    fn connect(&mut self) -> StoreResult<()>;

    /// Whether the connection is currently usable.
    fn is_connected(&self) -> bool;

    /// Close the connection. Never fails.
    fn disconnect(&mut self);

    /// GET. `None` means the key does not exist.
    fn get(&mut self, key: &str) -> StoreResult<Option<String>>;

    /// SET without expiry.
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// SETEX. `seconds` must be greater than zero.
    fn set_with_expiry(&mut self, key: &str, value: &str, seconds: u64) -> StoreResult<()>;

    /// SETNX. Returns `true` if the key was created.
    fn set_if_absent(&mut self, key: &str, value: &str) -> StoreResult<bool>;

    /// EXPIRE. Returns `true` if the key existed.
    fn expire(&mut self, key: &str, seconds: u64) -> StoreResult<bool>;

    /// INCRBY. A missing key counts as zero.
    fn incr_by(&mut self, key: &str, delta: i64) -> StoreResult<i64>;

    /// DECRBY. A missing key counts as zero.
    fn decr_by(&mut self, key: &str, delta: i64) -> StoreResult<i64>;

    /// INCR.
    fn incr(&mut self, key: &str) -> StoreResult<i64> {
        self.incr_by(key, 1)
    }

    /// DEL. Returns how many of `keys` were actually removed.
    fn del(&mut self, keys: &[String]) -> StoreResult<u64>;

    /// KEYS with a glob pattern.
    fn keys_matching(&mut self, pattern: &str) -> StoreResult<Vec<String>>;
}
