//! Error types for the cache engine.
//!
//! Two layers of errors exist. [`StoreError`] is what a [`KeyValueStore`]
//! reports when a round-trip to the remote store fails. [`EngineError`] is
//! what callers of the engine see, either because a store failure was
//! propagated by the failure policy or because the call itself was invalid.
//!
//! [`KeyValueStore`]: crate::store::KeyValueStore

use std::io;

use thiserror::Error;

use crate::operation::Operation;

/// A failure reported by the remote key-value client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An operation was attempted without a live connection.
    #[error("not connected")]
    NotConnected,

    /// The connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server answered with something the client did not expect,
    /// e.g. INCRBY on a value that is not an integer.
    #[error("unexpected response: {0}")]
    Response(String),

    /// Error raised by the Redis client library.
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    /// A raw I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The main error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A transport failure propagated because `throw_exceptions` is set.
    #[error("{operation} failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: StoreError,
    },

    /// The remote client could not be constructed at all.
    #[error("cache client unavailable: {0}")]
    Unavailable(String),

    /// The provided key is invalid (empty).
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Engine settings failed validation.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Connection configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),
}

impl EngineError {
    /// The operation that failed, for transport errors.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            EngineError::Transport { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    /// Whether this error came from the remote store rather than the caller.
    pub fn is_transport(&self) -> bool {
        matches!(self, EngineError::Transport { .. })
    }
}

/// A specialized Result type for store round-trips.
pub type StoreResult<T> = Result<T, StoreError>;

/// A specialized Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
