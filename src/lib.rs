//! # Redis Cache Engine
//!
//! A cache engine backed by Redis, with O(1) group invalidation and a
//! configurable policy for store outages.
//!
//! ## Features
//!
//! - **Counter-safe encoding**: single digits are stored raw so INCRBY and
//!   DECRBY work on them; everything else is stored as a JSON envelope
//! - **Group versioning**: invalidate an unbounded set of keys by bumping one
//!   counter
//! - **Fail-open by default**: store failures are logged and turned into
//!   misses and no-op writes, unless `throw_exceptions` is set
//! - **Pluggable store**: the engine runs on any [`KeyValueStore`]; a Redis
//!   client and an in-memory store are included
//!
//! ## Quick Start
//!
//! ```rust
//! use redis_cache_engine::{CacheEngine, EngineSettings, MemoryStore, RedisEngine};
//! use serde_json::json;
//!
//! let settings = EngineSettings::for_app("shop").group("products");
//! let mut engine = RedisEngine::init(MemoryStore::new(), settings).unwrap();
//!
//! // Fold the group token into keys that belong to the group.
//! let token = engine.groups().unwrap().join("_");
//! let key = format!("{}_product_42", token);
//!
//! engine.write(&key, &json!({"name": "lamp"}), 300).unwrap();
//! assert_eq!(engine.read(&key).unwrap(), Some(json!({"name": "lamp"})));
//!
//! // Every key built from the old token is now unreachable.
//! engine.clear_group("products").unwrap();
//! let token = engine.groups().unwrap().join("_");
//! assert_eq!(token, "products2");
//! ```
//!
//! Against a real server, build the engine from a [`RedisConfig`]:
//!
//! ```no_run
//! use redis_cache_engine::{EngineSettings, RedisConfig, RedisEngine};
//!
//! let config = RedisConfig::load(None).unwrap();
//! let engine = RedisEngine::from_config(&config, EngineSettings::for_app("shop")).unwrap();
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod groups;
pub mod logging;
pub mod memory;
pub mod operation;
pub mod policy;
pub mod redis_store;
pub mod settings;
pub mod stats;
pub mod store;
pub mod utils;

pub use config::{ConnectionParams, RedisConfig};
pub use engine::{CacheEngine, RedisEngine};
pub use error::{EngineError, EngineResult, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use operation::Operation;
pub use policy::{FailureMode, FailurePolicy};
pub use redis_store::RedisStore;
pub use settings::{EngineSettings, DEFAULT_DURATION_SECS};
pub use stats::{EngineStats, StatsSnapshot};
pub use store::KeyValueStore;

// Internal modules - not part of public API
pub(crate) mod entry;
