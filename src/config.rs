//! Connection configuration for the Redis servers.
//!
//! Two servers are described: one for the cache and one for sessions, so
//! each can be tuned for its task. Values are merged in this order (later
//! sources override earlier):
//!
//! 1. Built-in defaults (`tcp://127.0.0.1:6379`, no password)
//! 2. A TOML file, if one is given
//! 3. Environment variables prefixed with `REDIS_CACHE_`, using `__` to
//!    separate nesting levels (e.g. `REDIS_CACHE_CACHE__HOST=10.0.0.5`)
//!
//! ```toml
//! global_cache_prefix = "prod:"
//!
//! [cache]
//! host = "cache.internal"
//! port = 6380
//! password = "secret"
//! ```

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::redis_store::RedisStore;
use crate::utils::has_glob_meta;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "REDIS_CACHE_";

/// Where and how to reach one Redis server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    /// `tcp`, `tls` or `unix`.
    pub scheme: String,

    /// Host name, or the socket path for `unix`.
    pub host: String,

    pub port: u16,

    /// Must already be URL-safe; it is placed in the URL as given.
    pub password: Option<String>,

    /// Logical database index.
    pub database: i64,

    /// Connect, read and write timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            scheme: "tcp".to_string(),
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            database: 0,
            timeout_secs: None,
        }
    }
}

impl ConnectionParams {
    /// Render the parameters as a URL understood by the redis client.
    pub fn url(&self) -> String {
        let auth = match &self.password {
            Some(password) => format!(":{}@", password),
            None => String::new(),
        };

        let scheme = match self.scheme.as_str() {
            "unix" => return format!("redis+unix://{}?db={}", self.host, self.database),
            "tcp" | "redis" => "redis",
            "tls" | "rediss" => "rediss",
            other => other,
        };
        format!(
            "{}://{}{}:{}/{}",
            scheme, auth, self.host, self.port, self.database
        )
    }
}

/// Connection settings for the cache and session servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Server used by the cache engine.
    pub cache: ConnectionParams,

    /// Server used for session storage.
    pub session: ConnectionParams,

    /// Added by the client to every cache key, before the engine prefix.
    pub global_cache_prefix: String,

    /// Added by the client to every session key.
    pub global_session_prefix: String,
}

impl RedisConfig {
    /// Load configuration from defaults, an optional TOML file and the
    /// environment.
    pub fn load(path: Option<&Path>) -> EngineResult<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            debug!(path = %path.display(), "loading redis configuration");
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string over the defaults.
    pub fn from_toml_str(toml: &str) -> EngineResult<Self> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check that neither global prefix contains pattern characters.
    ///
    /// The client puts the global prefix in front of every KEYS pattern, so
    /// it has the same restriction as the engine prefix.
    pub fn validate(&self) -> EngineResult<()> {
        check_global_prefix("global_cache_prefix", &self.global_cache_prefix)?;
        check_global_prefix("global_session_prefix", &self.global_session_prefix)
    }

    /// Build a store for the cache server.
    pub fn cache_store(&self) -> EngineResult<RedisStore> {
        check_global_prefix("global_cache_prefix", &self.global_cache_prefix)?;
        RedisStore::open(&self.cache, self.global_cache_prefix.as_str())
            .map_err(|e| EngineError::Unavailable(e.to_string()))
    }

    /// Build a store for the session server.
    pub fn session_store(&self) -> EngineResult<RedisStore> {
        check_global_prefix("global_session_prefix", &self.global_session_prefix)?;
        RedisStore::open(&self.session, self.global_session_prefix.as_str())
            .map_err(|e| EngineError::Unavailable(e.to_string()))
    }
}

fn check_global_prefix(field: &str, prefix: &str) -> EngineResult<()> {
    if has_glob_meta(prefix) {
        return Err(EngineError::InvalidSettings(format!(
            "{} '{}' contains glob characters",
            field, prefix
        )));
    }
    Ok(())
}
