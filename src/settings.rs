//! Engine settings.
//!
//! Settings are fixed once an engine is built. Use the builder to override
//! the defaults, then call [`EngineSettings::build`] to validate:
//!
//! ```
//! use redis_cache_engine::EngineSettings;
//!
//! let settings = EngineSettings::for_app("shop")
//!     .group("users")
//!     .group("posts")
//!     .throw_exceptions(true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(settings.get_prefix(), "shop_");
//! assert_eq!(settings.get_groups(), ["users", "posts"]);
//! ```

use crate::error::{EngineError, EngineResult};
use crate::utils::{has_glob_meta, slug};

/// Default lifetime of a written value, in seconds.
pub const DEFAULT_DURATION_SECS: u64 = 3600;

/// Application name used when none is given.
const DEFAULT_APP_NAME: &str = "app";

/// Configuration for a single engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Prepended to every key and group name sent to the store.
    pub(crate) prefix: String,

    /// Groups managed by this engine, in the order `groups()` reports them.
    pub(crate) groups: Vec<String>,

    /// Keep the connection open when the engine is dropped.
    pub(crate) persistent: bool,

    /// Propagate transport failures instead of suppressing them.
    pub(crate) throw_exceptions: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::for_app(DEFAULT_APP_NAME)
    }
}

impl EngineSettings {
    /// Create settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create settings whose prefix is derived from the application name,
    /// e.g. `"My Shop"` gives the prefix `"My_Shop_"`.
    pub fn for_app(app_name: &str) -> Self {
        Self {
            prefix: format!("{}_", slug(app_name)),
            groups: Vec::new(),
            persistent: false,
            throw_exceptions: false,
        }
    }

    /// Set the key prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Add a group. Adding a group twice keeps the first position.
    pub fn group(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.groups.contains(&name) {
            self.groups.push(name);
        }
        self
    }

    /// Add several groups, in order.
    pub fn groups<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |settings, name| settings.group(name))
    }

    /// Keep the connection open for the process lifetime.
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Propagate transport failures as errors instead of logging and
    /// returning a safe value.
    pub fn throw_exceptions(mut self, enabled: bool) -> Self {
        self.throw_exceptions = enabled;
        self
    }

    /// Validate and return the final settings.
    ///
    /// The prefix must not contain pattern characters (backslash and braces
    /// included), since `clear` matches keys with `prefix*`. Group names
    /// must be non-empty.
    pub fn build(self) -> EngineResult<Self> {
        if has_glob_meta(&self.prefix) {
            return Err(EngineError::InvalidSettings(format!(
                "prefix '{}' contains glob characters",
                self.prefix
            )));
        }
        if self.groups.iter().any(|g| g.is_empty()) {
            return Err(EngineError::InvalidSettings(
                "group names must not be empty".to_string(),
            ));
        }
        Ok(self)
    }

    /// Get the key prefix.
    pub fn get_prefix(&self) -> &str {
        &self.prefix
    }

    /// Get the configured groups.
    pub fn get_groups(&self) -> &[String] {
        &self.groups
    }

    /// Whether the connection outlives the engine.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Whether transport failures are propagated.
    pub fn throws_exceptions(&self) -> bool {
        self.throw_exceptions
    }
}
