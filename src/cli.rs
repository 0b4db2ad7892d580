//! Command-line interface definitions.
//!
//! This module defines the CLI structure for the `redis-cache` tool using
//! clap, and [`execute`], which runs one command against an engine.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use crate::engine::{CacheEngine, RedisEngine};
use crate::error::EngineResult;
use crate::settings::{EngineSettings, DEFAULT_DURATION_SECS};
use crate::store::KeyValueStore;

/// Redis cache engine client.
///
/// Runs a single cache-engine operation against the configured server.
#[derive(Parser, Debug)]
#[command(name = "redis-cache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML file with connection settings.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Application name used to derive the key prefix.
    #[arg(long, default_value = "app")]
    pub app: String,

    /// Key prefix; overrides the one derived from --app.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Group managed by the engine. May be repeated.
    #[arg(short, long = "group")]
    pub groups: Vec<String>,

    /// Report store failures as errors instead of suppressing them.
    #[arg(long)]
    pub strict: bool,

    /// Run against a throwaway in-memory store instead of a server.
    #[arg(long)]
    pub memory: bool,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// The command to execute.
    #[command(subcommand)]
    pub command: ClientCommand,
}

/// Available client commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// Read a value.
    Read {
        /// The key to look up.
        key: String,
    },

    /// Write a value. The value is parsed as JSON, falling back to a plain
    /// string.
    Write {
        key: String,
        value: String,
        /// Lifetime in seconds; 0 keeps the value until deleted.
        #[arg(long, default_value_t = DEFAULT_DURATION_SECS)]
        ttl: u64,
    },

    /// Write a value only if the key does not exist.
    Add {
        key: String,
        value: String,
        #[arg(long, default_value_t = DEFAULT_DURATION_SECS)]
        ttl: u64,
    },

    /// Increment a counter.
    Incr {
        key: String,
        #[arg(long, default_value_t = 1)]
        by: i64,
    },

    /// Decrement a counter.
    Decr {
        key: String,
        #[arg(long, default_value_t = 1)]
        by: i64,
    },

    /// Delete a key.
    Delete { key: String },

    /// Delete every key under the prefix.
    Clear {
        /// Only check whether clearing is supported.
        #[arg(long)]
        check: bool,
    },

    /// Print the current token of every configured group.
    Groups,

    /// Invalidate a group.
    ClearGroup { group: String },

    /// Check that the server is reachable.
    Ping,
}

impl Cli {
    /// Engine settings described by the command-line flags.
    pub fn settings(&self) -> EngineSettings {
        let settings = EngineSettings::for_app(&self.app)
            .groups(self.groups.iter().cloned())
            .throw_exceptions(self.strict);

        match &self.prefix {
            Some(prefix) => settings.prefix(prefix.clone()),
            None => settings,
        }
    }
}

/// Parse a command-line value as JSON, or keep it as a string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Run one command and return the text to print.
pub fn execute<S: KeyValueStore>(
    engine: &mut RedisEngine<S>,
    command: ClientCommand,
) -> EngineResult<String> {
    let output = match command {
        ClientCommand::Read { key } => match engine.read(&key)? {
            Some(value) => value.to_string(),
            None => format!("Key '{}' not found", key),
        },

        ClientCommand::Write { key, value, ttl } => {
            engine.write(&key, &parse_value(&value), ttl)?;
            "OK".to_string()
        }

        ClientCommand::Add { key, value, ttl } => {
            if engine.add(&key, &parse_value(&value), ttl)? {
                "OK".to_string()
            } else {
                format!("Key '{}' already exists", key)
            }
        }

        ClientCommand::Incr { key, by } => match engine.increment(&key, by)? {
            Some(n) => n.to_string(),
            None => "FAILED".to_string(),
        },

        ClientCommand::Decr { key, by } => match engine.decrement(&key, by)? {
            Some(n) => n.to_string(),
            None => "FAILED".to_string(),
        },

        ClientCommand::Delete { key } => {
            if engine.delete(&key)? {
                format!("Deleted key '{}'", key)
            } else {
                format!("Key '{}' not found", key)
            }
        }

        ClientCommand::Clear { check } => {
            engine.clear(check)?;
            "OK".to_string()
        }

        ClientCommand::Groups => engine.groups()?.join("\n"),

        ClientCommand::ClearGroup { group } => {
            if engine.clear_group(&group)? {
                format!("Invalidated group '{}'", group)
            } else {
                "FAILED".to_string()
            }
        }

        ClientCommand::Ping => {
            if engine.connect()? {
                "PONG".to_string()
            } else {
                "FAILED".to_string()
            }
        }
    };

    Ok(output)
}
