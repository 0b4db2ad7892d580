//! `redis-cache`: run a single cache-engine operation from the shell.
//!
//! ```bash
//! redis-cache --config redis.toml write session:1 '{"user": 7}' --ttl 60
//! redis-cache -g users groups
//! redis-cache clear-group users
//! ```

use clap::Parser;
use std::process::ExitCode;

use redis_cache_engine::cli::{execute, Cli};
use redis_cache_engine::logging::init_logging;
use redis_cache_engine::{EngineResult, MemoryStore, RedisConfig, RedisEngine};

fn run(cli: Cli) -> EngineResult<String> {
    if cli.memory {
        let mut engine = RedisEngine::init(MemoryStore::new(), cli.settings())?;
        return execute(&mut engine, cli.command);
    }

    let config = RedisConfig::load(cli.config.as_deref())?;
    let mut engine = RedisEngine::from_config(&config, cli.settings())?;
    execute(&mut engine, cli.command)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
