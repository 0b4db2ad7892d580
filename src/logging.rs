//! Logging setup for the command-line tool.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the host. The CLI uses [`init_logging`].

use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install a console subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Calling this more than
/// once, or after another subscriber was installed, is harmless.
pub fn init_logging(default_level: &str) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let _ = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
