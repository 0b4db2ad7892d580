//! Failure policy: what happens when the store cannot be reached.
//!
//! Every store call made by the engine ends up in [`FailurePolicy::resolve`].
//! A failure is logged there exactly once. Then, depending on the mode, it
//! is either returned to the caller as [`EngineError::Transport`] or turned
//! into `Ok(None)`, which each operation maps to its own fallback value.

use tracing::error;

use crate::error::{EngineError, EngineResult, StoreResult};
use crate::operation::Operation;
use crate::stats::EngineStats;

/// How transport failures reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Log the failure and degrade to a no-op cache.
    Suppress,
    /// Log the failure and return it as an error.
    Propagate,
}

/// Decides, in one place, whether a store failure is an error for the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    mode: FailureMode,
}

impl FailurePolicy {
    pub fn new(mode: FailureMode) -> Self {
        Self { mode }
    }

    /// Policy matching the `throw_exceptions` setting.
    pub fn from_throw_exceptions(throw_exceptions: bool) -> Self {
        if throw_exceptions {
            Self::new(FailureMode::Propagate)
        } else {
            Self::new(FailureMode::Suppress)
        }
    }

    pub fn mode(&self) -> FailureMode {
        self.mode
    }

    /// Resolve the outcome of a store call.
    ///
    /// `Ok(Some(value))` on success, `Ok(None)` for a suppressed failure,
    /// `Err(_)` for a propagated one.
    pub fn resolve<T>(
        &self,
        operation: Operation,
        result: StoreResult<T>,
        stats: &EngineStats,
    ) -> EngineResult<Option<T>> {
        let source = match result {
            Ok(value) => return Ok(Some(value)),
            Err(e) => e,
        };

        stats.record_transport_failure();
        error!(operation = %operation, error = %source, "cache store call failed");

        match self.mode {
            FailureMode::Propagate => Err(EngineError::Transport { operation, source }),
            FailureMode::Suppress => {
                stats.record_suppressed();
                Ok(None)
            }
        }
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::new(FailureMode::Suppress)
    }
}
