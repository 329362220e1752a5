//! Error taxonomy for the engine boundary.
//!
//! Invalid input and configuration errors are caller-visible and
//! recoverable. An invariant violation means downstream state can no longer
//! be trusted: the engine reports the offending component and refuses all
//! further blocks until reset.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by the engine's public interface.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Direction input outside {+1, -1}.
    #[error("invalid direction {0}: expected +1 or -1")]
    InvalidDirection(i32),

    /// Magnitude outside [0, 100].
    #[error("invalid magnitude {0}: expected a value in [0, 100]")]
    InvalidMagnitude(Decimal),

    /// Configuration value outside its documented range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A cross-subsystem invariant failed. Fatal: the engine halts.
    #[error("invariant violated in {component}: {detail}")]
    InvariantViolation {
        /// Name of the component that detected the violation.
        component: &'static str,
        /// Snapshot of the relevant sub-state.
        detail: String,
    },

    /// The engine previously halted on an invariant violation and refuses
    /// further blocks.
    #[error("engine halted after invariant violation in {0}; reset required")]
    Halted(&'static str),
}

impl EngineError {
    /// Builds an invariant violation for the given component.
    #[must_use]
    pub fn invariant(component: &'static str, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            component,
            detail: detail.into(),
        }
    }
}
