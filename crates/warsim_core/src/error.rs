//! Error types for turn resolution.

use thiserror::Error;

use crate::turn::Phase;
use crate::unit::UnitId;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level error type for the resolution engine.
///
/// Gameplay outcomes (a lost battle, a rejected order, a timed-out
/// producer) are never errors; they are recorded as events.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The reference catalog could not be parsed or is inconsistent.
    #[error("Invalid catalog: {0}")]
    Catalog(String),

    /// The scenario could not be built into a world.
    #[error("Invalid scenario: {0}")]
    Scenario(String),

    /// A resolver was invoked with an engagement it cannot accept.
    #[error("Contract violation in {phase} phase: {detail}")]
    ContractViolation {
        /// Phase in which the violation occurred.
        phase: Phase,
        /// What was wrong.
        detail: String,
    },

    /// A phase was run out of order.
    #[error("Phase out of sequence: expected {expected:?}, got {requested}")]
    PhaseOutOfSequence {
        /// The phase the scheduler was waiting for, if a turn is open.
        expected: Option<Phase>,
        /// The phase that was requested.
        requested: Phase,
    },

    /// A unit identifier does not exist.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// The run has already reached a terminal condition.
    #[error("Run already terminated")]
    RunTerminated,

    /// Cancellation was requested before the next turn.
    #[error("Run cancelled after turn {turn}")]
    Cancelled {
        /// Last completed turn.
        turn: u32,
    },

    /// Invalid engine state, including snapshot encoding failures.
    #[error("Invalid engine state: {0}")]
    InvalidState(String),

    /// Replay verification found a different final state.
    #[error("Desync detected at turn {turn}: expected hash {expected}, got {actual}")]
    DesyncDetected {
        /// Turn where the hashes were compared.
        turn: u32,
        /// Recorded hash.
        expected: u64,
        /// Recomputed hash.
        actual: u64,
    },
}

impl EngineError {
    /// Build a contract violation for `phase`.
    pub fn contract(phase: Phase, detail: impl Into<String>) -> Self {
        Self::ContractViolation {
            phase,
            detail: detail.into(),
        }
    }

    /// Whether this error represents a broken engine contract rather than
    /// bad input data.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::ContractViolation { .. } | Self::PhaseOutOfSequence { .. }
        )
    }
}
