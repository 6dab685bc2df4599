//! Error handling logic

use super::id::PairId;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type QuantumResult<T> = Result<T, QuantumError>;

/// Error types raised by the state, entanglement, collapse and correction engines.
///
/// Expected-but-undesirable outcomes (low fidelity, partially corrected error
/// sets, a collapse mechanism falling back) are *not* errors: they are reported
/// in the returned result objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantumError {
    /// Malformed or unnormalizable amplitude vector.
    #[error("Invalid quantum state: {message}")]
    InvalidState {
        /// InvalidState failure message
        message: String,
    },

    /// A particle is already bound to another entangled pair.
    #[error("Duplicate entanglement: particle '{particle_id}' already belongs to {pair_id}")]
    DuplicateEntanglement {
        /// Particle that was requested twice
        particle_id: String,
        /// Pair currently owning the particle
        pair_id: PairId,
    },

    /// An error-correction code that is unknown or not registered with the engine.
    #[error("Unsupported correction code: {name}")]
    UnsupportedCode {
        /// Requested code name
        name: String,
    },

    /// A collapse mechanism name that does not map to any mechanism.
    #[error("Unsupported collapse mechanism: {name}")]
    UnsupportedMechanism {
        /// Requested mechanism name
        name: String,
    },

    /// Configuration values (or configuration-like names) that cannot be used.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// InvalidConfiguration failure message
        message: String,
    },

    /// A call-time parameter outside its domain.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// InvalidParameter failure message
        message: String,
    },

    /// Lookup of a pair that is not (or no longer) registered.
    #[error("Entangled pair {pair_id} not found")]
    PairNotFound {
        /// Missing pair
        pair_id: PairId,
    },

    /// The background decay task could not be spawned.
    #[error("Failed to spawn background task: {message}")]
    TaskSpawn {
        /// TaskSpawn failure message
        message: String,
    },

    /// Internal only: the decay thread terminated outside its per-iteration guard.
    #[error("Thread safety violation: {message}")]
    ThreadSafetyViolation {
        /// ThreadSafetyViolation failure message
        message: String,
    },
}

impl QuantumError {
    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        QuantumError::InvalidState { message: message.into() }
    }

    pub(crate) fn invalid_parameter(message: impl Into<String>) -> Self {
        QuantumError::InvalidParameter { message: message.into() }
    }

    pub(crate) fn invalid_configuration(message: impl Into<String>) -> Self {
        QuantumError::InvalidConfiguration { message: message.into() }
    }
}
