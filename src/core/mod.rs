// src/core/mod.rs

//! Core data structures and types

pub mod error;
pub mod id;
pub(crate) mod sampling;
pub mod state;

// Re-export public types for convenient access via `qstate::core::TypeName`
pub use error::{QuantumError, QuantumResult};
pub use id::{PairId, ParticleId};
pub use state::{computational_labels, shannon_entropy, QuantumState};

pub mod constants;
pub use constants::FRAC_1_SQRT_2;
