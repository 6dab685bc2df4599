// src/lib.rs

//! `qstate` - Quantum state simulation, entanglement tracking, collapse and
//! stabilizer error correction
//!
//! States are plain complex amplitude vectors. On top of them the crate
//! provides an entanglement manager with time-based fidelity decay, a collapse
//! handler supporting several measurement models, and a small family of
//! stabilizer codes (repetition, Shor, Steane, planar surface, adaptive).
//! [`QuantumCore`] wires the three engines together.

pub mod core;
pub mod validation;
pub mod config;
pub mod entanglement;
pub mod collapse;
pub mod correction;
pub mod coordinator;

// Re-export the most common types for easier top-level use
pub use crate::core::{PairId, ParticleId, QuantumError, QuantumResult, QuantumState};
pub use config::{CollapseConfig, CoreConfig, CorrectionConfig, EntanglementConfig};
pub use entanglement::{
    DecayReport, EntangledPair, EntanglementManager, EntanglementStatus, EntanglementType, PairMeasurement,
    QualityTier,
};
pub use collapse::{
    CollapseEvent, CollapseMechanism, CollapseRequest, CollapseTrigger, MeasurementBasis, StateCollapseHandler,
};
pub use correction::{
    CodeType, CorrectionCode, CorrectionResult, ErrorCorrectionEngine, ErrorKind, ErrorTag,
};
pub use coordinator::{CoreStatus, QuantumCore};
pub use validation::{check_normalization, validate_state};

// Example 1: Bell pair decay
// A Φ+ pair loses fidelity exponentially; concurrence follows it.
/// ```
/// use qstate::{EntanglementConfig, EntanglementManager, EntanglementType, QuantumError};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), QuantumError> {
/// let manager = EntanglementManager::new(EntanglementConfig::default())?;
/// let pair = manager.create_entangled_pair(EntanglementType::BellPhiPlus, None, None, None)?;
/// assert_eq!(pair.fidelity(), 1.0);
///
/// for _ in 0..10 {
///     manager.advance_decay(Duration::from_secs(1));
/// }
/// let decayed = manager.get_pair(&pair.pair_id).expect("pair still above threshold");
/// assert!((decayed.fidelity() - (-0.1f64).exp()).abs() < 1e-3);
/// assert!((decayed.concurrence() - (2.0 * decayed.fidelity() - 1.0)).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
#[doc(hidden)]
const _: () = ();

// Example 2: Shor code bit-flip recovery
// Encode 0.6|0> + 0.8|1>, flip physical qubit 0, correct, decode.
/// ```
/// use qstate::{CodeType, ErrorTag, QuantumCore, QuantumError, QuantumState};
/// use num_complex::Complex64;
///
/// # fn main() -> Result<(), QuantumError> {
/// let core = QuantumCore::with_defaults()?;
/// let engine = core.correction();
/// let logical = QuantumState::from_amplitudes(vec![Complex64::new(0.6, 0.0), Complex64::new(0.8, 0.0)])?;
///
/// let mut encoded = engine.encode(CodeType::Shor9, &logical)?;
/// engine.inject_error(&mut encoded, &ErrorTag::bit_flip(0))?;
/// let result = core.correct_errors(&mut encoded, &[ErrorTag::bit_flip(0)], CodeType::Shor9)?;
/// assert!(result.correction_successful);
///
/// let decoded = engine.decode(CodeType::Shor9, &encoded)?;
/// assert!((decoded.amplitudes()[0].re.abs() - 0.6).abs() < 1e-6);
/// assert!((decoded.amplitudes()[1].re.abs() - 0.8).abs() < 1e-6);
/// # Ok(())
/// # }
/// ```
#[doc(hidden)]
const _: () = ();
