// src/validation/mod.rs

//! Validation helpers applied to states and scalar knobs before the engines use them.

use crate::core::constants::tolerances::INPUT_NORM_TOLERANCE;
use crate::core::{QuantumError, QuantumResult, QuantumState};

/// Checks that `Σ|a_i|² ≈ 1`.
///
/// # Arguments
/// * `state` - The `QuantumState` to check.
/// * `tolerance` - Allowed deviation from 1.0. Defaults to `1e-6`.
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(QuantumError::InvalidState)` otherwise.
pub fn check_normalization(state: &QuantumState, tolerance: Option<f64>) -> QuantumResult<()> {
    let effective_tolerance = tolerance.unwrap_or(INPUT_NORM_TOLERANCE);
    let norm_sq = state.norm_sqr();
    if (norm_sq - 1.0).abs() > effective_tolerance {
        Err(QuantumError::invalid_state(format!(
            "State vector normalization failed. Sum(|c_i|^2) = {} (Deviation > {})",
            norm_sq, effective_tolerance
        )))
    } else {
        Ok(())
    }
}

/// Full input check used by the collapse and correction engines: non-empty,
/// labels match, normalized.
pub fn validate_state(state: &QuantumState, norm_tolerance: Option<f64>) -> QuantumResult<()> {
    if state.dim() == 0 {
        return Err(QuantumError::invalid_state("State vector is empty"));
    }
    if state.basis_labels().len() != state.dim() {
        return Err(QuantumError::invalid_state("Basis labels do not match the amplitude count"));
    }
    check_normalization(state, norm_tolerance)
}

/// Checks that a scalar knob lies in `[0, 1]`.
pub fn check_unit_interval(value: f64, name: &str) -> QuantumResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(QuantumError::invalid_parameter(format!(
            "{} must lie in [0, 1], got {}",
            name, value
        )))
    }
}

/// Clamps an optional bias into `[0, 1]`; NaN is rejected.
pub fn sanitize_bias(bias: Option<f64>) -> QuantumResult<Option<f64>> {
    match bias {
        None => Ok(None),
        Some(b) if b.is_nan() => Err(QuantumError::invalid_parameter("bias must not be NaN")),
        Some(b) => Ok(Some(b.clamp(0.0, 1.0))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::computational_labels;
    use num_complex::Complex64;

    #[test]
    fn test_normalization_check() -> QuantumResult<()> {
        let good = QuantumState::basis_state(1, 1)?;
        assert!(check_normalization(&good, None).is_ok());

        let raw = QuantumState::from_raw_parts(
            vec![Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)],
            computational_labels(1),
        )?;
        assert!(matches!(check_normalization(&raw, None), Err(QuantumError::InvalidState { .. })));
        assert!(validate_state(&raw, Some(1.5)).is_ok());
        Ok(())
    }

    #[test]
    fn test_unit_interval_and_bias() {
        assert!(check_unit_interval(0.0, "strength").is_ok());
        assert!(check_unit_interval(1.0, "strength").is_ok());
        assert!(check_unit_interval(1.01, "strength").is_err());
        assert!(check_unit_interval(f64::NAN, "strength").is_err());

        assert_eq!(sanitize_bias(Some(1.7)).ok(), Some(Some(1.0)));
        assert_eq!(sanitize_bias(Some(-0.2)).ok(), Some(Some(0.0)));
        assert_eq!(sanitize_bias(None).ok(), Some(None));
        assert!(sanitize_bias(Some(f64::NAN)).is_err());
    }
}
