// src/entanglement/preparation.rs

//! Canonical joint states for each entanglement type.

use super::pair::EntanglementType;
use crate::core::{QuantumResult, QuantumState, FRAC_1_SQRT_2};
use num_complex::Complex64;
use num_traits::Zero;

/// A freshly prepared joint state and its theoretical fidelity.
#[derive(Debug, Clone)]
pub(crate) struct PreparedState {
    pub joint_state: QuantumState,
    pub fidelity: f64,
}

/// Builds the joint amplitude vector for `kind`.
///
/// `bias` only affects `BiasedCustom`. `biased_preparation_fidelity` scales the
/// biased state's overlap with Φ+, keeping it below an ideal Bell pair.
pub(crate) fn prepare(
    kind: EntanglementType,
    bias: Option<f64>,
    biased_preparation_fidelity: f64,
) -> QuantumResult<PreparedState> {
    let r = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let zero = Complex64::zero();

    let (amplitudes, fidelity) = match kind {
        EntanglementType::BellPhiPlus => (vec![r, zero, zero, r], 1.0),
        EntanglementType::BellPhiMinus => (vec![r, zero, zero, -r], 1.0),
        EntanglementType::BellPsiPlus => (vec![zero, r, r, zero], 1.0),
        EntanglementType::BellPsiMinus => (vec![zero, r, -r, zero], 1.0),
        EntanglementType::Ghz => {
            let mut amps = vec![zero; 8];
            amps[0] = r;
            amps[7] = r;
            (amps, 1.0)
        }
        EntanglementType::W => {
            let third = Complex64::new(1.0 / 3f64.sqrt(), 0.0);
            let mut amps = vec![zero; 8];
            // |001>, |010>, |100>
            amps[1] = third;
            amps[2] = third;
            amps[4] = third;
            (amps, 1.0)
        }
        EntanglementType::BiasedCustom => {
            let b = bias.unwrap_or(0.0).clamp(0.0, 1.0);
            let a00 = ((1.0 + b) / 2.0).sqrt();
            let a11 = ((1.0 - b) / 2.0).sqrt();
            // |<Φ+|ψ>|² = (1 + √(1 − b²)) / 2
            let overlap = (1.0 + (1.0 - b * b).sqrt()) / 2.0;
            (
                vec![Complex64::new(a00, 0.0), zero, zero, Complex64::new(a11, 0.0)],
                overlap * biased_preparation_fidelity,
            )
        }
    };

    Ok(PreparedState {
        joint_state: QuantumState::from_amplitudes(amplitudes)?,
        fidelity: fidelity.clamp(0.0, 1.0),
    })
}
