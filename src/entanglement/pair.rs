// src/entanglement/pair.rs

use crate::core::{PairId, ParticleId, QuantumError, QuantumState};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// The joint state a pair is prepared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntanglementType {
    /// |Φ+⟩ = (|00⟩ + |11⟩) / √2
    BellPhiPlus,
    /// |Φ-⟩ = (|00⟩ - |11⟩) / √2
    BellPhiMinus,
    /// |Ψ+⟩ = (|01⟩ + |10⟩) / √2
    BellPsiPlus,
    /// |Ψ-⟩ = (|01⟩ - |10⟩) / √2
    BellPsiMinus,
    /// (|000⟩ + |111⟩) / √2, the third qubit is an untracked partner
    Ghz,
    /// (|001⟩ + |010⟩ + |100⟩) / √3
    W,
    /// Φ+ with amplitude weight shifted toward |00⟩ by the pair's bias factor
    BiasedCustom,
}

impl EntanglementType {
    pub const ALL: [EntanglementType; 7] = [
        EntanglementType::BellPhiPlus,
        EntanglementType::BellPhiMinus,
        EntanglementType::BellPsiPlus,
        EntanglementType::BellPsiMinus,
        EntanglementType::Ghz,
        EntanglementType::W,
        EntanglementType::BiasedCustom,
    ];

    /// Qubits in the joint state.
    pub fn num_qubits(&self) -> usize {
        match self {
            EntanglementType::Ghz | EntanglementType::W => 3,
            _ => 2,
        }
    }

    pub fn is_bell_state(&self) -> bool {
        matches!(
            self,
            EntanglementType::BellPhiPlus
                | EntanglementType::BellPhiMinus
                | EntanglementType::BellPsiPlus
                | EntanglementType::BellPsiMinus
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntanglementType::BellPhiPlus => "bell_phi_plus",
            EntanglementType::BellPhiMinus => "bell_phi_minus",
            EntanglementType::BellPsiPlus => "bell_psi_plus",
            EntanglementType::BellPsiMinus => "bell_psi_minus",
            EntanglementType::Ghz => "ghz",
            EntanglementType::W => "w",
            EntanglementType::BiasedCustom => "biased_custom",
        }
    }
}

impl fmt::Display for EntanglementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for EntanglementType {
    type Err = QuantumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "bell_phi_plus" | "phi_plus" | "φ+" => Ok(EntanglementType::BellPhiPlus),
            "bell_phi_minus" | "phi_minus" | "φ_" => Ok(EntanglementType::BellPhiMinus),
            "bell_psi_plus" | "psi_plus" | "ψ+" => Ok(EntanglementType::BellPsiPlus),
            "bell_psi_minus" | "psi_minus" | "ψ_" => Ok(EntanglementType::BellPsiMinus),
            "ghz" => Ok(EntanglementType::Ghz),
            "w" | "w_state" => Ok(EntanglementType::W),
            "biased_custom" | "biased" | "custom" => Ok(EntanglementType::BiasedCustom),
            _ => Err(QuantumError::invalid_configuration(format!(
                "Unknown entanglement type '{}'",
                s
            ))),
        }
    }
}

/// 2x2 density matrix of one particle, obtained by tracing out the rest of the joint state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReducedState {
    pub rho: [[Complex64; 2]; 2],
}

impl ReducedState {
    /// Partial trace of a pure joint state onto `qubit`.
    pub fn from_joint(state: &QuantumState, qubit: usize) -> Self {
        let n = state.num_qubits();
        let mask = 1usize << (n - 1 - qubit.min(n - 1));
        let amps = state.amplitudes();
        let mut rho = [[Complex64::new(0.0, 0.0); 2]; 2];
        for k in 0..amps.len() {
            if k & mask != 0 {
                continue;
            }
            let a0 = amps[k];
            let a1 = amps[k | mask];
            rho[0][0] += a0 * a0.conj();
            rho[1][1] += a1 * a1.conj();
            rho[0][1] += a0 * a1.conj();
        }
        rho[1][0] = rho[0][1].conj();
        Self { rho }
    }

    /// Probabilities of reading 0 and 1.
    pub fn populations(&self) -> [f64; 2] {
        [self.rho[0][0].re, self.rho[1][1].re]
    }

    /// `Tr(ρ²)`; 1 for a pure marginal, 0.5 for a maximally mixed one.
    pub fn purity(&self) -> f64 {
        let [p0, p1] = self.populations();
        (p0 * p0 + p1 * p1 + 2.0 * self.rho[0][1].norm_sqr()).clamp(0.0, 1.0)
    }

    /// Von Neumann entropy (bits) from the eigenvalues of ρ.
    pub fn von_neumann_entropy(&self) -> f64 {
        let [p0, p1] = self.populations();
        let radius = ((p0 - p1).powi(2) + 4.0 * self.rho[0][1].norm_sqr()).sqrt();
        let lambda = ((1.0 + radius) / 2.0).clamp(0.0, 1.0);
        binary_entropy(lambda)
    }
}

/// Fidelity bands used by status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Fidelity at or above 0.95.
    Excellent,
    /// `[0.85, 0.95)`
    Good,
    /// `[0.7, 0.85)`
    Fair,
    /// Below 0.7.
    Poor,
}

impl QualityTier {
    pub fn from_fidelity(fidelity: f64) -> Self {
        if fidelity >= 0.95 {
            QualityTier::Excellent
        } else if fidelity >= 0.85 {
            QualityTier::Good
        } else if fidelity >= 0.7 {
            QualityTier::Fair
        } else {
            QualityTier::Poor
        }
    }
}

/// An entangled pair record owned by the manager's registry.
///
/// The metric fields are private: concurrence, negativity and entropy are pure
/// functions of the fidelity and are only ever recomputed together with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntangledPair {
    pub pair_id: PairId,
    /// Particle mapped to the most significant qubit of `joint_state`.
    pub particle_a_id: ParticleId,
    /// Particle mapped to the second qubit.
    pub particle_b_id: ParticleId,
    pub entanglement_type: EntanglementType,
    /// Prepared state, normalized. Two qubits for Bell and biased pairs, three for GHZ and W.
    pub joint_state: QuantumState,
    /// Partial trace of `joint_state` over everything except particle A.
    pub reduced_a: ReducedState,
    /// Partial trace over everything except particle B.
    pub reduced_b: ReducedState,
    pub created_at: SystemTime,
    /// Start of the current decay window. Equal to `created_at` until the first measurement.
    pub last_measured: SystemTime,
    pub measurement_count: u64,
    /// Lifetime bound in seconds since the last measurement; `None` is unbounded.
    pub coherence_time: Option<f64>,
    /// Per-second constant in `F = baseline·exp(−rate·elapsed)`.
    pub decoherence_rate: f64,
    /// Bias requested at creation, clamped into `[0, 1]`.
    pub bias_factor: Option<f64>,
    fidelity: f64,
    concurrence: f64,
    negativity: f64,
    entanglement_entropy: f64,
    baseline_fidelity: f64,
    elapsed_since_measurement: f64,
}

/// Arguments for `EntangledPair::new`, grouped to keep the constructor readable.
pub(crate) struct PairSpec {
    pub pair_id: PairId,
    pub particle_a_id: ParticleId,
    pub particle_b_id: ParticleId,
    pub entanglement_type: EntanglementType,
    pub joint_state: QuantumState,
    pub initial_fidelity: f64,
    pub coherence_time: Option<f64>,
    pub decoherence_rate: f64,
    pub bias_factor: Option<f64>,
}

impl EntangledPair {
    pub(crate) fn new(spec: PairSpec) -> Self {
        let now = SystemTime::now();
        let reduced_a = ReducedState::from_joint(&spec.joint_state, 0);
        let reduced_b = ReducedState::from_joint(&spec.joint_state, 1);
        let fidelity = spec.initial_fidelity.clamp(0.0, 1.0);
        let mut pair = Self {
            pair_id: spec.pair_id,
            particle_a_id: spec.particle_a_id,
            particle_b_id: spec.particle_b_id,
            entanglement_type: spec.entanglement_type,
            joint_state: spec.joint_state,
            reduced_a,
            reduced_b,
            created_at: now,
            last_measured: now,
            measurement_count: 0,
            coherence_time: spec.coherence_time,
            decoherence_rate: spec.decoherence_rate,
            bias_factor: spec.bias_factor,
            fidelity,
            concurrence: 0.0,
            negativity: 0.0,
            entanglement_entropy: 0.0,
            baseline_fidelity: fidelity,
            elapsed_since_measurement: 0.0,
        };
        pair.refresh_metrics();
        pair
    }

    pub fn fidelity(&self) -> f64 {
        self.fidelity
    }

    /// `max(0, 2F − 1)`
    pub fn concurrence(&self) -> f64 {
        self.concurrence
    }

    /// `max(0, F − 0.5)`
    pub fn negativity(&self) -> f64 {
        self.negativity
    }

    /// Entanglement of formation (bits) derived from the concurrence.
    pub fn entanglement_entropy(&self) -> f64 {
        self.entanglement_entropy
    }

    /// Seconds of decay accumulated since creation or the last measurement.
    pub fn elapsed_since_measurement(&self) -> f64 {
        self.elapsed_since_measurement
    }

    pub fn quality(&self) -> QualityTier {
        QualityTier::from_fidelity(self.fidelity)
    }

    pub fn involves(&self, particle: &ParticleId) -> bool {
        &self.particle_a_id == particle || &self.particle_b_id == particle
    }

    /// Advances the decay clock by `dt` seconds.
    /// `F = F_baseline · exp(−rate · elapsed)`, never increasing.
    pub(crate) fn advance(&mut self, dt_secs: f64) {
        if dt_secs <= 0.0 || !dt_secs.is_finite() {
            return;
        }
        self.elapsed_since_measurement += dt_secs;
        let decayed = self.baseline_fidelity * (-self.decoherence_rate * self.elapsed_since_measurement).exp();
        self.fidelity = decayed.min(self.fidelity).clamp(0.0, 1.0);
        self.refresh_metrics();
    }

    /// Whether the pair should leave the registry.
    pub(crate) fn is_expired(&self, eviction_threshold: f64) -> bool {
        if self.fidelity < eviction_threshold {
            return true;
        }
        matches!(self.coherence_time, Some(t) if self.elapsed_since_measurement > t)
    }

    /// Restarts the decay clock from the current fidelity.
    pub(crate) fn record_measurement(&mut self) {
        self.measurement_count += 1;
        self.last_measured = SystemTime::now();
        self.baseline_fidelity = self.fidelity;
        self.elapsed_since_measurement = 0.0;
    }

    pub(crate) fn set_decoherence_rate(&mut self, rate: f64) {
        // Re-base first so the new rate only applies from now on.
        self.baseline_fidelity = self.fidelity;
        self.elapsed_since_measurement = 0.0;
        self.decoherence_rate = rate;
    }

    fn refresh_metrics(&mut self) {
        self.concurrence = concurrence_from_fidelity(self.fidelity);
        self.negativity = negativity_from_fidelity(self.fidelity);
        self.entanglement_entropy = entropy_from_concurrence(self.concurrence);
    }
}

impl fmt::Display for EntangledPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} <-> {}] {} F={:.4} C={:.4}",
            self.pair_id, self.particle_a_id, self.particle_b_id, self.entanglement_type, self.fidelity, self.concurrence
        )
    }
}

pub fn concurrence_from_fidelity(fidelity: f64) -> f64 {
    (2.0 * fidelity - 1.0).max(0.0)
}

pub fn negativity_from_fidelity(fidelity: f64) -> f64 {
    (fidelity - 0.5).max(0.0)
}

/// Wootters' entanglement of formation: `h((1 + √(1 − C²)) / 2)`.
pub fn entropy_from_concurrence(concurrence: f64) -> f64 {
    let c = concurrence.clamp(0.0, 1.0);
    binary_entropy((1.0 + (1.0 - c * c).sqrt()) / 2.0)
}

fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -(p * p.log2() + (1.0 - p) * (1.0 - p).log2())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FRAC_1_SQRT_2;

    const TOLERANCE: f64 = 1e-9;

    fn phi_plus() -> QuantumState {
        QuantumState::from_amplitudes(vec![
            Complex64::new(FRAC_1_SQRT_2, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(FRAC_1_SQRT_2, 0.0),
        ])
        .unwrap()
    }

    fn pair(fidelity: f64) -> EntangledPair {
        EntangledPair::new(PairSpec {
            pair_id: PairId::new(),
            particle_a_id: "A".into(),
            particle_b_id: "B".into(),
            entanglement_type: EntanglementType::BellPhiPlus,
            joint_state: phi_plus(),
            initial_fidelity: fidelity,
            coherence_time: None,
            decoherence_rate: 0.01,
            bias_factor: None,
        })
    }

    #[test]
    fn test_metrics_follow_fidelity() {
        let mut p = pair(1.0);
        assert!((p.concurrence() - 1.0).abs() < TOLERANCE);
        assert!((p.negativity() - 0.5).abs() < TOLERANCE);
        assert!((p.entanglement_entropy() - 1.0).abs() < TOLERANCE);

        p.advance(30.0);
        let f = p.fidelity();
        assert!((f - (-0.3f64).exp()).abs() < TOLERANCE);
        assert!((p.concurrence() - (2.0 * f - 1.0).max(0.0)).abs() < TOLERANCE);
        assert!((p.negativity() - (f - 0.5).max(0.0)).abs() < TOLERANCE);
        assert!(p.entanglement_entropy() < 1.0);
    }

    #[test]
    fn test_decay_is_monotonic_and_rebased() {
        let mut p = pair(1.0);
        let mut previous = p.fidelity();
        for _ in 0..20 {
            p.advance(1.0);
            assert!(p.fidelity() <= previous);
            previous = p.fidelity();
        }
        p.record_measurement();
        assert_eq!(p.measurement_count, 1);
        assert_eq!(p.elapsed_since_measurement(), 0.0);
        p.advance(1.0);
        assert!((p.fidelity() - previous * (-0.01f64).exp()).abs() < TOLERANCE);
    }

    #[test]
    fn test_bell_marginals_are_maximally_mixed() {
        let reduced = ReducedState::from_joint(&phi_plus(), 0);
        assert!((reduced.populations()[0] - 0.5).abs() < TOLERANCE);
        assert!((reduced.purity() - 0.5).abs() < TOLERANCE);
        assert!((reduced.von_neumann_entropy() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("bell-phi-plus".parse::<EntanglementType>().ok(), Some(EntanglementType::BellPhiPlus));
        assert_eq!("GHZ".parse::<EntanglementType>().ok(), Some(EntanglementType::Ghz));
        assert!(matches!(
            "bell-omega".parse::<EntanglementType>(),
            Err(QuantumError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_quality_tiers() {
        assert_eq!(QualityTier::from_fidelity(0.99), QualityTier::Excellent);
        assert_eq!(QualityTier::from_fidelity(0.9), QualityTier::Good);
        assert_eq!(QualityTier::from_fidelity(0.75), QualityTier::Fair);
        assert_eq!(QualityTier::from_fidelity(0.6), QualityTier::Poor);
    }
}
