// src/core/state.rs

use super::constants::tolerances::{AMPLITUDE_EPSILON, NORM_EPSILON};
use super::error::{QuantumError, QuantumResult};
use num_complex::Complex64;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A multi-qubit pure state: `2^n` complex amplitudes with one human-readable
/// label per basis state.
///
/// Basis index `k` is read as a bit string with qubit 0 as the most significant
/// bit, so for two qubits the order is `|00>, |01>, |10>, |11>`.
///
/// States are plain values. Components hand them to each other by clone and never
/// share a mutable reference across threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StateRepr", into = "StateRepr")]
pub struct QuantumState {
    amplitudes: Vec<Complex64>,
    basis_labels: Vec<String>,
    /// Cached; recomputed whenever the amplitudes change.
    coherence: f64,
}

/// Serialized shape. The cached coherence is not part of it.
#[derive(Serialize, Deserialize)]
struct StateRepr {
    amplitudes: Vec<Complex64>,
    basis_labels: Vec<String>,
}

impl TryFrom<StateRepr> for QuantumState {
    type Error = QuantumError;

    fn try_from(repr: StateRepr) -> Result<Self, Self::Error> {
        // Deserialized input keeps its norm as-is, consumers validate it.
        QuantumState::from_raw_parts(repr.amplitudes, repr.basis_labels)
    }
}

impl From<QuantumState> for StateRepr {
    fn from(state: QuantumState) -> Self {
        StateRepr { amplitudes: state.amplitudes, basis_labels: state.basis_labels }
    }
}

impl QuantumState {
    /// Creates a normalized state from amplitudes and matching labels.
    ///
    /// # Errors
    /// `QuantumError::InvalidState` if the vector is empty, not a power-of-two
    /// length, contains non-finite values, is all zeros, or if the label count
    /// does not match.
    pub fn new(amplitudes: Vec<Complex64>, basis_labels: Vec<String>) -> QuantumResult<Self> {
        let mut state = Self::from_raw_parts(amplitudes, basis_labels)?;
        state.normalize()?;
        Ok(state)
    }

    /// Creates a normalized state labelled with the computational basis.
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> QuantumResult<Self> {
        let num_qubits = qubits_for_dim(amplitudes.len())?;
        Self::new(amplitudes, computational_labels(num_qubits))
    }

    /// The computational basis state `|index>` over `num_qubits` qubits.
    pub fn basis_state(num_qubits: usize, index: usize) -> QuantumResult<Self> {
        let dim = dim_for_qubits(num_qubits)?;
        if index >= dim {
            return Err(QuantumError::invalid_state(format!(
                "Basis index {} out of range for {} qubit(s)",
                index, num_qubits
            )));
        }
        let mut amplitudes = vec![Complex64::zero(); dim];
        amplitudes[index] = Complex64::new(1.0, 0.0);
        Self::new(amplitudes, computational_labels(num_qubits))
    }

    /// Validates shape only. The norm is left untouched, so callers must
    /// `normalize` before handing the state to an engine.
    pub fn from_raw_parts(amplitudes: Vec<Complex64>, basis_labels: Vec<String>) -> QuantumResult<Self> {
        qubits_for_dim(amplitudes.len())?;
        if amplitudes.len() != basis_labels.len() {
            return Err(QuantumError::invalid_state(format!(
                "Amplitude count {} does not match label count {}",
                amplitudes.len(),
                basis_labels.len()
            )));
        }
        if amplitudes.iter().any(|c| !c.re.is_finite() || !c.im.is_finite()) {
            return Err(QuantumError::invalid_state("State vector contains non-finite amplitudes"));
        }
        if amplitudes.iter().all(|c| c.norm_sqr() < AMPLITUDE_EPSILON) {
            return Err(QuantumError::invalid_state("State vector has all-zero amplitudes"));
        }
        let coherence = compute_coherence(&amplitudes);
        Ok(Self { amplitudes, basis_labels, coherence })
    }

    /// Rescales the amplitudes to unit norm. No-op when already normalized.
    pub fn normalize(&mut self) -> QuantumResult<()> {
        let norm_sq = self.norm_sqr();
        if !norm_sq.is_finite() || norm_sq < AMPLITUDE_EPSILON {
            return Err(QuantumError::invalid_state(format!(
                "Cannot normalize state with squared norm {}",
                norm_sq
            )));
        }
        if (norm_sq - 1.0).abs() > NORM_EPSILON {
            let scale = 1.0 / norm_sq.sqrt();
            for amp in self.amplitudes.iter_mut() {
                *amp *= scale;
            }
        }
        self.coherence = compute_coherence(&self.amplitudes);
        Ok(())
    }

    /// Off-diagonal coherence proxy in `[0, 1]`.
    ///
    /// `2·Σ_{i<j} |a_i||a_j| / (dim − 1)`: the ℓ1 off-diagonal magnitude of the
    /// density matrix scaled by its maximum (reached by the uniform superposition).
    pub fn coherence(&self) -> f64 {
        self.coherence
    }

    /// Read-only amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Read-only basis labels.
    pub fn basis_labels(&self) -> &[String] {
        &self.basis_labels
    }

    /// Label of basis state `index`.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.basis_labels.get(index).map(String::as_str)
    }

    /// Number of basis states (`2^n`).
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    /// Number of qubits `n`.
    pub fn num_qubits(&self) -> usize {
        self.amplitudes.len().trailing_zeros() as usize
    }

    /// `Σ|a_i|²`
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|c| c.norm_sqr()).sum()
    }

    /// Born-rule distribution `|a_i|²`, normalized by the current norm.
    pub fn probabilities(&self) -> Vec<f64> {
        let norm_sq = self.norm_sqr();
        self.amplitudes.iter().map(|c| c.norm_sqr() / norm_sq).collect()
    }

    /// Shannon entropy (bits) of the measurement distribution.
    pub fn entropy(&self) -> f64 {
        shannon_entropy(&self.probabilities())
    }

    /// Squared overlap `|<self|other>|²`.
    pub fn fidelity_with(&self, other: &QuantumState) -> QuantumResult<f64> {
        if self.dim() != other.dim() {
            return Err(QuantumError::invalid_state(format!(
                "Cannot compare states of dimension {} and {}",
                self.dim(),
                other.dim()
            )));
        }
        let overlap: Complex64 = self
            .amplitudes
            .iter()
            .zip(other.amplitudes.iter())
            .map(|(a, b)| a.conj() * b)
            .sum();
        Ok(overlap.norm_sqr().clamp(0.0, 1.0))
    }

    /// Applies `f` to a copy of the amplitude buffer and swaps it in,
    /// renormalized, if it still has support. On error the state is unchanged.
    pub fn map_amplitudes<F>(&mut self, f: F) -> QuantumResult<()>
    where
        F: FnOnce(&mut [Complex64]),
    {
        let mut amplitudes = self.amplitudes.clone();
        f(&mut amplitudes);
        self.commit(amplitudes)
    }

    /// Applies a 2x2 matrix to `qubit` (qubit 0 is the most significant bit).
    pub fn apply_single_qubit_gate(&mut self, qubit: usize, matrix: &[[Complex64; 2]; 2]) -> QuantumResult<()> {
        let num_qubits = self.num_qubits();
        if qubit >= num_qubits {
            return Err(QuantumError::invalid_parameter(format!(
                "Qubit {} out of range for {} qubit state",
                qubit, num_qubits
            )));
        }
        let k = num_qubits - 1 - qubit; // bit position from the right
        let k_mask = 1usize << k;
        let lower_mask = k_mask - 1;
        let upper_mask = !((k_mask << 1) - 1);

        let dim = self.dim();
        let mut new_vec = vec![Complex64::zero(); dim];
        // Pairs of basis states differing only at the target bit.
        for i in 0..dim / 2 {
            let i0 = ((i & upper_mask) << 1) | (i & lower_mask);
            let i1 = i0 | k_mask;
            let psi_0 = self.amplitudes[i0];
            let psi_1 = self.amplitudes[i1];
            new_vec[i0] = matrix[0][0] * psi_0 + matrix[0][1] * psi_1;
            new_vec[i1] = matrix[1][0] * psi_0 + matrix[1][1] * psi_1;
        }
        self.commit(new_vec)
    }

    fn commit(&mut self, amplitudes: Vec<Complex64>) -> QuantumResult<()> {
        let norm_sq: f64 = amplitudes.iter().map(Complex64::norm_sqr).sum();
        if !norm_sq.is_finite() || norm_sq < AMPLITUDE_EPSILON {
            return Err(QuantumError::invalid_state(format!(
                "Update would leave squared norm {}",
                norm_sq
            )));
        }
        self.amplitudes = amplitudes;
        self.normalize()
    }

    /// Replaces the labels, keeping amplitudes.
    pub fn relabel(&mut self, basis_labels: Vec<String>) -> QuantumResult<()> {
        if basis_labels.len() != self.dim() {
            return Err(QuantumError::invalid_state(format!(
                "Expected {} labels, got {}",
                self.dim(),
                basis_labels.len()
            )));
        }
        self.basis_labels = basis_labels;
        Ok(())
    }
}

impl fmt::Display for QuantumState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuantumState[")?;
        let mut first = true;
        for (amp, label) in self.amplitudes.iter().zip(self.basis_labels.iter()) {
            if amp.norm_sqr() < AMPLITUDE_EPSILON {
                continue;
            }
            write!(f, "{}{:.4}{}", if first { "" } else { " + " }, amp, label)?;
            first = false;
        }
        write!(f, "]")
    }
}

/// Computational basis labels `|0..0>` … `|1..1>` for `num_qubits`.
pub fn computational_labels(num_qubits: usize) -> Vec<String> {
    let dim = 1usize << num_qubits;
    (0..dim)
        .map(|k| format!("|{:0width$b}>", k, width = num_qubits))
        .collect()
}

/// Shannon entropy in bits, ignoring zero-probability entries.
pub fn shannon_entropy(probabilities: &[f64]) -> f64 {
    probabilities
        .iter()
        .filter(|p| **p > AMPLITUDE_EPSILON)
        .map(|p| -p * p.log2())
        .sum::<f64>()
        .max(0.0)
}

pub(crate) fn dim_for_qubits(num_qubits: usize) -> QuantumResult<usize> {
    if num_qubits == 0 || num_qubits >= usize::BITS as usize {
        return Err(QuantumError::invalid_state(format!(
            "Unsupported qubit count {}",
            num_qubits
        )));
    }
    Ok(1usize << num_qubits)
}

fn qubits_for_dim(dim: usize) -> QuantumResult<usize> {
    if dim < 2 || !dim.is_power_of_two() {
        return Err(QuantumError::invalid_state(format!(
            "State vector length {} is not a power of two >= 2",
            dim
        )));
    }
    Ok(dim.trailing_zeros() as usize)
}

fn compute_coherence(amplitudes: &[Complex64]) -> f64 {
    let dim = amplitudes.len();
    if dim < 2 {
        return 0.0;
    }
    let (l1, norm_sq) = amplitudes
        .iter()
        .fold((0.0, 0.0), |(l1, n), c| (l1 + c.norm(), n + c.norm_sqr()));
    if norm_sq < AMPLITUDE_EPSILON {
        return 0.0;
    }
    // (Σ|a|)² − Σ|a|² = 2·Σ_{i<j}|a_i||a_j|
    let off_diagonal = (l1 * l1 - norm_sq) / norm_sq;
    (off_diagonal / (dim as f64 - 1.0)).clamp(0.0, 1.0)
}
