// src/correction/pauli.rs

//! Pauli strings in symplectic form.
//!
//! A string over `n` qubits is a pair of bitmasks. Qubit `q` lives at bit
//! `n − 1 − q`, matching the state vector's basis ordering where qubit 0 is the
//! most significant bit. Phases are dropped on composition; every use in this
//! crate either compares strings up to phase or applies them to states whose
//! global phase is irrelevant.

use crate::core::{QuantumError, QuantumResult, QuantumState};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    X,
    Y,
    Z,
}

impl Pauli {
    pub const ALL: [Pauli; 3] = [Pauli::X, Pauli::Z, Pauli::Y];

    fn bits(&self) -> (bool, bool) {
        match self {
            Pauli::X => (true, false),
            Pauli::Y => (true, true),
            Pauli::Z => (false, true),
        }
    }
}

/// Tensor product of Paulis on up to 64 qubits, phase ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PauliString {
    pub x: u64,
    pub z: u64,
}

impl PauliString {
    pub const IDENTITY: PauliString = PauliString { x: 0, z: 0 };

    /// `pauli` on `qubit` of an `n`-qubit register.
    pub fn single(pauli: Pauli, qubit: usize, n: usize) -> Self {
        let mask = qubit_mask(qubit, n);
        let (x, z) = pauli.bits();
        PauliString { x: if x { mask } else { 0 }, z: if z { mask } else { 0 } }
    }

    /// `pauli` on every listed qubit.
    pub fn on_qubits(pauli: Pauli, qubits: &[usize], n: usize) -> Self {
        qubits
            .iter()
            .fold(Self::IDENTITY, |acc, &q| acc.compose(&Self::single(pauli, q, n)))
    }

    /// `pauli` on all `n` qubits.
    pub fn uniform(pauli: Pauli, n: usize) -> Self {
        let qubits: Vec<usize> = (0..n).collect();
        Self::on_qubits(pauli, &qubits, n)
    }

    pub fn is_identity(&self) -> bool {
        self.x == 0 && self.z == 0
    }

    /// Number of qubits acted on non-trivially.
    pub fn weight(&self) -> u32 {
        (self.x | self.z).count_ones()
    }

    /// Product up to phase.
    pub fn compose(&self, other: &PauliString) -> PauliString {
        PauliString { x: self.x ^ other.x, z: self.z ^ other.z }
    }

    /// Symplectic inner product is zero.
    pub fn commutes_with(&self, other: &PauliString) -> bool {
        ((self.x & other.z).count_ones() + (self.z & other.x).count_ones()) % 2 == 0
    }

    /// Phase picked up by basis state `j`: `i^{|x∧z|} · (−1)^{|j∧z|}`.
    fn phase(&self, j: usize) -> Complex64 {
        let y_count = (self.x & self.z).count_ones();
        let base = match y_count % 4 {
            0 => Complex64::new(1.0, 0.0),
            1 => Complex64::new(0.0, 1.0),
            2 => Complex64::new(-1.0, 0.0),
            _ => Complex64::new(0.0, -1.0),
        };
        if (j as u64 & self.z).count_ones() % 2 == 1 { -base } else { base }
    }

    /// Applies the string to a dense amplitude vector: `P|j⟩ = phase(j)·|j ⊕ x⟩`.
    pub fn apply_to_amplitudes(&self, amplitudes: &mut [Complex64]) {
        if self.is_identity() {
            return;
        }
        let original = amplitudes.to_vec();
        let x = self.x as usize;
        for (j, amp) in original.iter().enumerate() {
            amplitudes[j ^ x] = self.phase(j) * amp;
        }
    }

    /// Applies the string to a state whose qubit count covers its support.
    pub fn apply(&self, state: &mut QuantumState) -> QuantumResult<()> {
        let n = state.num_qubits();
        if n < 64 && (self.x | self.z) >> n != 0 {
            return Err(QuantumError::invalid_parameter(format!(
                "Pauli string exceeds the {} qubit state",
                n
            )));
        }
        state.map_amplitudes(|amps| self.apply_to_amplitudes(amps))
    }

    /// `⟨ψ|P|ψ⟩`, real for Hermitian strings.
    pub fn expectation(&self, amplitudes: &[Complex64]) -> f64 {
        let x = self.x as usize;
        amplitudes
            .iter()
            .enumerate()
            .map(|(j, amp)| (amplitudes[j ^ x].conj() * self.phase(j) * amp).re)
            .sum()
    }

    /// Per-qubit rendering such as `XIZY`.
    pub fn display(&self, n: usize) -> DisplayPauli {
        DisplayPauli { pauli: *self, n }
    }
}

/// Helper returned by [`PauliString::display`].
pub struct DisplayPauli {
    pauli: PauliString,
    n: usize,
}

impl fmt::Display for DisplayPauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for q in 0..self.n {
            let mask = qubit_mask(q, self.n);
            let c = match (self.pauli.x & mask != 0, self.pauli.z & mask != 0) {
                (false, false) => 'I',
                (true, false) => 'X',
                (true, true) => 'Y',
                (false, true) => 'Z',
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

pub(crate) fn qubit_mask(qubit: usize, n: usize) -> u64 {
    1u64 << (n - 1 - qubit)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn test_commutation() {
        let n = 3;
        let x0 = PauliString::single(Pauli::X, 0, n);
        let z0 = PauliString::single(Pauli::Z, 0, n);
        let z1 = PauliString::single(Pauli::Z, 1, n);
        let z0z1 = z0.compose(&z1);
        assert!(!x0.commutes_with(&z0));
        assert!(x0.commutes_with(&z1));
        assert!(!x0.commutes_with(&z0z1));
        let x0x1 = PauliString::on_qubits(Pauli::X, &[0, 1], n);
        assert!(x0x1.commutes_with(&z0z1));
        assert_eq!(x0x1.weight(), 2);
    }

    #[test]
    fn test_apply_matches_matrices() -> QuantumResult<()> {
        // |0> -> Y|0> = i|1>
        let mut state = QuantumState::basis_state(1, 0)?;
        PauliString::single(Pauli::Y, 0, 1).apply(&mut state)?;
        let amps = state.amplitudes();
        assert!(amps[0].norm() < TOLERANCE);
        assert!((amps[1] - Complex64::new(0.0, 1.0)).norm() < TOLERANCE);

        // X on qubit 0 of |01> gives |11>
        let mut state = QuantumState::basis_state(2, 1)?;
        PauliString::single(Pauli::X, 0, 2).apply(&mut state)?;
        assert!((state.amplitudes()[3].re - 1.0).abs() < TOLERANCE);
        Ok(())
    }

    #[test]
    fn test_expectation_signs() -> QuantumResult<()> {
        let one = QuantumState::basis_state(2, 1)?;
        let z1 = PauliString::single(Pauli::Z, 1, 2);
        let z0 = PauliString::single(Pauli::Z, 0, 2);
        assert!((z1.expectation(one.amplitudes()) + 1.0).abs() < TOLERANCE);
        assert!((z0.expectation(one.amplitudes()) - 1.0).abs() < TOLERANCE);
        Ok(())
    }

    #[test]
    fn test_display() {
        let p = PauliString::single(Pauli::X, 0, 4).compose(&PauliString::single(Pauli::Y, 3, 4));
        assert_eq!(p.display(4).to_string(), "XIIY");
    }
}
