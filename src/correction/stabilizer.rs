// src/correction/stabilizer.rs

//! Stabilizer layouts: generators, logical operators, codewords and the
//! syndrome lookup decoder derived from them.

use super::pauli::{Pauli, PauliString};
use crate::core::constants::tolerances::AMPLITUDE_EPSILON;
use crate::core::{QuantumError, QuantumResult, QuantumState};
use num_complex::Complex64;
use num_traits::Zero;
use std::collections::HashMap;

/// Largest register a layout may span; codewords are generated densely.
const MAX_LAYOUT_QUBITS: usize = 16;

/// A one-logical-qubit stabilizer code over `n` physical qubits.
#[derive(Debug, Clone)]
pub struct StabilizerLayout {
    n: usize,
    stabilizers: Vec<PauliString>,
    logical_x: PauliString,
    logical_z: PauliString,
    /// Sparse `|0_L⟩` and `|1_L⟩` as (basis index, amplitude).
    codewords: [Vec<(usize, Complex64)>; 2],
    /// Generators of each type, as syndrome bitmasks.
    x_check_mask: u64,
    z_check_mask: u64,
    /// Z-check syndrome → minimum-weight X correction.
    x_decoder: HashMap<u64, PauliString>,
    /// X-check syndrome → minimum-weight Z correction.
    z_decoder: HashMap<u64, PauliString>,
    max_correctable_weight: usize,
}

/// Collects generators before validation. See [`StabilizerLayout::builder`].
#[derive(Debug, Clone)]
pub struct StabilizerLayoutBuilder {
    n: usize,
    checks: Vec<(Pauli, Vec<usize>)>,
    logical_x: Option<(Pauli, Vec<usize>)>,
    logical_z: Option<(Pauli, Vec<usize>)>,
    max_correctable_weight: usize,
}

impl StabilizerLayoutBuilder {
    /// Adds a generator acting as `Z` on `qubits`.
    pub fn z_check(mut self, qubits: &[usize]) -> Self {
        self.checks.push((Pauli::Z, qubits.to_vec()));
        self
    }

    /// Adds a generator acting as `X` on `qubits`.
    pub fn x_check(mut self, qubits: &[usize]) -> Self {
        self.checks.push((Pauli::X, qubits.to_vec()));
        self
    }

    pub fn logical_x(mut self, pauli: Pauli, qubits: &[usize]) -> Self {
        self.logical_x = Some((pauli, qubits.to_vec()));
        self
    }

    pub fn logical_z(mut self, pauli: Pauli, qubits: &[usize]) -> Self {
        self.logical_z = Some((pauli, qubits.to_vec()));
        self
    }

    /// Decoder table covers every error up to this weight.
    pub fn decode_up_to(mut self, weight: usize) -> Self {
        self.max_correctable_weight = weight;
        self
    }

    /// Validates the algebra and derives codewords and decoder.
    ///
    /// # Errors
    /// `InvalidConfiguration` if a qubit index is out of range, generators do not
    /// commute, the logical operators are missing or do not form a logical qubit,
    /// or the code space is empty.
    pub fn build(self) -> QuantumResult<StabilizerLayout> {
        let n = self.n;
        if n == 0 || n > MAX_LAYOUT_QUBITS {
            return Err(QuantumError::invalid_configuration(format!(
                "Stabilizer layout must span 1..={} qubits, got {}",
                MAX_LAYOUT_QUBITS, n
            )));
        }
        let to_pauli = |(pauli, qubits): &(Pauli, Vec<usize>)| -> QuantumResult<PauliString> {
            if let Some(q) = qubits.iter().find(|q| **q >= n) {
                return Err(QuantumError::invalid_configuration(format!(
                    "Qubit {} out of range for a {} qubit layout",
                    q, n
                )));
            }
            Ok(PauliString::on_qubits(*pauli, qubits, n))
        };

        let stabilizers = self.checks.iter().map(to_pauli).collect::<QuantumResult<Vec<_>>>()?;
        let logical_x = self
            .logical_x
            .as_ref()
            .ok_or_else(|| QuantumError::invalid_configuration("Layout is missing a logical X operator"))
            .and_then(to_pauli)?;
        let logical_z = self
            .logical_z
            .as_ref()
            .ok_or_else(|| QuantumError::invalid_configuration("Layout is missing a logical Z operator"))
            .and_then(to_pauli)?;

        for (i, a) in stabilizers.iter().enumerate() {
            if stabilizers[i + 1..].iter().any(|b| !a.commutes_with(b)) {
                return Err(QuantumError::invalid_configuration(format!(
                    "Stabilizer {} anticommutes with a later generator",
                    a.display(n)
                )));
            }
            if !a.commutes_with(&logical_x) || !a.commutes_with(&logical_z) {
                return Err(QuantumError::invalid_configuration(format!(
                    "Stabilizer {} does not commute with the logical operators",
                    a.display(n)
                )));
            }
        }
        if logical_x.commutes_with(&logical_z) {
            return Err(QuantumError::invalid_configuration("Logical X and Z must anticommute"));
        }

        let zero_dense = zero_codeword(n, &stabilizers, &logical_z)?;
        let mut one_dense = zero_dense.clone();
        logical_x.apply_to_amplitudes(&mut one_dense);

        let mask_of = |kind: Pauli| {
            self.checks
                .iter()
                .enumerate()
                .filter(|(_, (pauli, _))| *pauli == kind)
                .fold(0u64, |acc, (k, _)| acc | (1 << k))
        };
        let mut layout = StabilizerLayout {
            n,
            stabilizers,
            logical_x,
            logical_z,
            codewords: [sparsify(&zero_dense), sparsify(&one_dense)],
            x_check_mask: mask_of(Pauli::X),
            z_check_mask: mask_of(Pauli::Z),
            x_decoder: HashMap::new(),
            z_decoder: HashMap::new(),
            max_correctable_weight: self.max_correctable_weight,
        };
        layout.x_decoder = layout.build_decoder(Pauli::X);
        layout.z_decoder = layout.build_decoder(Pauli::Z);
        Ok(layout)
    }
}

impl StabilizerLayout {
    pub fn builder(n: usize) -> StabilizerLayoutBuilder {
        StabilizerLayoutBuilder {
            n,
            checks: Vec::new(),
            logical_x: None,
            logical_z: None,
            max_correctable_weight: 1,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn stabilizers(&self) -> &[PauliString] {
        &self.stabilizers
    }

    pub fn logical_x(&self) -> PauliString {
        self.logical_x
    }

    pub fn logical_z(&self) -> PauliString {
        self.logical_z
    }

    pub fn max_correctable_weight(&self) -> usize {
        self.max_correctable_weight
    }

    /// Bit `k` set when `error` anticommutes with generator `k`.
    pub fn syndrome_of(&self, error: &PauliString) -> u64 {
        self.stabilizers
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.commutes_with(error))
            .fold(0u64, |acc, (k, _)| acc | (1 << k))
    }

    /// Syndrome read off the state: bit `k` set when `⟨S_k⟩ < 0`.
    pub fn measured_syndrome(&self, state: &QuantumState) -> u64 {
        self.stabilizers
            .iter()
            .enumerate()
            .filter(|(_, s)| s.expectation(state.amplitudes()) < 0.0)
            .fold(0u64, |acc, (k, _)| acc | (1 << k))
    }

    /// Minimum-weight correction for `syndrome`, if one is within the table's reach.
    /// The X and Z sectors are decoded independently.
    pub fn lookup(&self, syndrome: u64) -> Option<PauliString> {
        let x_part = self.x_decoder.get(&(syndrome & self.z_check_mask))?;
        let z_part = self.z_decoder.get(&(syndrome & self.x_check_mask))?;
        Some(x_part.compose(z_part))
    }

    /// Whether `residual` acts trivially on the logical qubit.
    pub fn is_logically_trivial(&self, residual: &PauliString) -> bool {
        residual.commutes_with(&self.logical_x) && residual.commutes_with(&self.logical_z)
    }

    /// `|bit_L⟩` as a dense state.
    pub fn codeword(&self, bit: usize) -> QuantumResult<QuantumState> {
        let sparse = self
            .codewords
            .get(bit)
            .ok_or_else(|| QuantumError::invalid_parameter(format!("No codeword for logical value {}", bit)))?;
        let mut dense = vec![Complex64::zero(); 1 << self.n];
        for (idx, amp) in sparse {
            dense[*idx] = *amp;
        }
        QuantumState::from_amplitudes(dense)
    }

    /// `α|0⟩ + β|1⟩` → `α|0_L⟩ + β|1_L⟩`.
    pub fn encode(&self, state: &mut QuantumState) -> QuantumResult<()> {
        if state.dim() != 2 {
            return Err(QuantumError::invalid_state(format!(
                "Encoding expects a single logical qubit, got {} amplitudes",
                state.dim()
            )));
        }
        let (alpha, beta) = (state.amplitudes()[0], state.amplitudes()[1]);
        let mut dense = vec![Complex64::zero(); 1 << self.n];
        for (idx, amp) in &self.codewords[0] {
            dense[*idx] += alpha * amp;
        }
        for (idx, amp) in &self.codewords[1] {
            dense[*idx] += beta * amp;
        }
        *state = QuantumState::from_amplitudes(dense)?;
        Ok(())
    }

    /// Projects onto the codewords and returns the logical qubit.
    pub fn decode(&self, state: &mut QuantumState) -> QuantumResult<()> {
        self.check_register(state)?;
        let [alpha, beta] = self.logical_amplitudes(state);
        if alpha.norm_sqr() + beta.norm_sqr() < AMPLITUDE_EPSILON {
            return Err(QuantumError::invalid_state("State has no support on the code space"));
        }
        *state = QuantumState::from_amplitudes(vec![alpha, beta])?;
        Ok(())
    }

    /// `|⟨0_L|ψ⟩|² + |⟨1_L|ψ⟩|²`
    pub fn code_space_fidelity(&self, state: &QuantumState) -> f64 {
        if state.num_qubits() != self.n {
            return 0.0;
        }
        let [alpha, beta] = self.logical_amplitudes(state);
        (alpha.norm_sqr() + beta.norm_sqr()).clamp(0.0, 1.0)
    }

    pub(crate) fn check_register(&self, state: &QuantumState) -> QuantumResult<()> {
        if state.num_qubits() != self.n {
            return Err(QuantumError::invalid_state(format!(
                "Expected a {} qubit register, got {} qubit(s)",
                self.n,
                state.num_qubits()
            )));
        }
        Ok(())
    }

    fn logical_amplitudes(&self, state: &QuantumState) -> [Complex64; 2] {
        let amps = state.amplitudes();
        let overlap = |codeword: &[(usize, Complex64)]| -> Complex64 {
            codeword.iter().map(|(idx, c)| c.conj() * amps[*idx]).sum()
        };
        [overlap(&self.codewords[0]), overlap(&self.codewords[1])]
    }

    /// Enumerates `pauli`-type errors by increasing weight so the first entry
    /// per syndrome is minimal.
    fn build_decoder(&self, pauli: Pauli) -> HashMap<u64, PauliString> {
        let mut table = HashMap::new();
        table.insert(0, PauliString::IDENTITY);
        for weight in 1..=self.max_correctable_weight.min(self.n) {
            let mut qubits = Vec::with_capacity(weight);
            self.enumerate_supports(pauli, 0, weight, &mut qubits, &mut table);
        }
        table
    }

    fn enumerate_supports(
        &self,
        pauli: Pauli,
        start: usize,
        weight: usize,
        qubits: &mut Vec<usize>,
        table: &mut HashMap<u64, PauliString>,
    ) {
        if qubits.len() == weight {
            let error = PauliString::on_qubits(pauli, qubits, self.n);
            table.entry(self.syndrome_of(&error)).or_insert(error);
            return;
        }
        for q in start..self.n {
            qubits.push(q);
            self.enumerate_supports(pauli, q + 1, weight, qubits, table);
            qubits.pop();
        }
    }
}

/// `Π(I + S_k)(I + Z_L)|0…0⟩`, normalized.
fn zero_codeword(n: usize, stabilizers: &[PauliString], logical_z: &PauliString) -> QuantumResult<Vec<Complex64>> {
    let mut dense = vec![Complex64::zero(); 1 << n];
    dense[0] = Complex64::new(1.0, 0.0);
    for generator in std::iter::once(logical_z).chain(stabilizers.iter()) {
        let mut image = dense.clone();
        generator.apply_to_amplitudes(&mut image);
        for (a, b) in dense.iter_mut().zip(image) {
            *a += b;
        }
    }
    let norm_sq: f64 = dense.iter().map(|c| c.norm_sqr()).sum();
    if norm_sq < AMPLITUDE_EPSILON {
        return Err(QuantumError::invalid_configuration(
            "Stabilizer group has no +1 eigenstate overlapping |0...0>",
        ));
    }
    let scale = 1.0 / norm_sq.sqrt();
    dense.iter_mut().for_each(|c| *c *= scale);
    Ok(dense)
}

fn sparsify(dense: &[Complex64]) -> Vec<(usize, Complex64)> {
    dense
        .iter()
        .enumerate()
        .filter(|(_, c)| c.norm_sqr() > AMPLITUDE_EPSILON)
        .map(|(i, c)| (i, *c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn three_qubit_bit_flip() -> StabilizerLayout {
        StabilizerLayout::builder(3)
            .z_check(&[0, 1])
            .z_check(&[1, 2])
            .logical_x(Pauli::X, &[0, 1, 2])
            .logical_z(Pauli::Z, &[0, 1, 2])
            .build()
            .unwrap()
    }

    #[test]
    fn test_codewords() -> QuantumResult<()> {
        let layout = three_qubit_bit_flip();
        let zero = layout.codeword(0)?;
        let one = layout.codeword(1)?;
        assert!((zero.amplitudes()[0].re - 1.0).abs() < TOLERANCE);
        assert!((one.amplitudes()[7].re - 1.0).abs() < TOLERANCE);
        assert!(zero.fidelity_with(&one)? < TOLERANCE);
        Ok(())
    }

    #[test]
    fn test_syndromes_are_distinct_for_single_flips() {
        let layout = three_qubit_bit_flip();
        let syndromes: Vec<u64> = (0..3)
            .map(|q| layout.syndrome_of(&PauliString::single(Pauli::X, q, 3)))
            .collect();
        assert_eq!(syndromes, vec![0b01, 0b11, 0b10]);
        assert_eq!(layout.lookup(0b11), Some(PauliString::single(Pauli::X, 1, 3)));
    }

    #[test]
    fn test_measured_syndrome_matches_injected_error() -> QuantumResult<()> {
        let layout = three_qubit_bit_flip();
        let mut state = layout.codeword(0)?;
        let error = PauliString::single(Pauli::X, 2, 3);
        error.apply(&mut state)?;
        assert_eq!(layout.measured_syndrome(&state), layout.syndrome_of(&error));
        assert!(layout.code_space_fidelity(&state) < TOLERANCE);
        Ok(())
    }

    #[test]
    fn test_rejects_inconsistent_layouts() {
        let anticommuting = StabilizerLayout::builder(2)
            .z_check(&[0])
            .x_check(&[0])
            .logical_x(Pauli::X, &[1])
            .logical_z(Pauli::Z, &[1])
            .build();
        assert!(matches!(anticommuting, Err(QuantumError::InvalidConfiguration { .. })));

        let out_of_range = StabilizerLayout::builder(2)
            .z_check(&[0, 5])
            .logical_x(Pauli::X, &[0, 1])
            .logical_z(Pauli::Z, &[0])
            .build();
        assert!(matches!(out_of_range, Err(QuantumError::InvalidConfiguration { .. })));

        let missing_logical = StabilizerLayout::builder(2).z_check(&[0, 1]).build();
        assert!(matches!(missing_logical, Err(QuantumError::InvalidConfiguration { .. })));
    }
}
