// src/correction/codes.rs

//! The supported codes and the shared correction procedure.

use super::pauli::{Pauli, PauliString};
use super::result::CorrectionResult;
use super::stabilizer::StabilizerLayout;
use crate::core::{QuantumError, QuantumResult, QuantumState};
use crate::validation::validate_state;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Instant, SystemTime};
use tracing::{debug, warn};

/// Depolarizing tags resolved jointly; larger sets are left uncorrected.
const MAX_JOINT_DEPOLARIZING: usize = 4;

/// Identifies one of the built-in codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeType {
    /// 3-qubit bit-flip repetition code.
    Repetition,
    /// Shor's 9-qubit code.
    Shor9,
    /// Steane's 7-qubit CSS code.
    Steane7,
    /// 13-qubit planar surface code.
    Surface,
    /// 5-qubit repetition code with bias-assisted recovery.
    Adaptive,
}

impl CodeType {
    pub const ALL: [CodeType; 5] = [
        CodeType::Repetition,
        CodeType::Shor9,
        CodeType::Steane7,
        CodeType::Surface,
        CodeType::Adaptive,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CodeType::Repetition => "repetition",
            CodeType::Shor9 => "shor9",
            CodeType::Steane7 => "steane7",
            CodeType::Surface => "surface",
            CodeType::Adaptive => "adaptive",
        }
    }

    /// Builds the code's layout and decoder.
    pub fn build(&self) -> QuantumResult<Box<dyn CorrectionCode>> {
        Ok(match self {
            CodeType::Repetition => Box::new(StabilizerCode::repetition()?),
            CodeType::Shor9 => Box::new(StabilizerCode::shor9()?),
            CodeType::Steane7 => Box::new(StabilizerCode::steane7()?),
            CodeType::Surface => Box::new(StabilizerCode::surface()?),
            CodeType::Adaptive => Box::new(AdaptiveCode::new()?),
        })
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CodeType {
    type Err = QuantumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "repetition" | "bit_flip" => Ok(CodeType::Repetition),
            "shor9" | "shor" | "shor_9" => Ok(CodeType::Shor9),
            "steane7" | "steane" | "steane_7" => Ok(CodeType::Steane7),
            "surface" | "surface_code" => Ok(CodeType::Surface),
            "adaptive" => Ok(CodeType::Adaptive),
            _ => Err(QuantumError::UnsupportedCode { name: s.to_string() }),
        }
    }
}

/// Kind of a tagged physical error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// X
    BitFlip,
    /// Z
    PhaseFlip,
    /// Y
    BitPhaseFlip,
    /// Unknown Pauli (X, Y or Z) on a known qubit.
    Depolarizing,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 4] = [
        ErrorKind::BitFlip,
        ErrorKind::PhaseFlip,
        ErrorKind::BitPhaseFlip,
        ErrorKind::Depolarizing,
    ];

    /// The Pauli this kind applies, `None` when it is not known up front.
    pub fn pauli(&self) -> Option<Pauli> {
        match self {
            ErrorKind::BitFlip => Some(Pauli::X),
            ErrorKind::PhaseFlip => Some(Pauli::Z),
            ErrorKind::BitPhaseFlip => Some(Pauli::Y),
            ErrorKind::Depolarizing => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BitFlip => "bit_flip",
            ErrorKind::PhaseFlip => "phase_flip",
            ErrorKind::BitPhaseFlip => "bit_phase_flip",
            ErrorKind::Depolarizing => "depolarizing",
        }
    }
}

/// A physical error reported by the noise source: its kind and the qubit it hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorTag {
    pub kind: ErrorKind,
    pub qubit: usize,
}

impl ErrorTag {
    pub fn new(kind: ErrorKind, qubit: usize) -> Self {
        Self { kind, qubit }
    }

    pub fn bit_flip(qubit: usize) -> Self {
        Self::new(ErrorKind::BitFlip, qubit)
    }

    pub fn phase_flip(qubit: usize) -> Self {
        Self::new(ErrorKind::PhaseFlip, qubit)
    }

    pub fn bit_phase_flip(qubit: usize) -> Self {
        Self::new(ErrorKind::BitPhaseFlip, qubit)
    }

    pub fn depolarizing(qubit: usize) -> Self {
        Self::new(ErrorKind::Depolarizing, qubit)
    }
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind.name(), self.qubit)
    }
}

/// A quantum error-correcting code protecting one logical qubit.
pub trait CorrectionCode: Send + Sync {
    fn code_type(&self) -> CodeType;

    fn layout(&self) -> &StabilizerLayout;

    fn code_distance(&self) -> usize;

    fn correctable_errors(&self) -> &[ErrorKind];

    /// Nominal fidelity of the encoding circuit this code models.
    fn encoding_fidelity(&self) -> f64;

    /// Nominal fidelity of the decoding circuit this code models.
    fn decoding_fidelity(&self) -> f64;

    fn n_physical_qubits(&self) -> usize {
        self.layout().n()
    }

    fn n_logical_qubits(&self) -> usize {
        1
    }

    /// Replaces a one-qubit state with its encoded block.
    fn encode(&self, state: &mut QuantumState) -> QuantumResult<()> {
        validate_state(state, None)?;
        self.layout().encode(state)
    }

    /// Replaces an encoded block with the logical qubit it carries.
    fn decode(&self, state: &mut QuantumState) -> QuantumResult<()> {
        self.layout().decode(state)
    }

    /// Weight of the state inside the code space.
    fn code_space_fidelity(&self, state: &QuantumState) -> f64 {
        self.layout().code_space_fidelity(state)
    }

    /// Undoes the tagged errors the code can handle and reports the rest.
    fn correct(
        &self,
        state: &mut QuantumState,
        errors: &[ErrorTag],
        bias: Option<f64>,
        rng: &mut dyn RngCore,
    ) -> QuantumResult<CorrectionResult>;
}

/// A CSS code decoded by syndrome lookup. Bias is ignored.
#[derive(Debug, Clone)]
pub struct StabilizerCode {
    code_type: CodeType,
    distance: usize,
    correctable: Vec<ErrorKind>,
    encoding_fidelity: f64,
    decoding_fidelity: f64,
    layout: StabilizerLayout,
}

impl StabilizerCode {
    /// Checks `Z_i Z_{i+1}`, corrects single bit flips.
    pub fn repetition() -> QuantumResult<Self> {
        Ok(Self {
            code_type: CodeType::Repetition,
            distance: 3,
            correctable: vec![ErrorKind::BitFlip],
            encoding_fidelity: 0.99,
            decoding_fidelity: 0.99,
            layout: repetition_layout(3, 1)?,
        })
    }

    /// `|0_L⟩ = (|000⟩ + |111⟩)^⊗3 / 2√2`, `|1_L⟩ = (|000⟩ − |111⟩)^⊗3 / 2√2`.
    pub fn shor9() -> QuantumResult<Self> {
        let all: Vec<usize> = (0..9).collect();
        let layout = StabilizerLayout::builder(9)
            .z_check(&[0, 1])
            .z_check(&[1, 2])
            .z_check(&[3, 4])
            .z_check(&[4, 5])
            .z_check(&[6, 7])
            .z_check(&[7, 8])
            .x_check(&[0, 1, 2, 3, 4, 5])
            .x_check(&[3, 4, 5, 6, 7, 8])
            .logical_x(Pauli::Z, &all)
            .logical_z(Pauli::X, &all)
            .decode_up_to(1)
            .build()?;
        Ok(Self {
            code_type: CodeType::Shor9,
            distance: 3,
            correctable: ErrorKind::ALL.to_vec(),
            encoding_fidelity: 0.95,
            decoding_fidelity: 0.96,
            layout,
        })
    }

    /// Hamming [7,4] parity checks used for both X and Z generators.
    pub fn steane7() -> QuantumResult<Self> {
        const HAMMING_ROWS: [[usize; 4]; 3] = [[3, 4, 5, 6], [1, 2, 5, 6], [0, 2, 4, 6]];
        let all: Vec<usize> = (0..7).collect();
        let layout = HAMMING_ROWS
            .iter()
            .fold(StabilizerLayout::builder(7), |builder, row| builder.x_check(row).z_check(row))
            .logical_x(Pauli::X, &all)
            .logical_z(Pauli::Z, &all)
            .decode_up_to(1)
            .build()?;
        Ok(Self {
            code_type: CodeType::Steane7,
            distance: 3,
            correctable: ErrorKind::ALL.to_vec(),
            encoding_fidelity: 0.97,
            decoding_fidelity: 0.97,
            layout,
        })
    }

    /// Planar 5x5 lattice: data qubits on cells with even `row + col`, X plaquettes on
    /// (even, odd) cells, Z vertices on (odd, even) cells.
    pub fn surface() -> QuantumResult<Self> {
        Ok(Self {
            code_type: CodeType::Surface,
            distance: 5,
            correctable: ErrorKind::ALL.to_vec(),
            encoding_fidelity: 0.98,
            decoding_fidelity: 0.985,
            layout: surface_layout()?,
        })
    }

    /// Runs the shared procedure, trusting decoder-rejected tags with probability `trust`.
    fn run(
        &self,
        state: &mut QuantumState,
        errors: &[ErrorTag],
        trust: Option<f64>,
        rng: &mut dyn RngCore,
    ) -> QuantumResult<CorrectionResult> {
        let started_at = SystemTime::now();
        let clock = Instant::now();
        let layout = &self.layout;
        let n = layout.n();
        layout.check_register(state)?;
        validate_state(state, None)?;
        let fidelity_before = layout.code_space_fidelity(state);

        // Pauli each tag stands for; None marks it uncorrectable.
        let mut resolved: Vec<Option<PauliString>> = vec![None; errors.len()];
        let mut deterministic = PauliString::IDENTITY;
        let mut depolarizing = Vec::new();
        for (i, tag) in errors.iter().enumerate() {
            if tag.qubit >= n || !self.correctable.contains(&tag.kind) {
                continue;
            }
            match tag.kind.pauli() {
                Some(pauli) => {
                    let error = PauliString::single(pauli, tag.qubit, n);
                    deterministic = deterministic.compose(&error);
                    resolved[i] = Some(error);
                }
                None => depolarizing.push(i),
            }
        }

        if !depolarizing.is_empty() {
            let residual = layout.measured_syndrome(state) ^ layout.syndrome_of(&deterministic);
            let qubits: Vec<usize> = depolarizing.iter().map(|&i| errors[i].qubit).collect();
            if let Some(paulis) = resolve_depolarizing(layout, &qubits, residual) {
                for (&i, pauli) in depolarizing.iter().zip(paulis) {
                    resolved[i] = Some(pauli);
                }
            }
        }

        // Accept tags one by one while the decoder still recovers the logical state.
        let mut corrected = vec![false; errors.len()];
        let mut accepted = PauliString::IDENTITY;
        for (i, error) in resolved.iter().enumerate() {
            let Some(error) = error else { continue };
            let candidate = accepted.compose(error);
            if recoverable(layout, &candidate) {
                accepted = candidate;
                corrected[i] = true;
            }
        }
        let mut correction = layout
            .lookup(layout.syndrome_of(&accepted))
            .unwrap_or(PauliString::IDENTITY);
        let mut corrected_set = accepted;

        let mut bias_applied = false;
        if let Some(trust) = trust.filter(|b| *b > 0.0) {
            for (i, error) in resolved.iter().enumerate() {
                let Some(error) = error else { continue };
                if corrected[i] {
                    continue;
                }
                bias_applied = true;
                if rng.random::<f64>() < trust {
                    correction = correction.compose(error);
                    corrected_set = corrected_set.compose(error);
                    corrected[i] = true;
                }
            }
        }

        correction.apply(state)?;

        let mut corrected_errors = Vec::new();
        let mut uncorrectable_errors = Vec::new();
        for (tag, ok) in errors.iter().zip(&corrected) {
            if *ok {
                corrected_errors.push(*tag);
            } else {
                uncorrectable_errors.push(*tag);
            }
        }
        if !uncorrectable_errors.is_empty() {
            warn!(
                "{}: {} of {} error(s) left uncorrected: {:?}",
                self.code_type,
                uncorrectable_errors.len(),
                errors.len(),
                uncorrectable_errors.iter().map(ToString::to_string).collect::<Vec<_>>()
            );
        }

        let detected = errors.len();
        let fidelity_after = if detected == 0 {
            fidelity_before
        } else {
            (fidelity_before + (1.0 - fidelity_before) * corrected_errors.len() as f64 / detected as f64)
                .clamp(0.0, 1.0)
        };
        let correction_successful = !corrected_errors.is_empty() && fidelity_after >= fidelity_before;
        debug!(
            "{}: applied {} (syndrome {:#b}), fidelity {:.4} -> {:.4}",
            self.code_type,
            correction.display(n),
            layout.syndrome_of(&corrected_set),
            fidelity_before,
            fidelity_after
        );

        Ok(CorrectionResult {
            code_type: self.code_type,
            detected_errors: errors.to_vec(),
            corrected_errors,
            uncorrectable_errors,
            syndrome: layout.syndrome_of(&corrected_set),
            fidelity_before,
            fidelity_after,
            correction_successful,
            bias_applied,
            started_at,
            duration: clock.elapsed(),
        })
    }
}

impl CorrectionCode for StabilizerCode {
    fn code_type(&self) -> CodeType {
        self.code_type
    }

    fn layout(&self) -> &StabilizerLayout {
        &self.layout
    }

    fn code_distance(&self) -> usize {
        self.distance
    }

    fn correctable_errors(&self) -> &[ErrorKind] {
        &self.correctable
    }

    fn encoding_fidelity(&self) -> f64 {
        self.encoding_fidelity
    }

    fn decoding_fidelity(&self) -> f64 {
        self.decoding_fidelity
    }

    fn correct(
        &self,
        state: &mut QuantumState,
        errors: &[ErrorTag],
        _bias: Option<f64>,
        rng: &mut dyn RngCore,
    ) -> QuantumResult<CorrectionResult> {
        self.run(state, errors, None, rng)
    }
}

/// 5-qubit repetition code. With a bias, bit flips beyond the decoder's reach
/// are trusted with that probability and undone exactly.
#[derive(Debug, Clone)]
pub struct AdaptiveCode {
    inner: StabilizerCode,
}

impl AdaptiveCode {
    pub fn new() -> QuantumResult<Self> {
        Ok(Self {
            inner: StabilizerCode {
                code_type: CodeType::Adaptive,
                distance: 5,
                correctable: vec![ErrorKind::BitFlip],
                encoding_fidelity: 0.99,
                decoding_fidelity: 0.99,
                layout: repetition_layout(5, 2)?,
            },
        })
    }
}

impl CorrectionCode for AdaptiveCode {
    fn code_type(&self) -> CodeType {
        self.inner.code_type
    }

    fn layout(&self) -> &StabilizerLayout {
        &self.inner.layout
    }

    fn code_distance(&self) -> usize {
        self.inner.distance
    }

    fn correctable_errors(&self) -> &[ErrorKind] {
        &self.inner.correctable
    }

    fn encoding_fidelity(&self) -> f64 {
        self.inner.encoding_fidelity
    }

    fn decoding_fidelity(&self) -> f64 {
        self.inner.decoding_fidelity
    }

    fn correct(
        &self,
        state: &mut QuantumState,
        errors: &[ErrorTag],
        bias: Option<f64>,
        rng: &mut dyn RngCore,
    ) -> QuantumResult<CorrectionResult> {
        self.inner.run(state, errors, bias, rng)
    }
}

/// Applies the Pauli a tag describes. Depolarizing tags draw X, Y or Z uniformly.
/// Returns the Pauli that was applied.
pub fn inject_error(state: &mut QuantumState, tag: &ErrorTag, rng: &mut dyn RngCore) -> QuantumResult<PauliString> {
    let n = state.num_qubits();
    if tag.qubit >= n {
        return Err(QuantumError::invalid_parameter(format!(
            "Cannot inject {} into a {} qubit state",
            tag, n
        )));
    }
    let pauli = match tag.kind.pauli() {
        Some(pauli) => pauli,
        None => Pauli::ALL[rng.random_range(0..Pauli::ALL.len())],
    };
    let error = PauliString::single(pauli, tag.qubit, n);
    error.apply(state)?;
    Ok(error)
}

/// Whether the decoder maps `error` back into the stabilizer group.
fn recoverable(layout: &StabilizerLayout, error: &PauliString) -> bool {
    match layout.lookup(layout.syndrome_of(error)) {
        Some(correction) => layout.is_logically_trivial(&error.compose(&correction)),
        None => false,
    }
}

/// Lowest-weight assignment of {I, X, Z, Y} to `qubits` reproducing `residual`.
fn resolve_depolarizing(layout: &StabilizerLayout, qubits: &[usize], residual: u64) -> Option<Vec<PauliString>> {
    if qubits.len() > MAX_JOINT_DEPOLARIZING {
        return None;
    }
    let n = layout.n();
    let options = |q: usize| -> [PauliString; 4] {
        [
            PauliString::IDENTITY,
            PauliString::single(Pauli::X, q, n),
            PauliString::single(Pauli::Z, q, n),
            PauliString::single(Pauli::Y, q, n),
        ]
    };
    let mut best: Option<(u32, Vec<PauliString>)> = None;
    for code in 0..4usize.pow(qubits.len() as u32) {
        let choice: Vec<PauliString> = qubits
            .iter()
            .enumerate()
            .map(|(pos, &q)| options(q)[(code >> (2 * pos)) & 3])
            .collect();
        let combined = choice.iter().fold(PauliString::IDENTITY, |acc, p| acc.compose(p));
        if layout.syndrome_of(&combined) != residual {
            continue;
        }
        let weight: u32 = choice.iter().map(PauliString::weight).sum();
        if best.as_ref().is_none_or(|(w, _)| weight < *w) {
            best = Some((weight, choice));
        }
    }
    best.map(|(_, choice)| choice)
}

/// `Z_i Z_{i+1}` checks over `n` qubits.
fn repetition_layout(n: usize, max_weight: usize) -> QuantumResult<StabilizerLayout> {
    let all: Vec<usize> = (0..n).collect();
    (0..n - 1)
        .fold(StabilizerLayout::builder(n), |builder, i| builder.z_check(&[i, i + 1]))
        .logical_x(Pauli::X, &all)
        .logical_z(Pauli::Z, &all)
        .decode_up_to(max_weight)
        .build()
}

fn surface_layout() -> QuantumResult<StabilizerLayout> {
    const SIZE: usize = 5;
    let mut index = [[None; SIZE]; SIZE];
    let mut count = 0;
    for (r, row) in index.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            if (r + c) % 2 == 0 {
                *cell = Some(count);
                count += 1;
            }
        }
    }
    let neighbours = |r: usize, c: usize| -> Vec<usize> {
        let mut qubits = Vec::with_capacity(4);
        if r > 0 {
            qubits.extend(index[r - 1][c]);
        }
        if r + 1 < SIZE {
            qubits.extend(index[r + 1][c]);
        }
        if c > 0 {
            qubits.extend(index[r][c - 1]);
        }
        if c + 1 < SIZE {
            qubits.extend(index[r][c + 1]);
        }
        qubits
    };

    let mut builder = StabilizerLayout::builder(count);
    for r in (0..SIZE).step_by(2) {
        for c in (1..SIZE).step_by(2) {
            builder = builder.x_check(&neighbours(r, c));
        }
    }
    for r in (1..SIZE).step_by(2) {
        for c in (0..SIZE).step_by(2) {
            builder = builder.z_check(&neighbours(r, c));
        }
    }
    let top_row: Vec<usize> = index[0].iter().flatten().copied().collect();
    let left_column: Vec<usize> = index.iter().filter_map(|row| row[0]).collect();
    builder
        .logical_z(Pauli::Z, &top_row)
        .logical_x(Pauli::X, &left_column)
        .decode_up_to(2)
        .build()
}
