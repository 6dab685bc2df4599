// src/correction/mod.rs

//! Stabilizer error correction.
//!
//! Each code is a [`CorrectionCode`] built from a [`StabilizerLayout`]: its
//! generators and logical operators determine the codewords, the syndromes and
//! the lookup decoder. The [`ErrorCorrectionEngine`] owns one instance per
//! configured code and dispatches by [`CodeType`].

pub mod codes;
pub mod pauli;
mod result;
pub mod stabilizer;

pub use codes::{inject_error, AdaptiveCode, CodeType, CorrectionCode, ErrorKind, ErrorTag, StabilizerCode};
pub use pauli::{Pauli, PauliString};
pub use result::CorrectionResult;
pub use stabilizer::{StabilizerLayout, StabilizerLayoutBuilder};

use crate::config::CorrectionConfig;
use crate::core::sampling::seeded_rng;
use crate::core::{QuantumError, QuantumResult, QuantumState};
use crate::validation::sanitize_bias;
use parking_lot::Mutex;
use rand::RngCore;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Running totals over all correction runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrectionStats {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub corrected_errors: u64,
    pub uncorrectable_errors: u64,
    pub runs_by_code: BTreeMap<CodeType, u64>,
}

impl CorrectionStats {
    /// `successful_runs / total_runs`, 0 before the first run.
    pub fn success_rate(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            self.successful_runs as f64 / self.total_runs as f64
        }
    }
}

/// Registry of the enabled codes.
pub struct ErrorCorrectionEngine {
    config: CorrectionConfig,
    codes: HashMap<CodeType, Box<dyn CorrectionCode>>,
    rng: Mutex<StdRng>,
    stats: Mutex<CorrectionStats>,
}

impl std::fmt::Debug for ErrorCorrectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorCorrectionEngine")
            .field("codes", &self.available_codes())
            .field("stats", &*self.stats.lock())
            .finish()
    }
}

impl ErrorCorrectionEngine {
    /// Builds every code listed in `config`.
    pub fn new(config: CorrectionConfig) -> QuantumResult<Self> {
        config.validate()?;
        let mut codes = HashMap::new();
        for code_type in &config.codes {
            if !codes.contains_key(code_type) {
                codes.insert(*code_type, code_type.build()?);
            }
        }
        info!("Error correction engine ready with {} code(s)", codes.len());
        let rng = seeded_rng(config.seed);
        Ok(Self { config, codes, rng: Mutex::new(rng), stats: Mutex::new(CorrectionStats::default()) })
    }

    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    /// Enabled codes, in `CodeType` order.
    pub fn available_codes(&self) -> Vec<CodeType> {
        CodeType::ALL.into_iter().filter(|c| self.codes.contains_key(c)).collect()
    }

    /// # Errors
    /// `UnsupportedCode` if the code is not enabled.
    pub fn code(&self, code_type: CodeType) -> QuantumResult<&dyn CorrectionCode> {
        self.codes
            .get(&code_type)
            .map(|code| code.as_ref())
            .ok_or_else(|| QuantumError::UnsupportedCode { name: code_type.to_string() })
    }

    /// Looks a code up by name.
    pub fn code_by_name(&self, name: &str) -> QuantumResult<&dyn CorrectionCode> {
        self.code(name.parse()?)
    }

    /// Encodes a one-qubit logical state.
    pub fn encode(&self, code_type: CodeType, logical: &QuantumState) -> QuantumResult<QuantumState> {
        let mut state = logical.clone();
        self.code(code_type)?.encode(&mut state)?;
        Ok(state)
    }

    /// Decodes an encoded block back to one qubit.
    pub fn decode(&self, code_type: CodeType, physical: &QuantumState) -> QuantumResult<QuantumState> {
        let mut state = physical.clone();
        self.code(code_type)?.decode(&mut state)?;
        Ok(state)
    }

    /// Corrects `state` in place using the engine's generator.
    pub fn correct_errors(
        &self,
        state: &mut QuantumState,
        errors: &[ErrorTag],
        code_type: CodeType,
        bias: Option<f64>,
    ) -> QuantumResult<CorrectionResult> {
        let mut rng = self.rng.lock();
        self.correct_errors_with_rng(state, errors, code_type, bias, &mut *rng)
    }

    /// Corrects `state` in place drawing any randomness from `rng`.
    ///
    /// # Errors
    /// * `UnsupportedCode` if the code is not enabled.
    /// * `InvalidState` if the state does not match the code's register or is not normalized.
    /// * `InvalidParameter` if the bias is NaN.
    pub fn correct_errors_with_rng(
        &self,
        state: &mut QuantumState,
        errors: &[ErrorTag],
        code_type: CodeType,
        bias: Option<f64>,
        rng: &mut dyn RngCore,
    ) -> QuantumResult<CorrectionResult> {
        let bias = sanitize_bias(bias)?;
        let result = self.code(code_type)?.correct(state, errors, bias, rng)?;

        let mut stats = self.stats.lock();
        stats.total_runs += 1;
        if result.correction_successful {
            stats.successful_runs += 1;
        }
        stats.corrected_errors += result.corrected_errors.len() as u64;
        stats.uncorrectable_errors += result.uncorrectable_errors.len() as u64;
        *stats.runs_by_code.entry(code_type).or_insert(0) += 1;
        Ok(result)
    }

    /// Applies the error a tag describes using the engine's generator.
    pub fn inject_error(&self, state: &mut QuantumState, tag: &ErrorTag) -> QuantumResult<PauliString> {
        let mut rng = self.rng.lock();
        inject_error(state, tag, &mut *rng)
    }

    pub fn stats(&self) -> CorrectionStats {
        self.stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorrectionConfig;

    #[test]
    fn test_only_configured_codes_are_available() -> QuantumResult<()> {
        let config = CorrectionConfig { codes: vec![CodeType::Steane7, CodeType::Repetition], seed: Some(1) };
        let engine = ErrorCorrectionEngine::new(config)?;
        assert_eq!(engine.available_codes(), vec![CodeType::Repetition, CodeType::Steane7]);
        assert!(matches!(engine.code(CodeType::Surface), Err(QuantumError::UnsupportedCode { .. })));
        assert!(matches!(engine.code_by_name("hamming"), Err(QuantumError::UnsupportedCode { .. })));
        assert_eq!(engine.code_by_name("steane")?.code_type(), CodeType::Steane7);
        Ok(())
    }

    #[test]
    fn test_stats_accumulate() -> QuantumResult<()> {
        let engine = ErrorCorrectionEngine::new(CorrectionConfig::default().with_seed(4))?;
        let logical = QuantumState::basis_state(1, 1)?;
        let mut state = engine.encode(CodeType::Repetition, &logical)?;
        engine.inject_error(&mut state, &ErrorTag::bit_flip(2))?;
        engine.correct_errors(&mut state, &[ErrorTag::bit_flip(2)], CodeType::Repetition, None)?;
        engine.correct_errors(&mut state, &[ErrorTag::phase_flip(0)], CodeType::Repetition, None)?;

        let stats = engine.stats();
        assert_eq!(stats.total_runs, 2);
        assert_eq!(stats.successful_runs, 1);
        assert_eq!(stats.corrected_errors, 1);
        assert_eq!(stats.uncorrectable_errors, 1);
        assert_eq!(stats.runs_by_code.get(&CodeType::Repetition), Some(&2));
        assert!((stats.success_rate() - 0.5).abs() < 1e-12);
        Ok(())
    }
}
