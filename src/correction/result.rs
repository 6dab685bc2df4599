// src/correction/result.rs

use super::codes::{CodeType, ErrorTag};
use serde::Serialize;
use std::time::{Duration, SystemTime};

/// Outcome of one correction run.
///
/// `corrected_errors` and `uncorrectable_errors` partition `detected_errors`,
/// each keeping the input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionResult {
    pub code_type: CodeType,
    pub detected_errors: Vec<ErrorTag>,
    pub corrected_errors: Vec<ErrorTag>,
    pub uncorrectable_errors: Vec<ErrorTag>,
    /// Combined syndrome of the corrected error set, bit `k` for generator `k`.
    pub syndrome: u64,
    /// Code-space fidelity of the incoming state.
    pub fidelity_before: f64,
    pub fidelity_after: f64,
    pub correction_successful: bool,
    /// Whether the bias-driven path was taken for decoder-rejected errors.
    pub bias_applied: bool,
    pub started_at: SystemTime,
    pub duration: Duration,
}

impl CorrectionResult {
    pub fn fidelity_improvement(&self) -> f64 {
        self.fidelity_after - self.fidelity_before
    }

    /// Fraction of detected errors that were corrected; 1.0 when nothing was detected.
    pub fn correction_rate(&self) -> f64 {
        if self.detected_errors.is_empty() {
            1.0
        } else {
            self.corrected_errors.len() as f64 / self.detected_errors.len() as f64
        }
    }
}
