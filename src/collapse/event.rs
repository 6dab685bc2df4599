// src/collapse/event.rs

use super::mechanism::{CollapseMechanism, CollapseTrigger, MeasurementBasis};
use crate::core::QuantumState;
use serde::Serialize;
use std::time::SystemTime;
use uuid::Uuid;

/// Record of one collapse, carrying the state before and after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollapseEvent {
    pub event_id: Uuid,
    pub timestamp: SystemTime,
    pub trigger: CollapseTrigger,
    pub observer_id: Option<String>,
    pub requested_mechanism: CollapseMechanism,
    pub applied_mechanism: CollapseMechanism,
    /// Set when the requested mechanism could not run as asked and
    /// a projective measurement was performed instead.
    pub fallback_applied: bool,
    pub measurement_basis: MeasurementBasis,
    pub measurement_strength: f64,
    /// Coherence of the input as seen in the measurement basis.
    pub coherence_before: f64,
    /// Coherence of the result in the measurement basis. Equals
    /// `state_after.coherence()` only for computational-basis measurements.
    pub coherence_after: f64,
    pub probabilities_before: Vec<f64>,
    pub probabilities_after: Vec<f64>,
    pub state_before: QuantumState,
    pub state_after: QuantumState,
    /// `clamp(before − after, 0, 1)`
    pub coherence_loss: f64,
    /// Drop in Shannon entropy of the outcome distribution, in bits.
    pub information_loss: f64,
    /// Probability mass of the selected outcome; 1.0 when nothing was selected.
    pub collapse_probability: f64,
    /// Label of the selected outcome in the measurement basis.
    pub measurement_result: Option<String>,
    pub outcome_index: Option<usize>,
    pub zeno_effect: bool,
    pub success: bool,
}
