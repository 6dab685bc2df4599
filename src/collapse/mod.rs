// src/collapse/mod.rs

//! Measurement and collapse of quantum states.
//!
//! The handler never touches the caller's state. It works on a clone, rotated
//! into the requested measurement basis, and returns a [`CollapseEvent`] holding
//! both snapshots.

mod event;
pub mod mechanism;

pub use event::CollapseEvent;
pub use mechanism::{
    CollapseContext, CollapseMechanism, CollapseStrategy, CollapseTrigger, MeasurementBasis, StrategyOutcome,
};

use crate::config::CollapseConfig;
use crate::core::sampling::seeded_rng;
use crate::core::{shannon_entropy, QuantumResult, QuantumState, FRAC_1_SQRT_2};
use crate::validation::{check_unit_interval, sanitize_bias, validate_state};
use num_complex::Complex64;
use parking_lot::Mutex;
use rand::RngCore;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::SystemTime;
use tracing::debug;
use uuid::Uuid;

/// Parameters of one collapse.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapseRequest {
    pub trigger: CollapseTrigger,
    pub mechanism: CollapseMechanism,
    pub basis: MeasurementBasis,
    /// In `[0, 1]`, defaults to 1.0.
    pub strength: f64,
    pub observer_id: Option<String>,
    /// Used by the biased mechanism only.
    pub bias: Option<f64>,
    pub favored_outcome: Option<usize>,
}

impl CollapseRequest {
    pub fn new(trigger: CollapseTrigger, mechanism: CollapseMechanism) -> Self {
        Self {
            trigger,
            mechanism,
            basis: MeasurementBasis::Computational,
            strength: 1.0,
            observer_id: None,
            bias: None,
            favored_outcome: None,
        }
    }

    pub fn with_basis(mut self, basis: MeasurementBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_observer(mut self, observer_id: impl Into<String>) -> Self {
        self.observer_id = Some(observer_id.into());
        self
    }

    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = Some(bias);
        self
    }

    pub fn with_favored_outcome(mut self, index: usize) -> Self {
        self.favored_outcome = Some(index);
        self
    }
}

impl Default for CollapseRequest {
    fn default() -> Self {
        Self::new(CollapseTrigger::Measurement, CollapseMechanism::VonNeumann)
    }
}

/// Running counts kept by the handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollapseStats {
    pub total_events: u64,
    pub fallbacks: u64,
    pub zeno_events: u64,
    /// Keyed by the mechanism that actually ran.
    pub by_mechanism: BTreeMap<CollapseMechanism, u64>,
}

/// Runs collapse strategies against caller-owned states.
#[derive(Debug)]
pub struct StateCollapseHandler {
    config: CollapseConfig,
    rng: Mutex<StdRng>,
    stats: Mutex<CollapseStats>,
}

impl StateCollapseHandler {
    pub fn new(config: CollapseConfig) -> QuantumResult<Self> {
        config.validate()?;
        let rng = seeded_rng(config.seed);
        Ok(Self { config, rng: Mutex::new(rng), stats: Mutex::new(CollapseStats::default()) })
    }

    pub fn config(&self) -> &CollapseConfig {
        &self.config
    }

    /// Collapses a copy of `state` using the handler's generator.
    pub fn trigger_collapse(&self, state: &QuantumState, request: &CollapseRequest) -> QuantumResult<CollapseEvent> {
        let mut rng = self.rng.lock();
        self.trigger_collapse_with_rng(state, request, &mut *rng)
    }

    /// Collapses a copy of `state` drawing randomness from `rng`.
    ///
    /// # Errors
    /// * `InvalidState` if the state is not normalized within the configured tolerance.
    /// * `InvalidParameter` if the strength is outside `[0, 1]`, the bias is NaN, or the
    ///   favored outcome is out of range.
    pub fn trigger_collapse_with_rng(
        &self,
        state: &QuantumState,
        request: &CollapseRequest,
        rng: &mut dyn RngCore,
    ) -> QuantumResult<CollapseEvent> {
        validate_state(state, Some(self.config.norm_tolerance))?;
        check_unit_interval(request.strength, "measurement_strength")?;
        let bias = sanitize_bias(request.bias)?;

        let mut working = state.clone();
        if request.basis == MeasurementBasis::Hadamard {
            apply_hadamard_all(&mut working)?;
        }
        // Both coherence readings are taken in the measurement frame.
        let coherence_before = working.coherence();

        let mut ctx = CollapseContext {
            strength: request.strength,
            bias,
            favored_outcome: request.favored_outcome,
            weak_disturbance_threshold: self.config.weak_disturbance_threshold,
            environmental_rate: self.config.environmental_rate,
            coherence_before,
            rng,
        };
        let outcome = request.mechanism.strategy().collapse(&mut working, &mut ctx)?;

        if request.basis == MeasurementBasis::Hadamard {
            apply_hadamard_all(&mut working)?;
        }

        let measurement_result = outcome.outcome_index.and_then(|idx| match request.basis {
            MeasurementBasis::Computational => state.label(idx).map(str::to_string),
            MeasurementBasis::Hadamard => Some(hadamard_label(idx, state.num_qubits())),
        });

        let probabilities_before = state.probabilities();
        let probabilities_after = working.probabilities();
        let coherence_after = outcome.coherence_after.clamp(0.0, 1.0);
        let information_loss =
            (shannon_entropy(&probabilities_before) - shannon_entropy(&probabilities_after)).max(0.0);
        let success = (working.norm_sqr() - 1.0).abs() <= self.config.norm_tolerance;

        let event = CollapseEvent {
            event_id: Uuid::new_v4(),
            timestamp: SystemTime::now(),
            trigger: request.trigger,
            observer_id: request.observer_id.clone(),
            requested_mechanism: request.mechanism,
            applied_mechanism: outcome.applied_mechanism,
            fallback_applied: outcome.fallback_applied,
            measurement_basis: request.basis,
            measurement_strength: request.strength,
            coherence_before,
            coherence_after,
            probabilities_before,
            probabilities_after,
            state_before: state.clone(),
            state_after: working,
            coherence_loss: (coherence_before - coherence_after).clamp(0.0, 1.0),
            information_loss,
            collapse_probability: outcome.collapse_probability,
            measurement_result,
            outcome_index: outcome.outcome_index,
            zeno_effect: outcome.zeno_effect,
            success,
        };

        self.record(&event);
        debug!(
            "Collapse {} ({} -> {}): result {:?}, coherence {:.4} -> {:.4}",
            event.event_id,
            event.requested_mechanism,
            event.applied_mechanism,
            event.measurement_result,
            event.coherence_before,
            event.coherence_after
        );
        Ok(event)
    }

    pub fn stats(&self) -> CollapseStats {
        self.stats.lock().clone()
    }

    fn record(&self, event: &CollapseEvent) {
        let mut stats = self.stats.lock();
        stats.total_events += 1;
        if event.fallback_applied {
            stats.fallbacks += 1;
        }
        if event.zeno_effect {
            stats.zeno_events += 1;
        }
        *stats.by_mechanism.entry(event.applied_mechanism).or_insert(0) += 1;
    }
}

fn apply_hadamard_all(state: &mut QuantumState) -> QuantumResult<()> {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let hadamard = [[h, h], [h, -h]];
    for qubit in 0..state.num_qubits() {
        state.apply_single_qubit_gate(qubit, &hadamard)?;
    }
    Ok(())
}

/// `|+->`-style label for basis index `index` over `num_qubits`.
fn hadamard_label(index: usize, num_qubits: usize) -> String {
    let signs: String = (0..num_qubits)
        .map(|q| if (index >> (num_qubits - 1 - q)) & 1 == 0 { '+' } else { '-' })
        .collect();
    format!("|{}>", signs)
}
