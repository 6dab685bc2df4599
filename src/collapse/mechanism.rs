// src/collapse/mechanism.rs

//! Collapse mechanisms and the strategy each one runs.
//!
//! Strategies act on a working copy already rotated into the measurement basis.
//! They mutate it in place and report what they did; the handler takes care of
//! basis changes, snapshots and bookkeeping.

use crate::core::sampling::{argmax, sample_index};
use crate::core::{QuantumError, QuantumResult, QuantumState};
use num_complex::Complex64;
use num_traits::Zero;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// How a measurement disturbs the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapseMechanism {
    /// Projective measurement onto one basis state.
    VonNeumann,
    /// Partial projection: off-target amplitudes are damped by the strength.
    Continuous,
    /// Phase disturbance only, projective above the disturbance threshold.
    WeakMeasurement,
    /// Repeated-observation freezing toward the most probable outcome.
    QuantumZeno,
    /// Partial projection plus random phase noise.
    Environmental,
    /// Projective measurement over a distribution tilted toward a favored outcome.
    Biased,
}

impl CollapseMechanism {
    pub const ALL: [CollapseMechanism; 6] = [
        CollapseMechanism::VonNeumann,
        CollapseMechanism::Continuous,
        CollapseMechanism::WeakMeasurement,
        CollapseMechanism::QuantumZeno,
        CollapseMechanism::Environmental,
        CollapseMechanism::Biased,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CollapseMechanism::VonNeumann => "von_neumann",
            CollapseMechanism::Continuous => "continuous",
            CollapseMechanism::WeakMeasurement => "weak_measurement",
            CollapseMechanism::QuantumZeno => "quantum_zeno",
            CollapseMechanism::Environmental => "environmental",
            CollapseMechanism::Biased => "biased",
        }
    }

    /// The strategy implementing this mechanism.
    pub fn strategy(&self) -> &'static dyn CollapseStrategy {
        match self {
            CollapseMechanism::VonNeumann => &VonNeumannCollapse,
            CollapseMechanism::Continuous => &ContinuousCollapse,
            CollapseMechanism::WeakMeasurement => &WeakMeasurementCollapse,
            CollapseMechanism::QuantumZeno => &ZenoCollapse,
            CollapseMechanism::Environmental => &EnvironmentalCollapse,
            CollapseMechanism::Biased => &BiasedCollapse,
        }
    }
}

impl fmt::Display for CollapseMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CollapseMechanism {
    type Err = QuantumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "von_neumann" | "vonneumann" | "projective" => Ok(CollapseMechanism::VonNeumann),
            "continuous" => Ok(CollapseMechanism::Continuous),
            "weak_measurement" | "weak" => Ok(CollapseMechanism::WeakMeasurement),
            "quantum_zeno" | "zeno" => Ok(CollapseMechanism::QuantumZeno),
            "environmental" | "environment" => Ok(CollapseMechanism::Environmental),
            "biased" => Ok(CollapseMechanism::Biased),
            _ => Err(QuantumError::UnsupportedMechanism { name: s.to_string() }),
        }
    }
}

/// What caused the collapse. Recorded on the event, does not change the dynamics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapseTrigger {
    /// Explicit measurement by the caller.
    #[default]
    Measurement,
    /// Passive observation by a named observer.
    Observation,
    /// Interaction with another system.
    Interaction,
    /// Decoherence from the surroundings.
    Environment,
}

/// Basis the measurement is performed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementBasis {
    #[default]
    Computational,
    /// `|+>`/`|->` on every qubit.
    Hadamard,
}

/// Per-call inputs handed to a strategy.
pub struct CollapseContext<'a> {
    /// Measurement strength in `[0, 1]`.
    pub strength: f64,
    /// Sanitized bias in `[0, 1]`.
    pub bias: Option<f64>,
    /// Outcome the bias favors; the most probable outcome when `None`.
    pub favored_outcome: Option<usize>,
    pub weak_disturbance_threshold: f64,
    pub environmental_rate: f64,
    /// Coherence of the incoming state.
    pub coherence_before: f64,
    pub rng: &'a mut dyn RngCore,
}

/// What a strategy did to the working state.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome {
    pub applied_mechanism: CollapseMechanism,
    /// Selected basis index, `None` for disturbances that select nothing.
    pub outcome_index: Option<usize>,
    /// Mass of the selected outcome in the distribution that was sampled.
    pub collapse_probability: f64,
    pub coherence_after: f64,
    pub zeno_effect: bool,
    pub fallback_applied: bool,
}

/// One collapse dynamics.
pub trait CollapseStrategy: Send + Sync {
    fn mechanism(&self) -> CollapseMechanism;

    /// Collapses `state` in place. The state is normalized on return.
    fn collapse(&self, state: &mut QuantumState, ctx: &mut CollapseContext<'_>) -> QuantumResult<StrategyOutcome>;
}

pub struct VonNeumannCollapse;
pub struct ContinuousCollapse;
pub struct WeakMeasurementCollapse;
pub struct ZenoCollapse;
pub struct EnvironmentalCollapse;
pub struct BiasedCollapse;

impl CollapseStrategy for VonNeumannCollapse {
    fn mechanism(&self) -> CollapseMechanism {
        CollapseMechanism::VonNeumann
    }

    fn collapse(&self, state: &mut QuantumState, ctx: &mut CollapseContext<'_>) -> QuantumResult<StrategyOutcome> {
        let probabilities = state.probabilities();
        project(state, &probabilities, ctx.rng, CollapseMechanism::VonNeumann)
    }
}

impl CollapseStrategy for ContinuousCollapse {
    fn mechanism(&self) -> CollapseMechanism {
        CollapseMechanism::Continuous
    }

    fn collapse(&self, state: &mut QuantumState, ctx: &mut CollapseContext<'_>) -> QuantumResult<StrategyOutcome> {
        let probabilities = state.probabilities();
        let target = sample_index(&probabilities, ctx.rng).ok_or_else(no_outcome)?;
        damp_toward(state, target, ctx.strength)?;
        Ok(StrategyOutcome {
            applied_mechanism: CollapseMechanism::Continuous,
            outcome_index: Some(target),
            collapse_probability: probabilities[target],
            coherence_after: ctx.coherence_before * (1.0 - ctx.strength),
            zeno_effect: false,
            fallback_applied: false,
        })
    }
}

impl CollapseStrategy for WeakMeasurementCollapse {
    fn mechanism(&self) -> CollapseMechanism {
        CollapseMechanism::WeakMeasurement
    }

    fn collapse(&self, state: &mut QuantumState, ctx: &mut CollapseContext<'_>) -> QuantumResult<StrategyOutcome> {
        let s = ctx.strength;
        if s > ctx.weak_disturbance_threshold {
            return VonNeumannCollapse.collapse(state, ctx);
        }
        jitter_phases(state, s, ctx.rng)?;
        Ok(StrategyOutcome {
            applied_mechanism: CollapseMechanism::WeakMeasurement,
            outcome_index: None,
            collapse_probability: 1.0,
            coherence_after: ctx.coherence_before * (1.0 - s / 2.0),
            zeno_effect: false,
            fallback_applied: false,
        })
    }
}

impl CollapseStrategy for ZenoCollapse {
    fn mechanism(&self) -> CollapseMechanism {
        CollapseMechanism::QuantumZeno
    }

    fn collapse(&self, state: &mut QuantumState, ctx: &mut CollapseContext<'_>) -> QuantumResult<StrategyOutcome> {
        let s = ctx.strength;
        let probabilities = state.probabilities();
        let target = argmax(&probabilities).ok_or_else(no_outcome)?;
        // Frequent observation suppresses evolution, so the pull peaks at moderate strength.
        let effective = s * (1.0 - s).powi(2);
        damp_toward(state, target, effective)?;
        Ok(StrategyOutcome {
            applied_mechanism: CollapseMechanism::QuantumZeno,
            outcome_index: Some(target),
            collapse_probability: probabilities[target],
            coherence_after: ctx.coherence_before * (1.0 - effective),
            zeno_effect: true,
            fallback_applied: false,
        })
    }
}

impl CollapseStrategy for EnvironmentalCollapse {
    fn mechanism(&self) -> CollapseMechanism {
        CollapseMechanism::Environmental
    }

    fn collapse(&self, state: &mut QuantumState, ctx: &mut CollapseContext<'_>) -> QuantumResult<StrategyOutcome> {
        let s = ctx.strength;
        let rate = ctx.environmental_rate * s;
        let probabilities = state.probabilities();
        let target = sample_index(&probabilities, ctx.rng).ok_or_else(no_outcome)?;
        damp_toward(state, target, s)?;
        jitter_phases(state, PI * rate, ctx.rng)?;
        Ok(StrategyOutcome {
            applied_mechanism: CollapseMechanism::Environmental,
            outcome_index: Some(target),
            collapse_probability: probabilities[target],
            coherence_after: ctx.coherence_before * (1.0 - s) * (1.0 - rate),
            zeno_effect: false,
            fallback_applied: false,
        })
    }
}

impl CollapseStrategy for BiasedCollapse {
    fn mechanism(&self) -> CollapseMechanism {
        CollapseMechanism::Biased
    }

    fn collapse(&self, state: &mut QuantumState, ctx: &mut CollapseContext<'_>) -> QuantumResult<StrategyOutcome> {
        let Some(bias) = ctx.bias else {
            let mut outcome = VonNeumannCollapse.collapse(state, ctx)?;
            outcome.fallback_applied = true;
            return Ok(outcome);
        };

        let probabilities = state.probabilities();
        let dim = probabilities.len();
        let favored = match ctx.favored_outcome {
            Some(idx) if idx >= dim => {
                return Err(QuantumError::invalid_parameter(format!(
                    "Favored outcome {} out of range for dimension {}",
                    idx, dim
                )));
            }
            Some(idx) => idx,
            None => argmax(&probabilities).ok_or_else(no_outcome)?,
        };

        let uniform = (1.0 - bias) / dim as f64;
        let mut weights: Vec<f64> = probabilities
            .iter()
            .enumerate()
            .map(|(i, p)| p * (uniform + if i == favored { bias } else { 0.0 }))
            .collect();
        let total: f64 = weights.iter().sum();
        if total < 1e-12 {
            // Favored outcome has no support and bias is 1: nothing left to tilt.
            weights = probabilities;
        } else {
            weights.iter_mut().for_each(|w| *w /= total);
        }
        project(state, &weights, ctx.rng, CollapseMechanism::Biased)
    }
}

/// Projects onto an index drawn from `weights`, keeping the winning amplitude's phase.
fn project(
    state: &mut QuantumState,
    weights: &[f64],
    rng: &mut dyn RngCore,
    applied_mechanism: CollapseMechanism,
) -> QuantumResult<StrategyOutcome> {
    let outcome = sample_index(weights, rng).ok_or_else(no_outcome)?;
    let total: f64 = weights.iter().sum();
    state.map_amplitudes(|amps| {
        let winner = amps[outcome];
        let phase = if winner.norm() > 0.0 { winner / winner.norm() } else { Complex64::new(1.0, 0.0) };
        amps.iter_mut().for_each(|a| *a = Complex64::zero());
        amps[outcome] = phase;
    })?;
    Ok(StrategyOutcome {
        applied_mechanism,
        outcome_index: Some(outcome),
        collapse_probability: weights[outcome] / total,
        coherence_after: state.coherence(),
        zeno_effect: false,
        fallback_applied: false,
    })
}

/// Scales every amplitude except `target` by `1 − factor`, then renormalizes.
fn damp_toward(state: &mut QuantumState, target: usize, factor: f64) -> QuantumResult<()> {
    let keep = (1.0 - factor).clamp(0.0, 1.0);
    state.map_amplitudes(|amps| {
        for (i, amp) in amps.iter_mut().enumerate() {
            if i != target {
                *amp *= keep;
            }
        }
    })
}

/// Rotates each amplitude by an independent angle drawn from `[−max_angle, max_angle]`.
fn jitter_phases(state: &mut QuantumState, max_angle: f64, rng: &mut dyn RngCore) -> QuantumResult<()> {
    if max_angle <= 0.0 {
        return Ok(());
    }
    state.map_amplitudes(|amps| {
        for amp in amps.iter_mut() {
            let theta = (rng.random::<f64>() * 2.0 - 1.0) * max_angle;
            *amp *= Complex64::from_polar(1.0, theta);
        }
    })
}

fn no_outcome() -> QuantumError {
    QuantumError::invalid_state("State has no outcome with non-zero probability")
}
