// src/entanglement/mod.rs

//! Creation and lifetime tracking of entangled particle pairs.
//!
//! The manager keeps every live pair in one registry behind a
//! `parking_lot::RwLock`. Queries take the read lock and hand out clones;
//! creation, measurement and decay take the write lock briefly. An optional
//! background thread ([`EntanglementManager::start_tracking`]) applies the
//! same decay step as [`EntanglementManager::advance_decay`] on a fixed period.

pub mod pair;
mod preparation;
mod registry;
mod tracker;

pub use pair::{
    concurrence_from_fidelity, entropy_from_concurrence, negativity_from_fidelity, EntangledPair,
    EntanglementType, QualityTier, ReducedState,
};
pub use registry::DecayReport;

use crate::config::EntanglementConfig;
use crate::core::sampling::{sample_index, seeded_rng};
use crate::core::{PairId, ParticleId, QuantumError, QuantumResult};
use crate::validation::sanitize_bias;
use pair::PairSpec;
use parking_lot::{Mutex, RwLock};
use rand::RngCore;
use rand::rngs::StdRng;
use registry::PairRegistry;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracker::DecayTracker;
use tracing::{debug, info, warn};

/// Result of sampling a pair's joint state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairMeasurement {
    pub pair_id: PairId,
    /// Basis index of the joint outcome.
    pub outcome_index: usize,
    /// Basis label of the joint outcome, e.g. `|11>`.
    pub outcome: String,
    /// Born probability of the outcome before sampling.
    pub probability: f64,
    /// Bit read on particle A (qubit 0).
    pub outcome_a: u8,
    /// Bit read on particle B (qubit 1).
    pub outcome_b: u8,
    /// Pair fidelity at the time of measurement; decay restarts from here.
    pub fidelity: f64,
    pub measurement_count: u64,
}

/// Count of active pairs per fidelity band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualityDistribution {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub poor: usize,
}

impl QualityDistribution {
    fn record(&mut self, tier: QualityTier) {
        match tier {
            QualityTier::Excellent => self.excellent += 1,
            QualityTier::Good => self.good += 1,
            QualityTier::Fair => self.fair += 1,
            QualityTier::Poor => self.poor += 1,
        }
    }
}

/// Snapshot of the manager for status reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntanglementStatus {
    pub active_pairs: usize,
    pub total_created: u64,
    pub total_attempts: u64,
    pub total_evicted: u64,
    /// `total_created / total_attempts`, 0 before the first attempt.
    pub success_rate: f64,
    /// Mean fidelity of the active pairs, 0 when there are none.
    pub average_fidelity: f64,
    pub quality_distribution: QualityDistribution,
}

/// Owns the pair registry and the decay thread.
#[derive(Debug)]
pub struct EntanglementManager {
    config: EntanglementConfig,
    registry: Arc<RwLock<PairRegistry>>,
    tracker: Mutex<Option<DecayTracker>>,
    rng: Mutex<StdRng>,
}

impl EntanglementManager {
    /// Validates `config` and builds an idle manager. Tracking is not started.
    pub fn new(config: EntanglementConfig) -> QuantumResult<Self> {
        config.validate()?;
        let rng = seeded_rng(config.seed);
        Ok(Self {
            config,
            registry: Arc::new(RwLock::new(PairRegistry::new())),
            tracker: Mutex::new(None),
            rng: Mutex::new(rng),
        })
    }

    pub fn config(&self) -> &EntanglementConfig {
        &self.config
    }

    /// Creates and registers a pair.
    ///
    /// Missing particle ids are generated. `bias` only shapes `BiasedCustom`
    /// states but is recorded on every pair; it is clamped into `[0, 1]`.
    ///
    /// # Errors
    /// * `DuplicateEntanglement` if either particle already belongs to a pair.
    /// * `InvalidParameter` if both ids are equal, the bias is NaN, or the
    ///   prepared state would start below the eviction threshold.
    pub fn create_entangled_pair(
        &self,
        entanglement_type: EntanglementType,
        particle_a: Option<ParticleId>,
        particle_b: Option<ParticleId>,
        bias: Option<f64>,
    ) -> QuantumResult<EntangledPair> {
        let bias = sanitize_bias(bias)?;
        let particle_a_id = particle_a.unwrap_or_else(ParticleId::generate);
        let particle_b_id = particle_b.unwrap_or_else(ParticleId::generate);

        let mut registry = self.registry.write();
        registry.total_attempts += 1;

        if particle_a_id == particle_b_id {
            return Err(QuantumError::invalid_parameter(format!(
                "A particle cannot be entangled with itself ('{}')",
                particle_a_id
            )));
        }
        for particle in [&particle_a_id, &particle_b_id] {
            if let Some(pair_id) = registry.owner_of(particle) {
                warn!("Rejected {} pair: particle '{}' already in {}", entanglement_type, particle, pair_id);
                return Err(QuantumError::DuplicateEntanglement {
                    particle_id: particle.to_string(),
                    pair_id,
                });
            }
        }

        let prepared = preparation::prepare(entanglement_type, bias, self.config.biased_preparation_fidelity)?;
        if prepared.fidelity < self.config.eviction_threshold {
            warn!(
                "Rejected {} pair: initial fidelity {:.4} below eviction threshold {:.4}",
                entanglement_type, prepared.fidelity, self.config.eviction_threshold
            );
            return Err(QuantumError::invalid_parameter(format!(
                "{} pair would start at fidelity {:.4}, below the eviction threshold {:.4}",
                entanglement_type, prepared.fidelity, self.config.eviction_threshold
            )));
        }
        let pair = EntangledPair::new(PairSpec {
            pair_id: PairId::new(),
            particle_a_id,
            particle_b_id,
            entanglement_type,
            joint_state: prepared.joint_state,
            initial_fidelity: prepared.fidelity,
            coherence_time: self.config.coherence_time_secs,
            decoherence_rate: self.config.decoherence_rate,
            bias_factor: bias,
        });
        debug!("Created {}", pair);
        registry.insert(pair.clone());
        Ok(pair)
    }

    /// Clone of the pair, if it is still registered.
    pub fn get_pair(&self, pair_id: &PairId) -> Option<EntangledPair> {
        self.registry.read().get(pair_id).cloned()
    }

    /// Clone of the pair holding `particle_id` on either side.
    pub fn get_pair_by_particle(&self, particle_id: &str) -> Option<EntangledPair> {
        self.registry.read().get_by_particle(&ParticleId::from(particle_id)).cloned()
    }

    /// Samples the joint state with the manager's generator.
    pub fn measure_pair(&self, pair_id: &PairId) -> QuantumResult<PairMeasurement> {
        let mut rng = self.rng.lock();
        self.measure_pair_with_rng(pair_id, &mut *rng)
    }

    /// Samples one joint outcome without disturbing the stored state, bumps the
    /// measurement count and restarts the decay clock.
    pub fn measure_pair_with_rng(&self, pair_id: &PairId, rng: &mut dyn RngCore) -> QuantumResult<PairMeasurement> {
        let mut registry = self.registry.write();
        let pair = registry
            .get_mut(pair_id)
            .ok_or(QuantumError::PairNotFound { pair_id: *pair_id })?;

        let probabilities = pair.joint_state.probabilities();
        let outcome_index = sample_index(&probabilities, rng)
            .ok_or_else(|| QuantumError::invalid_state("Pair state has no measurable outcome"))?;
        let n = pair.joint_state.num_qubits();
        let outcome = pair
            .joint_state
            .label(outcome_index)
            .map(str::to_string)
            .unwrap_or_default();

        pair.record_measurement();
        debug!("Measured {} -> {}", pair_id, outcome);

        Ok(PairMeasurement {
            pair_id: *pair_id,
            outcome_index,
            outcome,
            probability: probabilities[outcome_index],
            outcome_a: ((outcome_index >> (n - 1)) & 1) as u8,
            outcome_b: ((outcome_index >> (n - 2)) & 1) as u8,
            fidelity: pair.fidelity(),
            measurement_count: pair.measurement_count,
        })
    }

    /// Removes the pair and both particle mappings.
    pub fn remove_pair(&self, pair_id: &PairId) -> Option<EntangledPair> {
        let removed = self.registry.write().remove(pair_id);
        if removed.is_some() {
            debug!("Removed {}", pair_id);
        }
        removed
    }

    /// Clones of all active pairs, in no particular order.
    pub fn active_pairs(&self) -> Vec<EntangledPair> {
        self.registry.read().pairs().cloned().collect()
    }

    pub fn pair_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Applies one decay step of `dt` to every pair and evicts the expired ones.
    pub fn advance_decay(&self, dt: Duration) -> DecayReport {
        self.registry
            .write()
            .apply_decay(dt.as_secs_f64(), self.config.eviction_threshold)
    }

    /// Changes a pair's decay constant from now on.
    pub fn set_decoherence_rate(&self, pair_id: &PairId, rate: f64) -> QuantumResult<()> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(QuantumError::invalid_parameter(format!(
                "decoherence rate must be a non-negative number, got {}",
                rate
            )));
        }
        let mut registry = self.registry.write();
        let pair = registry
            .get_mut(pair_id)
            .ok_or(QuantumError::PairNotFound { pair_id: *pair_id })?;
        pair.set_decoherence_rate(rate);
        Ok(())
    }

    /// Starts the background decay thread. Returns `false` if it is already running.
    pub fn start_tracking(&self) -> QuantumResult<bool> {
        let mut slot = self.tracker.lock();
        if slot.as_ref().is_some_and(DecayTracker::is_running) {
            return Ok(false);
        }
        let tracker = DecayTracker::spawn(
            Arc::clone(&self.registry),
            self.config.tracking_interval(),
            self.config.eviction_threshold,
        )?;
        *slot = Some(tracker);
        info!("Entanglement tracking enabled");
        Ok(true)
    }

    /// Stops and joins the decay thread. Returns `false` if it was not running.
    pub fn stop_tracking(&self) -> QuantumResult<bool> {
        let tracker = self.tracker.lock().take();
        match tracker {
            Some(mut tracker) => {
                tracker.stop()?;
                info!("Entanglement tracking disabled");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker.lock().as_ref().is_some_and(DecayTracker::is_running)
    }

    pub fn status(&self) -> EntanglementStatus {
        let registry = self.registry.read();
        let mut quality_distribution = QualityDistribution::default();
        let mut fidelity_sum = 0.0;
        for pair in registry.pairs() {
            quality_distribution.record(pair.quality());
            fidelity_sum += pair.fidelity();
        }
        let active_pairs = registry.len();
        EntanglementStatus {
            active_pairs,
            total_created: registry.total_created,
            total_attempts: registry.total_attempts,
            total_evicted: registry.total_evicted,
            success_rate: if registry.total_attempts == 0 {
                0.0
            } else {
                registry.total_created as f64 / registry.total_attempts as f64
            },
            average_fidelity: if active_pairs == 0 { 0.0 } else { fidelity_sum / active_pairs as f64 },
            quality_distribution,
        }
    }
}
