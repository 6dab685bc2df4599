// src/entanglement/registry.rs

//! Pair registry shared between the manager and the decay task.

use super::pair::EntangledPair;
use crate::core::{PairId, ParticleId};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Outcome of one decay step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecayReport {
    /// Pairs whose fidelity was updated and kept.
    pub updated: usize,
    /// Pairs removed because they fell below the threshold or outlived their coherence time.
    pub evicted: Vec<PairId>,
}

/// Registry of active pairs plus the two particle → pair indexes.
/// Always accessed through the manager's single `RwLock`.
#[derive(Debug, Default)]
pub(crate) struct PairRegistry {
    pairs: HashMap<PairId, EntangledPair>,
    by_particle_a: HashMap<ParticleId, PairId>,
    by_particle_b: HashMap<ParticleId, PairId>,
    pub total_attempts: u64,
    pub total_created: u64,
    pub total_evicted: u64,
}

impl PairRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair currently holding `particle`, on either side.
    pub fn owner_of(&self, particle: &ParticleId) -> Option<PairId> {
        self.by_particle_a
            .get(particle)
            .or_else(|| self.by_particle_b.get(particle))
            .copied()
    }

    pub fn insert(&mut self, pair: EntangledPair) {
        self.by_particle_a.insert(pair.particle_a_id.clone(), pair.pair_id);
        self.by_particle_b.insert(pair.particle_b_id.clone(), pair.pair_id);
        self.pairs.insert(pair.pair_id, pair);
        self.total_created += 1;
    }

    /// Removes a pair together with both index entries.
    pub fn remove(&mut self, pair_id: &PairId) -> Option<EntangledPair> {
        let pair = self.pairs.remove(pair_id)?;
        self.by_particle_a.remove(&pair.particle_a_id);
        self.by_particle_b.remove(&pair.particle_b_id);
        Some(pair)
    }

    pub fn get(&self, pair_id: &PairId) -> Option<&EntangledPair> {
        self.pairs.get(pair_id)
    }

    pub fn get_mut(&mut self, pair_id: &PairId) -> Option<&mut EntangledPair> {
        self.pairs.get_mut(pair_id)
    }

    pub fn get_by_particle(&self, particle: &ParticleId) -> Option<&EntangledPair> {
        self.owner_of(particle).and_then(|id| self.pairs.get(&id))
    }

    pub fn pairs(&self) -> impl Iterator<Item = &EntangledPair> {
        self.pairs.values()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Advances every pair by `dt_secs` and evicts the expired ones.
    pub fn apply_decay(&mut self, dt_secs: f64, eviction_threshold: f64) -> DecayReport {
        let mut report = DecayReport::default();
        for pair in self.pairs.values_mut() {
            pair.advance(dt_secs);
            if pair.is_expired(eviction_threshold) {
                report.evicted.push(pair.pair_id);
            } else {
                report.updated += 1;
            }
        }
        for pair_id in &report.evicted {
            if let Some(pair) = self.remove(pair_id) {
                debug!(
                    "Evicted {} (fidelity {:.4} < {:.2} or coherence time exceeded)",
                    pair_id,
                    pair.fidelity(),
                    eviction_threshold
                );
            }
        }
        self.total_evicted += report.evicted.len() as u64;
        report
    }
}
