// src/coordinator.rs

//! `QuantumCore`: owns the three engines and sequences their lifecycle.

use crate::collapse::{
    CollapseEvent, CollapseMechanism, CollapseRequest, CollapseStats, CollapseTrigger, MeasurementBasis,
    StateCollapseHandler,
};
use crate::config::CoreConfig;
use crate::core::{QuantumResult, QuantumState};
use crate::correction::{CodeType, CorrectionResult, CorrectionStats, ErrorCorrectionEngine, ErrorTag};
use crate::entanglement::{EntangledPair, EntanglementManager, EntanglementStatus, EntanglementType};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

/// Combined status of all engines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoreStatus {
    pub running: bool,
    #[serde(flatten)]
    pub entanglement: EntanglementStatus,
    pub collapse: CollapseStats,
    pub correction: CorrectionStats,
    pub available_codes: Vec<CodeType>,
}

/// Facade over the entanglement manager, the collapse handler and the
/// correction engine.
#[derive(Debug)]
pub struct QuantumCore {
    config: CoreConfig,
    entanglement: EntanglementManager,
    collapse: StateCollapseHandler,
    correction: ErrorCorrectionEngine,
    running: AtomicBool,
}

impl QuantumCore {
    /// Validates `config` and builds the engines. Background tracking starts
    /// with [`QuantumCore::initialize`].
    pub fn new(config: CoreConfig) -> QuantumResult<Self> {
        config.validate()?;
        Ok(Self {
            entanglement: EntanglementManager::new(config.entanglement.clone())?,
            collapse: StateCollapseHandler::new(config.collapse.clone())?,
            correction: ErrorCorrectionEngine::new(config.correction.clone())?,
            config,
            running: AtomicBool::new(false),
        })
    }

    pub fn with_defaults() -> QuantumResult<Self> {
        Self::new(CoreConfig::default())
    }

    /// Starts decay tracking. Returns `false` if the core was already running.
    pub fn initialize(&self) -> QuantumResult<bool> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        if let Err(e) = self.entanglement.start_tracking() {
            self.running.store(false, Ordering::Release);
            return Err(e);
        }
        info!("Quantum core initialized");
        Ok(true)
    }

    /// Stops decay tracking and joins the background thread. Idempotent;
    /// returns `false` if the core was not running.
    pub fn shutdown(&self) -> bool {
        if !self.running.swap(false, Ordering::AcqRel) {
            return false;
        }
        if let Err(e) = self.entanglement.stop_tracking() {
            error!("Decay tracking did not stop cleanly: {}", e);
        }
        info!("Quantum core shut down");
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Creates a pair, returning `None` (and logging why) on failure.
    pub fn create_entangled_pair(
        &self,
        entanglement_type: EntanglementType,
        particle_a: Option<&str>,
        particle_b: Option<&str>,
        bias: Option<f64>,
    ) -> Option<EntangledPair> {
        match self.entanglement.create_entangled_pair(
            entanglement_type,
            particle_a.map(Into::into),
            particle_b.map(Into::into),
            bias,
        ) {
            Ok(pair) => Some(pair),
            Err(e) => {
                warn!("Entangled pair not created: {}", e);
                None
            }
        }
    }

    pub fn get_status(&self) -> CoreStatus {
        CoreStatus {
            running: self.is_running(),
            entanglement: self.entanglement.status(),
            collapse: self.collapse.stats(),
            correction: self.correction.stats(),
            available_codes: self.correction.available_codes(),
        }
    }

    /// Collapses a copy of `state`. Basis defaults to computational, strength to 1.0.
    pub fn trigger_collapse(
        &self,
        state: &QuantumState,
        trigger: CollapseTrigger,
        mechanism: CollapseMechanism,
        basis: Option<MeasurementBasis>,
        strength: Option<f64>,
        observer_id: Option<&str>,
    ) -> QuantumResult<CollapseEvent> {
        let mut request = CollapseRequest::new(trigger, mechanism)
            .with_basis(basis.unwrap_or_default())
            .with_strength(strength.unwrap_or(1.0));
        if let Some(observer) = observer_id {
            request = request.with_observer(observer);
        }
        self.collapse.trigger_collapse(state, &request)
    }

    pub fn trigger_collapse_request(&self, state: &QuantumState, request: &CollapseRequest) -> QuantumResult<CollapseEvent> {
        self.collapse.trigger_collapse(state, request)
    }

    pub fn correct_errors(
        &self,
        state: &mut QuantumState,
        errors: &[ErrorTag],
        code_type: CodeType,
    ) -> QuantumResult<CorrectionResult> {
        self.correction.correct_errors(state, errors, code_type, None)
    }

    pub fn correct_errors_with_bias(
        &self,
        state: &mut QuantumState,
        errors: &[ErrorTag],
        code_type: CodeType,
        bias: f64,
    ) -> QuantumResult<CorrectionResult> {
        self.correction.correct_errors(state, errors, code_type, Some(bias))
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn entanglement(&self) -> &EntanglementManager {
        &self.entanglement
    }

    pub fn collapse(&self) -> &StateCollapseHandler {
        &self.collapse
    }

    pub fn correction(&self) -> &ErrorCorrectionEngine {
        &self.correction
    }
}

impl Drop for QuantumCore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_is_idempotent() -> QuantumResult<()> {
        let core = QuantumCore::with_defaults()?;
        assert!(!core.is_running());
        assert!(!core.shutdown());
        assert!(core.initialize()?);
        assert!(!core.initialize()?);
        assert!(core.get_status().running);
        assert!(core.shutdown());
        assert!(!core.shutdown());
        assert!(!core.entanglement().is_tracking());
        Ok(())
    }

    #[test]
    fn test_failed_creation_returns_none() -> QuantumResult<()> {
        let core = QuantumCore::with_defaults()?;
        assert!(core.create_entangled_pair(EntanglementType::BellPhiPlus, Some("a"), Some("b"), None).is_some());
        assert!(core.create_entangled_pair(EntanglementType::Ghz, Some("b"), Some("c"), None).is_none());
        let status = core.get_status();
        assert_eq!(status.entanglement.active_pairs, 1);
        assert_eq!(status.entanglement.total_attempts, 2);
        assert!((status.entanglement.success_rate - 0.5).abs() < 1e-12);
        Ok(())
    }
}
