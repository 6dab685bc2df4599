// src/config.rs

//! Tunable knobs for the three engines.
//!
//! Every section deserializes with defaults for missing fields, so a partial
//! JSON document such as `{"entanglement": {"decoherence_rate": 0.05}}` is valid.

use crate::core::constants::defaults;
use crate::core::constants::tolerances::INPUT_NORM_TOLERANCE;
use crate::core::{QuantumError, QuantumResult};
use crate::correction::CodeType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration of a `QuantumCore`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub entanglement: EntanglementConfig,
    pub collapse: CollapseConfig,
    pub correction: CorrectionConfig,
}

impl CoreConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> QuantumResult<Self> {
        let config: CoreConfig = serde_json::from_str(json)
            .map_err(|e| QuantumError::invalid_configuration(format!("Malformed configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    pub fn validate(&self) -> QuantumResult<()> {
        self.entanglement.validate()?;
        self.collapse.validate()?;
        self.correction.validate()
    }
}

/// Entanglement manager settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntanglementConfig {
    /// Period of the background decay loop.
    pub tracking_interval_ms: u64,
    /// Default per-second decay constant for new pairs.
    pub decoherence_rate: f64,
    /// Pairs whose fidelity drops below this are evicted.
    pub eviction_threshold: f64,
    /// Optional hard lifetime (seconds) since the last measurement. `None` is unbounded.
    pub coherence_time_secs: Option<f64>,
    /// Fidelity factor applied to biased-custom preparations.
    pub biased_preparation_fidelity: f64,
    /// Seed for measurement sampling; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for EntanglementConfig {
    fn default() -> Self {
        Self {
            tracking_interval_ms: defaults::TRACKING_INTERVAL_MS,
            decoherence_rate: defaults::DECOHERENCE_RATE,
            eviction_threshold: defaults::EVICTION_THRESHOLD,
            coherence_time_secs: None,
            biased_preparation_fidelity: defaults::BIASED_PREPARATION_FIDELITY,
            seed: None,
        }
    }
}

impl EntanglementConfig {
    pub fn tracking_interval(&self) -> Duration {
        Duration::from_millis(self.tracking_interval_ms)
    }

    pub fn with_decoherence_rate(mut self, rate: f64) -> Self {
        self.decoherence_rate = rate;
        self
    }

    pub fn with_eviction_threshold(mut self, threshold: f64) -> Self {
        self.eviction_threshold = threshold;
        self
    }

    pub fn with_tracking_interval_ms(mut self, interval_ms: u64) -> Self {
        self.tracking_interval_ms = interval_ms;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> QuantumResult<()> {
        if self.tracking_interval_ms == 0 {
            return Err(QuantumError::invalid_configuration("tracking_interval_ms must be positive"));
        }
        if !self.decoherence_rate.is_finite() || self.decoherence_rate < 0.0 {
            return Err(QuantumError::invalid_configuration(format!(
                "decoherence_rate must be a non-negative number, got {}",
                self.decoherence_rate
            )));
        }
        unit_interval(self.eviction_threshold, "eviction_threshold")?;
        unit_interval(self.biased_preparation_fidelity, "biased_preparation_fidelity")?;
        if let Some(t) = self.coherence_time_secs {
            if !(t > 0.0) {
                return Err(QuantumError::invalid_configuration(format!(
                    "coherence_time_secs must be positive, got {}",
                    t
                )));
            }
        }
        Ok(())
    }
}

/// Collapse handler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollapseConfig {
    /// Weak measurements stronger than this act projectively.
    pub weak_disturbance_threshold: f64,
    /// Environmental phase-noise rate (scaled by strength).
    pub environmental_rate: f64,
    /// Accepted deviation from unit norm on input states.
    pub norm_tolerance: f64,
    /// Seed for outcome sampling; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            weak_disturbance_threshold: defaults::WEAK_DISTURBANCE_THRESHOLD,
            environmental_rate: defaults::ENVIRONMENTAL_RATE,
            norm_tolerance: INPUT_NORM_TOLERANCE,
            seed: None,
        }
    }
}

impl CollapseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> QuantumResult<()> {
        unit_interval(self.weak_disturbance_threshold, "weak_disturbance_threshold")?;
        unit_interval(self.environmental_rate, "environmental_rate")?;
        if !(self.norm_tolerance > 0.0) {
            return Err(QuantumError::invalid_configuration("norm_tolerance must be positive"));
        }
        Ok(())
    }
}

/// Error-correction engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Codes to register with the engine.
    pub codes: Vec<CodeType>,
    /// Seed for bias-driven decisions and depolarizing injection.
    pub seed: Option<u64>,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self { codes: CodeType::ALL.to_vec(), seed: None }
    }
}

impl CorrectionConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> QuantumResult<()> {
        if self.codes.is_empty() {
            return Err(QuantumError::invalid_configuration("at least one correction code must be enabled"));
        }
        Ok(())
    }
}

fn unit_interval(value: f64, name: &str) -> QuantumResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(QuantumError::invalid_configuration(format!(
            "{} must lie in [0, 1], got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.entanglement.tracking_interval(), Duration::from_millis(100));
        assert_eq!(config.entanglement.decoherence_rate, 0.01);
        assert_eq!(config.entanglement.eviction_threshold, 0.5);
        assert_eq!(config.correction.codes.len(), 5);
    }

    #[test]
    fn test_partial_json() -> QuantumResult<()> {
        let config = CoreConfig::from_json_str(
            r#"{"entanglement": {"decoherence_rate": 0.05}, "correction": {"codes": ["shor9"]}}"#,
        )?;
        assert_eq!(config.entanglement.decoherence_rate, 0.05);
        assert_eq!(config.entanglement.eviction_threshold, 0.5);
        assert_eq!(config.correction.codes, vec![CodeType::Shor9]);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"entanglement": {"eviction_threshold": 1.5}}"#),
            Err(QuantumError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"correction": {"codes": []}}"#),
            Err(QuantumError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            CoreConfig::from_json_str("not json"),
            Err(QuantumError::InvalidConfiguration { .. })
        ));
    }
}
