//! Numerical constants and defaults shared by the engines.

/// Tolerances used when checking amplitude vectors.
pub mod tolerances {
    /// Deviation from unit norm under which `normalize` is a no-op.
    pub const NORM_EPSILON: f64 = 1e-12;
    /// Deviation from unit norm accepted on input states.
    pub const INPUT_NORM_TOLERANCE: f64 = 1e-6;
    /// Squared magnitude below which an amplitude is treated as zero.
    pub const AMPLITUDE_EPSILON: f64 = 1e-12;
}

/// Defaults for the tunable knobs. The decay constants are empirical,
/// not physically derived.
pub mod defaults {
    /// Decay loop period in milliseconds.
    pub const TRACKING_INTERVAL_MS: u64 = 100;
    /// Per-second fidelity decay constant.
    pub const DECOHERENCE_RATE: f64 = 0.01;
    /// Pairs below this fidelity are evicted.
    pub const EVICTION_THRESHOLD: f64 = 0.5;
    /// Fidelity factor applied to biased-custom preparations.
    pub const BIASED_PREPARATION_FIDELITY: f64 = 0.98;
    /// Weak measurements stronger than this become projective.
    pub const WEAK_DISTURBANCE_THRESHOLD: f64 = 0.3;
    /// Environmental phase-noise rate, multiplied by the measurement strength.
    pub const ENVIRONMENTAL_RATE: f64 = 0.1;
}

/// `1/√2`
pub const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;
