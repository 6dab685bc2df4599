// src/core/id.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of an entangled pair, assigned by the entanglement manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairId(pub Uuid);

impl PairId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        PairId(Uuid::new_v4())
    }
}

impl Default for PairId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pair({})", self.0)
    }
}

/// Identifier of a single particle taking part in an entanglement.
/// Caller supplied, or generated as `particle-<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub String);

impl ParticleId {
    /// Generates a random particle identifier.
    pub fn generate() -> Self {
        ParticleId(format!("particle-{}", Uuid::new_v4()))
    }

    /// Borrows the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticleId {
    fn from(value: &str) -> Self {
        ParticleId(value.to_string())
    }
}

impl From<String> for ParticleId {
    fn from(value: String) -> Self {
        ParticleId(value)
    }
}
