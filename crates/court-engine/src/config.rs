//! Tunable parameters for matrix construction and pair scoring.
//!
//! Every section deserialises with defaults for missing fields, so a config
//! file only needs to name what it overrides.

use serde::{Deserialize, Serialize};

/// Matrix builder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// A matrix is only complete when it holds more cells than this.
    /// Stands in for "the page rendered a full grid".
    pub min_cells_for_complete: usize,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            min_cells_for_complete: 50,
        }
    }
}

/// Weights for ranking bookable pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub preference_weight: f64,
    pub history_weight: f64,
    /// Success rate assumed when no history exists for a slot.
    pub neutral_success_rate: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            preference_weight: 0.6,
            history_weight: 0.4,
            neutral_success_rate: 0.5,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub matrix: MatrixConfig,
    pub scoring: ScoringConfig,
}

impl EngineConfig {
    /// Parse a JSON config document. Missing sections keep their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
