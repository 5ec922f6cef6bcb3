// Tuning presets
// Named strict/balanced/lenient parameter sets for the clustering engine

use serde::{Deserialize, Serialize};

use super::settings::{ConfigError, EngineConfig};

/// Named engine tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Tighter gaps, more events per cluster, near-certain false negatives only
    Strict,

    /// Default thresholds
    Balanced,

    /// Wider gaps, smaller clusters, weaker flow limitation accepted
    Lenient,
}

impl Preset {
    /// Parse a preset name (case-insensitive)
    pub fn from_string(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Preset::Strict),
            "balanced" => Ok(Preset::Balanced),
            "lenient" => Ok(Preset::Lenient),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            Preset::Strict => "strict",
            Preset::Balanced => "balanced",
            Preset::Lenient => "lenient",
        }
    }

    /// Build the configuration for this preset
    pub fn config(&self) -> EngineConfig {
        match self {
            Preset::Strict => EngineConfig {
                gap_sec: 90.0,
                bridge_threshold: 0.2,
                bridge_gap_sec: 45.0,
                edge_threshold: 0.6,
                edge_min_duration_sec: 15.0,
                min_cluster_events: 4,
                min_cluster_total_duration_sec: 90.0,
                max_cluster_span_sec: 200.0,
                false_neg_duration_min_sec: 90.0,
                false_neg_duration_max_sec: 600.0,
                false_neg_confidence_min: 0.98,
                overlap_window_sec: 10.0,
                ..EngineConfig::default()
            },

            Preset::Balanced => EngineConfig::default(),

            Preset::Lenient => EngineConfig {
                gap_sec: 150.0,
                bridge_threshold: 0.05,
                bridge_gap_sec: 90.0,
                edge_threshold: 0.4,
                edge_min_duration_sec: 5.0,
                min_cluster_events: 2,
                min_cluster_total_duration_sec: 30.0,
                max_cluster_span_sec: 300.0,
                false_neg_duration_min_sec: 45.0,
                false_neg_duration_max_sec: 900.0,
                false_neg_confidence_min: 0.9,
                overlap_window_sec: 5.0,
                ..EngineConfig::default()
            },
        }
    }
}

/// Get all preset names
pub fn list_presets() -> Vec<String> {
    [Preset::Strict, Preset::Balanced, Preset::Lenient]
        .iter()
        .map(|p| p.to_string().to_string())
        .collect()
}
