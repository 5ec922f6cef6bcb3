// Engine configuration
// All clustering and false-negative thresholds, passed explicitly per invocation

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised when a configuration is rejected
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("edge_threshold ({edge}) must be >= bridge_threshold ({bridge})")]
    ThresholdOrder { bridge: f64, edge: f64 },

    #[error("{min_field} ({min}) must be <= {max_field} ({max})")]
    InvertedRange {
        min_field: &'static str,
        max_field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("min_cluster_events must be at least 1")]
    ZeroMinEvents,

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How FLG evidence is allowed to bridge two annotation events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeGate {
    /// Any bridge reading inside [prev_end, next_onset] merges, regardless of gap length
    EvidenceOnly,

    /// Bridge reading required AND gap <= bridge_gap_sec
    WithinBridgeGap,
}

/// Which qualifying edge cluster extends a cluster boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeSelection {
    /// First qualifying edge cluster in chronological order
    FirstMatch,

    /// Qualifying edge cluster closest to the boundary
    Nearest,
}

/// Configuration for apnea clustering and false-negative detection
/// Defaults match the balanced preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Max gap (s) between one event's end and the next onset to merge directly
    /// Also the max distance for boundary extension
    pub gap_sec: f64,

    /// Min FLG level that counts as bridging evidence
    pub bridge_threshold: f64,

    /// Max gap (s) between consecutive readings inside an FLG sub-cluster
    pub bridge_gap_sec: f64,

    /// Min FLG level for boundary-extension clusters (>= bridge_threshold)
    pub edge_threshold: f64,

    /// Min span (s) for an edge cluster to extend a boundary
    pub edge_min_duration_sec: f64,

    /// Min number of events in an accepted cluster
    pub min_cluster_events: usize,

    /// Min summed event duration (s) in an accepted cluster
    pub min_cluster_total_duration_sec: f64,

    /// Max start-to-end span (s) of an accepted cluster
    pub max_cluster_span_sec: f64,

    /// Min span (s) of a false-negative candidate
    pub false_neg_duration_min_sec: f64,

    /// Max span (s) of a false-negative candidate
    pub false_neg_duration_max_sec: f64,

    /// Min peak FLG level of a false-negative candidate
    pub false_neg_confidence_min: f64,

    /// Padding (s) around a candidate searched for annotated apneas
    pub overlap_window_sec: f64,

    /// Bridging policy
    pub bridge_gate: BridgeGate,

    /// Boundary-extension policy
    pub edge_selection: EdgeSelection,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            gap_sec: 120.0,
            bridge_threshold: 0.1,
            bridge_gap_sec: 60.0,
            edge_threshold: 0.5,
            edge_min_duration_sec: 10.0,
            min_cluster_events: 3,
            min_cluster_total_duration_sec: 60.0,
            max_cluster_span_sec: 230.0,
            false_neg_duration_min_sec: 60.0,
            false_neg_duration_max_sec: 600.0,
            false_neg_confidence_min: 0.95,
            overlap_window_sec: 5.0,
            bridge_gate: BridgeGate::EvidenceOnly,
            edge_selection: EdgeSelection::FirstMatch,
        }
    }
}

impl EngineConfig {
    /// Reject configurations the algorithms cannot meaningfully run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields: [(&'static str, f64); 11] = [
            ("gap_sec", self.gap_sec),
            ("bridge_threshold", self.bridge_threshold),
            ("bridge_gap_sec", self.bridge_gap_sec),
            ("edge_threshold", self.edge_threshold),
            ("edge_min_duration_sec", self.edge_min_duration_sec),
            ("min_cluster_total_duration_sec", self.min_cluster_total_duration_sec),
            ("max_cluster_span_sec", self.max_cluster_span_sec),
            ("false_neg_duration_min_sec", self.false_neg_duration_min_sec),
            ("false_neg_duration_max_sec", self.false_neg_duration_max_sec),
            ("false_neg_confidence_min", self.false_neg_confidence_min),
            ("overlap_window_sec", self.overlap_window_sec),
        ];

        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.edge_threshold < self.bridge_threshold {
            return Err(ConfigError::ThresholdOrder {
                bridge: self.bridge_threshold,
                edge: self.edge_threshold,
            });
        }

        if self.false_neg_duration_min_sec > self.false_neg_duration_max_sec {
            return Err(ConfigError::InvertedRange {
                min_field: "false_neg_duration_min_sec",
                max_field: "false_neg_duration_max_sec",
                min: self.false_neg_duration_min_sec,
                max: self.false_neg_duration_max_sec,
            });
        }

        if self.min_cluster_events == 0 {
            return Err(ConfigError::ZeroMinEvents);
        }

        Ok(())
    }

    /// Serialize to pretty JSON bytes
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Deserialize and validate; missing fields take their defaults
    pub fn from_json_bytes(data: &[u8]) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read(path)?;
        Self::from_json_bytes(&data)
    }

    /// Write this config as JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json_bytes()?)?;
        Ok(())
    }
}
