// Analysis pipeline
// Runs normalization, apnea clustering, validation, and false-negative detection

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::clustering::{
    cluster_apnea_events_with_stats, detect_false_negatives, validate_with_report, ApneaCluster,
    FalseNegativeCandidate, RejectedCluster,
};
use crate::config::{ConfigError, EngineConfig, Preset};
use crate::events::{normalize_rows, AnnotationEvent, FlowLimitationReading, RawEventRow};
use crate::pipeline::trace::{AnalysisTrace, TraceStage};

/// Output of one engine run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Validated apnea clusters, ascending by start
    pub clusters: Vec<ApneaCluster>,

    /// False-negative candidates, ascending by start
    pub false_negatives: Vec<FalseNegativeCandidate>,

    /// Raw clusters that failed validation, with reasons
    pub rejected: Vec<RejectedCluster>,

    /// Per-stage summary
    pub trace: AnalysisTrace,
}

/// Apnea clustering and false-negative engine bound to one validated configuration
///
/// Holds no state besides its configuration; every call is independent and
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct ApneaAnalyzer {
    config: EngineConfig,
}

impl ApneaAnalyzer {
    /// Create an analyzer with default configuration
    pub fn new() -> Self {
        ApneaAnalyzer {
            config: EngineConfig::default(),
        }
    }

    /// Create an analyzer with a custom configuration
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(ApneaAnalyzer { config })
    }

    /// Create an analyzer from a named preset
    pub fn from_preset(preset: Preset) -> Result<Self, ConfigError> {
        Self::with_config(preset.config())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze already-normalized event streams
    pub fn analyze(
        &self,
        annotations: &[AnnotationEvent],
        flg_readings: &[FlowLimitationReading],
    ) -> AnalysisResult {
        self.run(annotations, flg_readings, AnalysisTrace::new())
    }

    /// Normalize export rows, then analyze them
    pub fn analyze_rows(&self, rows: &[RawEventRow]) -> AnalysisResult {
        let normalized = normalize_rows(rows);

        let mut trace = AnalysisTrace::new();
        trace.record(
            TraceStage::Normalization,
            format!(
                "{} annotations, {} FLG readings",
                normalized.annotations.len(),
                normalized.flg_readings.len()
            ),
            json!({
                "annotations": normalized.annotations.len(),
                "flg_readings": normalized.flg_readings.len(),
                "dropped_rows": normalized.dropped_rows,
                "skipped_rows": normalized.skipped_rows,
            }),
        );

        self.run(&normalized.annotations, &normalized.flg_readings, trace)
    }

    fn run(
        &self,
        annotations: &[AnnotationEvent],
        flg_readings: &[FlowLimitationReading],
        mut trace: AnalysisTrace,
    ) -> AnalysisResult {
        let config = &self.config;

        // Stage 1: raw clusters
        let (raw_clusters, stats) =
            cluster_apnea_events_with_stats(annotations, flg_readings, config);
        trace.record(
            TraceStage::ApneaClustering,
            format!("{} raw clusters", raw_clusters.len()),
            json!({
                "raw_clusters": raw_clusters.len(),
                "bridge_clusters": stats.bridge_clusters,
                "valid_edges": stats.valid_edges,
                "bridged_merges": stats.bridged_merges,
                "extended_starts": stats.extended_starts,
                "extended_ends": stats.extended_ends,
            }),
        );

        // Stage 2: acceptance rules
        let report = validate_with_report(raw_clusters, config);
        trace.record(
            TraceStage::Validation,
            format!(
                "{} accepted, {} rejected",
                report.accepted.len(),
                report.rejected.len()
            ),
            json!({
                "accepted": report.accepted.len(),
                "rejected": report.rejected.len(),
            }),
        );

        // Stage 3: independent of stages 1-2
        let false_negatives = detect_false_negatives(flg_readings, annotations, config);
        trace.record(
            TraceStage::FalseNegatives,
            format!("{} candidates", false_negatives.len()),
            json!({ "candidates": false_negatives.len() }),
        );

        log::info!(
            "Analysis complete: {} clusters, {} false-negative candidates",
            report.accepted.len(),
            false_negatives.len()
        );

        AnalysisResult {
            clusters: report.accepted,
            false_negatives,
            rejected: report.rejected,
            trace,
        }
    }
}

/// Validate `config` and analyze the given event streams
pub fn analyze(
    annotations: &[AnnotationEvent],
    flg_readings: &[FlowLimitationReading],
    config: &EngineConfig,
) -> Result<AnalysisResult, ConfigError> {
    let analyzer = ApneaAnalyzer::with_config(config.clone())?;
    Ok(analyzer.analyze(annotations, flg_readings))
}
