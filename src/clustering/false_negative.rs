// False-negative detection
// Finds sustained flow limitation with no annotated apnea nearby

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::threshold::{any_time_within, build_clusters, ThresholdCluster};
use crate::config::EngineConfig;
use crate::events::types::{offset_by_secs, AnnotationEvent, FlowLimitationReading};

/// A flow-limitation period the device never annotated as an apnea
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalseNegativeCandidate {
    /// First contributing reading
    pub start: DateTime<Utc>,

    /// Last contributing reading
    pub end: DateTime<Utc>,

    /// end - start in seconds
    pub duration_sec: f64,

    /// Peak FLG level among contributing readings
    pub confidence: f64,
}

impl FalseNegativeCandidate {
    fn from_cluster(cluster: &ThresholdCluster) -> Self {
        FalseNegativeCandidate {
            start: cluster.start,
            end: cluster.end,
            duration_sec: cluster.duration_sec(),
            confidence: cluster.peak_level(),
        }
    }
}

/// Detect false-negative candidates
///
/// Algorithm:
/// 1. Cluster FLG readings >= bridge_threshold with gaps <= bridge_gap_sec
/// 2. Keep spans within [false_neg_duration_min_sec, false_neg_duration_max_sec]
/// 3. Drop candidates with an annotated apnea onset within overlap_window_sec
///    of the span
/// 4. Drop candidates whose peak level is below false_neg_confidence_min
///
/// The three filters are a plain conjunction; the order only prunes the
/// cheap checks first.
pub fn detect_false_negatives(
    flg_readings: &[FlowLimitationReading],
    annotations: &[AnnotationEvent],
    config: &EngineConfig,
) -> Vec<FalseNegativeCandidate> {
    let mut apnea_times: Vec<DateTime<Utc>> = annotations
        .iter()
        .filter(|e| e.kind.is_apnea())
        .map(|e| e.timestamp)
        .collect();
    apnea_times.sort();

    let candidates: Vec<FalseNegativeCandidate> =
        build_clusters(flg_readings, config.bridge_threshold, config.bridge_gap_sec)
            .iter()
            .map(FalseNegativeCandidate::from_cluster)
            .filter(|c| {
                c.duration_sec >= config.false_neg_duration_min_sec
                    && c.duration_sec <= config.false_neg_duration_max_sec
            })
            .filter(|c| {
                let from = offset_by_secs(c.start, -config.overlap_window_sec);
                let to = offset_by_secs(c.end, config.overlap_window_sec);
                !any_time_within(&apnea_times, from, to)
            })
            .filter(|c| c.confidence >= config.false_neg_confidence_min)
            .collect();

    log::debug!("False-negative detection: {} candidates", candidates.len());

    candidates
}
