// Cluster validation
// Acceptance rules applied to raw apnea clusters, with rejection reasons for explainability

use serde::{Deserialize, Serialize};

use super::apnea::ApneaCluster;
use crate::config::EngineConfig;

/// Why a raw cluster failed validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum RejectionReason {
    /// Fewer than min_cluster_events members
    TooFewEvents { count: usize, min: usize },

    /// Summed event duration below min_cluster_total_duration_sec
    TooShort { total_duration_sec: f64, min: f64 },

    /// Span above max_cluster_span_sec
    SpanTooWide { span_sec: f64, max: f64 },
}

impl RejectionReason {
    /// Human-readable explanation
    pub fn describe(&self) -> String {
        match self {
            RejectionReason::TooFewEvents { count, min } => {
                format!("{} events, at least {} required", count, min)
            }
            RejectionReason::TooShort {
                total_duration_sec,
                min,
            } => format!(
                "{:.1}s total event duration, at least {:.1}s required",
                total_duration_sec, min
            ),
            RejectionReason::SpanTooWide { span_sec, max } => {
                format!("{:.1}s span exceeds the {:.1}s limit", span_sec, max)
            }
        }
    }
}

/// A raw cluster that failed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCluster {
    pub cluster: ApneaCluster,

    /// Every failed rule, never empty
    pub reasons: Vec<RejectionReason>,
}

/// Accepted and rejected clusters, both in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub accepted: Vec<ApneaCluster>,
    pub rejected: Vec<RejectedCluster>,
}

/// All rules the cluster fails (empty when valid)
pub fn rejection_reasons(cluster: &ApneaCluster, config: &EngineConfig) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();

    if cluster.count < config.min_cluster_events {
        reasons.push(RejectionReason::TooFewEvents {
            count: cluster.count,
            min: config.min_cluster_events,
        });
    }

    let total_duration_sec = cluster.total_event_duration_sec();
    if total_duration_sec < config.min_cluster_total_duration_sec {
        reasons.push(RejectionReason::TooShort {
            total_duration_sec,
            min: config.min_cluster_total_duration_sec,
        });
    }

    if cluster.duration_sec > config.max_cluster_span_sec {
        reasons.push(RejectionReason::SpanTooWide {
            span_sec: cluster.duration_sec,
            max: config.max_cluster_span_sec,
        });
    }

    reasons
}

pub fn is_valid_cluster(cluster: &ApneaCluster, config: &EngineConfig) -> bool {
    rejection_reasons(cluster, config).is_empty()
}

/// Keep clusters passing every acceptance rule
pub fn validate_clusters(clusters: Vec<ApneaCluster>, config: &EngineConfig) -> Vec<ApneaCluster> {
    clusters
        .into_iter()
        .filter(|c| is_valid_cluster(c, config))
        .collect()
}

/// Partition clusters into accepted and rejected, recording reasons
pub fn validate_with_report(clusters: Vec<ApneaCluster>, config: &EngineConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    for cluster in clusters {
        let reasons = rejection_reasons(&cluster, config);
        if reasons.is_empty() {
            report.accepted.push(cluster);
        } else {
            report.rejected.push(RejectedCluster { cluster, reasons });
        }
    }

    log::debug!(
        "Cluster validation: {} accepted, {} rejected",
        report.accepted.len(),
        report.rejected.len()
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::{seconds_between, AnnotationEvent, EventKind};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn cluster(start: i64, end: i64, durations: &[f64]) -> ApneaCluster {
        let events: Vec<AnnotationEvent> = durations
            .iter()
            .enumerate()
            .map(|(i, d)| AnnotationEvent::new(at(start + i as i64 * 30), EventKind::Obstructive, *d))
            .collect();

        ApneaCluster {
            start: at(start),
            end: at(end),
            duration_sec: seconds_between(at(start), at(end)),
            count: events.len(),
            events,
        }
    }

    #[test]
    fn test_valid_cluster_passes() {
        let config = EngineConfig::default();
        let c = cluster(0, 120, &[20.0, 20.0, 20.0]);

        assert!(is_valid_cluster(&c, &config));
        assert!(rejection_reasons(&c, &config).is_empty());
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let config = EngineConfig::default();
        // Exactly 3 events, exactly 60s total, exactly 230s span
        let c = cluster(0, 230, &[20.0, 20.0, 20.0]);

        assert!(is_valid_cluster(&c, &config));
    }

    #[test]
    fn test_too_few_events() {
        let config = EngineConfig::default();
        let c = cluster(0, 105, &[40.0, 40.0]);

        assert_eq!(
            rejection_reasons(&c, &config),
            vec![RejectionReason::TooFewEvents { count: 2, min: 3 }]
        );
    }

    #[test]
    fn test_too_short_total_duration() {
        let config = EngineConfig::default();
        let c = cluster(0, 100, &[10.0, 10.0, 10.0]);

        let reasons = rejection_reasons(&c, &config);
        assert_eq!(reasons.len(), 1);
        assert!(matches!(reasons[0], RejectionReason::TooShort { .. }));
    }

    #[test]
    fn test_span_too_wide() {
        let config = EngineConfig::default();
        let c = cluster(0, 231, &[30.0, 30.0, 30.0]);

        let reasons = rejection_reasons(&c, &config);
        assert_eq!(reasons.len(), 1);
        assert!(matches!(reasons[0], RejectionReason::SpanTooWide { .. }));
    }

    #[test]
    fn test_multiple_reasons_recorded() {
        let config = EngineConfig::default();
        let c = cluster(0, 500, &[5.0]);

        assert_eq!(rejection_reasons(&c, &config).len(), 3);
    }

    #[test]
    fn test_report_partitions_in_order() {
        let config = EngineConfig::default();
        let clusters = vec![
            cluster(0, 120, &[20.0, 20.0, 20.0]),
            cluster(300, 310, &[10.0]),
            cluster(600, 700, &[25.0, 25.0, 25.0]),
        ];

        let report = validate_with_report(clusters.clone(), &config);

        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.accepted[0].start, at(0));
        assert_eq!(report.accepted[1].start, at(600));
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].cluster.start, at(300));
        assert_eq!(validate_clusters(clusters, &config), report.accepted);
    }

    #[test]
    fn test_describe_mentions_limits() {
        let reason = RejectionReason::TooFewEvents { count: 2, min: 3 };
        assert_eq!(reason.describe(), "2 events, at least 3 required");

        let reason = RejectionReason::SpanTooWide {
            span_sec: 300.0,
            max: 230.0,
        };
        assert!(reason.describe().contains("230.0s"));
    }
}
