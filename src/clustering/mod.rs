// Clustering module
// Threshold clustering of FLG readings, apnea event clustering, validation,
// and false-negative detection

pub mod apnea;
pub mod false_negative;
pub mod threshold;
pub mod validate;

pub use apnea::{cluster_apnea_events, cluster_apnea_events_with_stats, ApneaCluster, ClusteringStats};
pub use false_negative::{detect_false_negatives, FalseNegativeCandidate};
pub use threshold::{build_clusters, ThresholdCluster};
pub use validate::{
    is_valid_cluster, rejection_reasons, validate_clusters, validate_with_report, RejectedCluster,
    RejectionReason, ValidationReport,
};
