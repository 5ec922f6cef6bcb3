// CPAP Insight - Apnea event clustering and false-negative detection
// Module declarations

pub mod clustering;
pub mod config;
pub mod events;
pub mod pipeline;

pub use clustering::{
    build_clusters, cluster_apnea_events, detect_false_negatives, validate_clusters, ApneaCluster,
    FalseNegativeCandidate, RejectedCluster, RejectionReason, ThresholdCluster,
};
pub use config::{BridgeGate, ConfigError, EdgeSelection, EngineConfig, Preset};
pub use events::{
    normalize_rows, AnnotationEvent, EventKind, FlowLimitationReading, NormalizedEvents,
    RawEventRow,
};
pub use pipeline::{analyze, AnalysisResult, AnalysisTrace, ApneaAnalyzer};
