// Pipeline execution module
// Orchestrates normalization, clustering, validation, and false-negative detection

pub mod analyzer;
pub mod trace;

pub use analyzer::{analyze, AnalysisResult, ApneaAnalyzer};
pub use trace::{AnalysisTrace, TraceEntry, TraceStage};
