// Analysis tracing
// In-memory stage log for one engine run, renderable as JSONL

use serde::{Deserialize, Serialize};

/// Engine stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStage {
    /// Export rows mapped to typed events (row input only)
    Normalization,
    ApneaClustering,
    Validation,
    FalseNegatives,
}

impl TraceStage {
    pub fn to_string(&self) -> &'static str {
        match self {
            TraceStage::Normalization => "normalization",
            TraceStage::ApneaClustering => "apnea_clustering",
            TraceStage::Validation => "validation",
            TraceStage::FalseNegatives => "false_negatives",
        }
    }
}

/// Outcome of one stage: a summary line plus the counts behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub stage: TraceStage,

    /// Human-readable summary
    pub message: String,

    /// Stage counters (cluster counts, merges, drops)
    pub data: serde_json::Value,
}

/// Ordered trace of one analysis run
/// Carries no wall-clock data so identical runs produce identical traces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTrace {
    pub entries: Vec<TraceEntry>,
}

impl AnalysisTrace {
    pub fn new() -> Self {
        AnalysisTrace::default()
    }

    /// Append the outcome of a stage
    pub fn record(&mut self, stage: TraceStage, message: impl Into<String>, data: serde_json::Value) {
        let message = message.into();
        log::debug!("[{}] {}", stage.to_string(), message);
        self.entries.push(TraceEntry {
            stage,
            message,
            data,
        });
    }

    /// Entry recorded for a stage, if it ran
    pub fn stage(&self, stage: TraceStage) -> Option<&TraceEntry> {
        self.entries.iter().find(|e| e.stage == stage)
    }

    pub fn stages(&self) -> Vec<TraceStage> {
        self.entries.iter().map(|e| e.stage).collect()
    }

    /// One JSON object per line, newline-terminated
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        self.entries.iter().try_fold(String::new(), |mut out, entry| {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
            Ok(out)
        })
    }
}
