// Threshold clustering
// Groups FLG readings above a level into runs separated by at most a max gap

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::types::{seconds_between, FlowLimitationReading};

/// A contiguous run of above-threshold FLG readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCluster {
    /// Member readings, ascending by timestamp
    pub readings: Vec<FlowLimitationReading>,

    /// Timestamp of the first reading
    pub start: DateTime<Utc>,

    /// Timestamp of the last reading
    pub end: DateTime<Utc>,
}

impl ThresholdCluster {
    /// Close a run of readings; empty runs produce no cluster
    fn from_run(readings: Vec<FlowLimitationReading>) -> Option<Self> {
        let start = readings.first()?.timestamp;
        let end = readings.last()?.timestamp;
        Some(ThresholdCluster {
            readings,
            start,
            end,
        })
    }

    /// Span from first to last reading in seconds
    pub fn duration_sec(&self) -> f64 {
        seconds_between(self.start, self.end)
    }

    /// Highest level among member readings
    pub fn peak_level(&self) -> f64 {
        self.readings
            .iter()
            .map(|r| r.level)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Build threshold clusters from FLG readings
///
/// Algorithm:
/// 1. Keep readings with level >= level_threshold
/// 2. Stable-sort by timestamp (input order is not trusted)
/// 3. Fold left to right; a reading joins the open run when its gap to the
///    previous accepted reading is <= max_gap_sec, otherwise the run closes
/// 4. Flush the final open run
pub fn build_clusters(
    readings: &[FlowLimitationReading],
    level_threshold: f64,
    max_gap_sec: f64,
) -> Vec<ThresholdCluster> {
    let mut accepted: Vec<&FlowLimitationReading> = readings
        .iter()
        .filter(|r| r.level >= level_threshold)
        .collect();
    accepted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let (mut closed, open) = accepted.into_iter().fold(
        (Vec::<ThresholdCluster>::new(), Vec::<FlowLimitationReading>::new()),
        |(mut closed, mut open), reading| {
            let joins = open.last().map_or(true, |prev| {
                seconds_between(prev.timestamp, reading.timestamp) <= max_gap_sec
            });
            if !joins {
                closed.extend(ThresholdCluster::from_run(std::mem::take(&mut open)));
            }
            open.push(reading.clone());
            (closed, open)
        },
    );

    closed.extend(ThresholdCluster::from_run(open));
    closed
}

/// Whether any time in the sorted slice lies in [from, to]
pub(crate) fn any_time_within(times: &[DateTime<Utc>], from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    let idx = times.partition_point(|t| *t < from);
    times.get(idx).map_or(false, |t| *t <= to)
}
