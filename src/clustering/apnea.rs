// Apnea event clustering
// Groups annotated apneas by time adjacency and FLG bridging, then widens
// cluster boundaries using sustained high-level FLG edge clusters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::threshold::{any_time_within, build_clusters, ThresholdCluster};
use crate::config::{BridgeGate, EdgeSelection, EngineConfig};
use crate::events::types::{seconds_between, AnnotationEvent, FlowLimitationReading};

/// A group of annotated apneas treated as one respiratory disturbance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApneaCluster {
    /// Cluster onset (may precede the first event after edge extension)
    pub start: DateTime<Utc>,

    /// Cluster offset (may follow the last event's end after edge extension)
    pub end: DateTime<Utc>,

    /// end - start in seconds
    pub duration_sec: f64,

    /// Number of member events
    pub count: usize,

    /// Member events, ascending by timestamp
    pub events: Vec<AnnotationEvent>,
}

impl ApneaCluster {
    /// Sum of member event durations in seconds
    pub fn total_event_duration_sec(&self) -> f64 {
        self.events.iter().map(|e| e.duration_sec).sum()
    }
}

/// Counters describing one clustering pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusteringStats {
    pub bridge_clusters: usize,
    pub valid_edges: usize,
    pub bridged_merges: usize,
    pub extended_starts: usize,
    pub extended_ends: usize,
}

/// Cluster annotated apnea events
///
/// Returns raw (unvalidated) clusters ordered by start.
pub fn cluster_apnea_events(
    annotations: &[AnnotationEvent],
    flg_readings: &[FlowLimitationReading],
    config: &EngineConfig,
) -> Vec<ApneaCluster> {
    cluster_apnea_events_with_stats(annotations, flg_readings, config).0
}

/// Cluster annotated apnea events and report pass counters
///
/// Algorithm:
/// 1. Bridge clusters: FLG >= bridge_threshold, gap <= bridge_gap_sec
/// 2. Edge clusters: FLG >= edge_threshold, gap <= bridge_gap_sec,
///    span >= edge_min_duration_sec
/// 3. Fold events into groups; the next event joins when the gap from the
///    previous event's end is <= gap_sec, or a bridge reading lies inside
///    that gap (subject to the configured bridge gate)
/// 4. Build each cluster from its group and extend its boundaries with
///    adjacent edge clusters within gap_sec
pub fn cluster_apnea_events_with_stats(
    annotations: &[AnnotationEvent],
    flg_readings: &[FlowLimitationReading],
    config: &EngineConfig,
) -> (Vec<ApneaCluster>, ClusteringStats) {
    let mut stats = ClusteringStats::default();

    // Step 1: bridge evidence, flattened into sorted reading times
    let bridge_clusters = build_clusters(flg_readings, config.bridge_threshold, config.bridge_gap_sec);
    stats.bridge_clusters = bridge_clusters.len();
    let bridge_times: Vec<DateTime<Utc>> = bridge_clusters
        .iter()
        .flat_map(|c| c.readings.iter().map(|r| r.timestamp))
        .collect();

    // Step 2: edge clusters long enough to prove boundary extension
    let valid_edges: Vec<ThresholdCluster> =
        build_clusters(flg_readings, config.edge_threshold, config.bridge_gap_sec)
            .into_iter()
            .filter(|c| c.duration_sec() >= config.edge_min_duration_sec)
            .collect();
    stats.valid_edges = valid_edges.len();

    // Step 3: group events
    let mut events: Vec<&AnnotationEvent> =
        annotations.iter().filter(|e| e.kind.is_apnea()).collect();
    events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let (mut groups, open) = events.into_iter().fold(
        (Vec::<Vec<AnnotationEvent>>::new(), Vec::<AnnotationEvent>::new()),
        |(mut groups, mut open), event| {
            let link = open
                .last()
                .map_or(Link::Direct, |prev| link_events(prev, event, &bridge_times, config));
            match link {
                Link::Direct => {}
                Link::Bridged => stats.bridged_merges += 1,
                Link::Broken => groups.push(std::mem::take(&mut open)),
            }
            open.push(event.clone());
            (groups, open)
        },
    );
    if !open.is_empty() {
        groups.push(open);
    }

    // Steps 4-6: boundaries and extension
    let mut clusters: Vec<ApneaCluster> = groups
        .into_iter()
        .filter_map(|group| build_cluster(group, &valid_edges, config, &mut stats))
        .collect();

    // Extension can move a start before an earlier cluster's start
    clusters.sort_by(|a, b| a.start.cmp(&b.start));

    log::debug!(
        "Apnea clustering: {} clusters, {} bridge clusters, {} valid edges, {} bridged merges",
        clusters.len(),
        stats.bridge_clusters,
        stats.valid_edges,
        stats.bridged_merges
    );

    (clusters, stats)
}

/// How an event relates to the open group's last event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Direct,
    Bridged,
    Broken,
}

fn link_events(
    prev: &AnnotationEvent,
    next: &AnnotationEvent,
    bridge_times: &[DateTime<Utc>],
    config: &EngineConfig,
) -> Link {
    let prev_end = prev.end();
    let gap = seconds_between(prev_end, next.timestamp);

    if gap <= config.gap_sec {
        return Link::Direct;
    }

    let gate_open = match config.bridge_gate {
        BridgeGate::EvidenceOnly => true,
        BridgeGate::WithinBridgeGap => gap <= config.bridge_gap_sec,
    };

    if gate_open && any_time_within(bridge_times, prev_end, next.timestamp) {
        Link::Bridged
    } else {
        Link::Broken
    }
}

fn build_cluster(
    events: Vec<AnnotationEvent>,
    valid_edges: &[ThresholdCluster],
    config: &EngineConfig,
    stats: &mut ClusteringStats,
) -> Option<ApneaCluster> {
    let mut start = events.first()?.timestamp;
    let mut end = events.last()?.end();

    if let Some(edge) = edge_before(valid_edges, start, config) {
        start = edge.start;
        stats.extended_starts += 1;
    }
    if let Some(edge) = edge_after(valid_edges, end, config) {
        end = edge.end;
        stats.extended_ends += 1;
    }

    Some(ApneaCluster {
        start,
        end,
        duration_sec: seconds_between(start, end),
        count: events.len(),
        events,
    })
}

/// Edge cluster ending at or before `start`, no more than gap_sec earlier
///
/// Edge clusters are disjoint and chronological, so both start and end times
/// increase along the slice and binary search finds the same cluster a
/// linear scan would.
fn edge_before<'a>(
    edges: &'a [ThresholdCluster],
    start: DateTime<Utc>,
    config: &EngineConfig,
) -> Option<&'a ThresholdCluster> {
    let candidate = match config.edge_selection {
        EdgeSelection::FirstMatch => {
            let idx = edges.partition_point(|c| seconds_between(c.end, start) > config.gap_sec);
            edges.get(idx)
        }
        EdgeSelection::Nearest => {
            let idx = edges.partition_point(|c| c.end <= start);
            idx.checked_sub(1).and_then(|i| edges.get(i))
        }
    };

    candidate.filter(|c| c.end <= start && seconds_between(c.end, start) <= config.gap_sec)
}

/// Edge cluster starting at or after `end`, no more than gap_sec later
/// The first such cluster is also the nearest one
fn edge_after<'a>(
    edges: &'a [ThresholdCluster],
    end: DateTime<Utc>,
    config: &EngineConfig,
) -> Option<&'a ThresholdCluster> {
    let idx = edges.partition_point(|c| c.start < end);
    edges
        .get(idx)
        .filter(|c| seconds_between(end, c.start) <= config.gap_sec)
}
