// Event normalization
// Maps loosely-typed export rows into the strict event types consumed by clustering

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::events::types::{
    checked_offset_by_secs, AnnotationEvent, EventKind, FlowLimitationReading,
};

/// Naive timestamp layouts accepted after RFC 3339 fails
/// Interpreted as UTC
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// One row as produced by the parsing layer (OSCAR-style event export)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEventRow {
    /// Event time, RFC 3339 or naive "YYYY-MM-DD HH:MM:SS"
    #[serde(rename = "DateTime")]
    pub date_time: String,

    /// Event label (e.g. "Obstructive", "ClearAirway", "FLG")
    #[serde(rename = "Event")]
    pub event: String,

    /// Duration in seconds for apneas, level for FLG
    /// Number or numeric string
    #[serde(rename = "Data/Duration", default)]
    pub data: serde_json::Value,
}

impl RawEventRow {
    pub fn new(date_time: impl Into<String>, event: impl Into<String>, data: serde_json::Value) -> Self {
        RawEventRow {
            date_time: date_time.into(),
            event: event.into(),
            data,
        }
    }
}

/// Sorted, typed event streams ready for clustering
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedEvents {
    /// Obstructive/Central/Mixed events, ascending by timestamp
    pub annotations: Vec<AnnotationEvent>,

    /// FLG readings, ascending by timestamp
    pub flg_readings: Vec<FlowLimitationReading>,

    /// Rows with a known label but an unusable timestamp or value
    pub dropped_rows: usize,

    /// Rows whose label is not consumed by this engine (hypopnea, leak, ...)
    pub skipped_rows: usize,
}

/// Normalize raw rows into annotation events and FLG readings
///
/// Rows with unparsable timestamps, non-numeric/non-finite values, negative
/// durations, or durations whose end instant cannot be represented are dropped. Both outputs are stably sorted by timestamp so ties
/// keep input order.
pub fn normalize_rows(rows: &[RawEventRow]) -> NormalizedEvents {
    let mut normalized = NormalizedEvents::default();

    for row in rows {
        let kind = match EventKind::from_label(&row.event) {
            Some(kind) => kind,
            None => {
                normalized.skipped_rows += 1;
                continue;
            }
        };

        let (timestamp, value) = match (parse_timestamp(&row.date_time), parse_value(&row.data)) {
            (Some(timestamp), Some(value)) => (timestamp, value),
            _ => {
                normalized.dropped_rows += 1;
                continue;
            }
        };

        if kind == EventKind::FlowLimitation {
            normalized
                .flg_readings
                .push(FlowLimitationReading::new(timestamp, value));
        } else if value >= 0.0 && checked_offset_by_secs(timestamp, value).is_some() {
            normalized
                .annotations
                .push(AnnotationEvent::new(timestamp, kind, value));
        } else {
            normalized.dropped_rows += 1;
        }
    }

    // Stable sorts: equal timestamps keep input order
    normalized
        .annotations
        .sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    normalized
        .flg_readings
        .sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    if normalized.dropped_rows > 0 {
        log::warn!(
            "Dropped {} malformed event rows during normalization",
            normalized.dropped_rows
        );
    }

    normalized
}

/// Parse an RFC 3339 or naive (UTC) timestamp
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Extract a finite number from a JSON number or numeric string
fn parse_value(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_deserialization_uses_export_headers() {
        let row: RawEventRow = serde_json::from_value(json!({
            "DateTime": "2024-01-15 23:14:05",
            "Event": "Obstructive",
            "Data/Duration": "12.5"
        }))
        .unwrap();

        assert_eq!(row.event, "Obstructive");
        assert_eq!(row.data, json!("12.5"));
    }

    #[test]
    fn test_missing_data_field_defaults_to_null() {
        let row: RawEventRow = serde_json::from_value(json!({
            "DateTime": "2024-01-15 23:14:05",
            "Event": "FLG"
        }))
        .unwrap();

        assert!(row.data.is_null());
        let normalized = normalize_rows(&[row]);
        assert!(normalized.flg_readings.is_empty());
        assert_eq!(normalized.dropped_rows, 1);
    }

    #[test]
    fn test_splits_annotations_and_flg() {
        let rows = vec![
            RawEventRow::new("2024-01-15 23:14:05", "Obstructive", json!(12.5)),
            RawEventRow::new("2024-01-15 23:14:00", "FLG", json!("0.4")),
            RawEventRow::new("2024-01-15 23:15:00", "ClearAirway", json!(10)),
            RawEventRow::new("2024-01-15 23:16:00", "Hypopnea", json!(15)),
        ];

        let normalized = normalize_rows(&rows);

        assert_eq!(normalized.annotations.len(), 2);
        assert_eq!(normalized.annotations[0].kind, EventKind::Obstructive);
        assert_eq!(normalized.annotations[1].kind, EventKind::Central);
        assert_eq!(normalized.flg_readings.len(), 1);
        assert_eq!(normalized.flg_readings[0].level, 0.4);
        assert_eq!(normalized.skipped_rows, 1);
        assert_eq!(normalized.dropped_rows, 0);
    }

    #[test]
    fn test_drops_malformed_rows() {
        let rows = vec![
            RawEventRow::new("not a date", "Obstructive", json!(10)),
            RawEventRow::new("2024-01-15 23:14:05", "Obstructive", json!("abc")),
            RawEventRow::new("2024-01-15 23:14:05", "Mixed", json!(-3.0)),
            RawEventRow::new("2024-01-15 23:14:05", "FLG", json!(null)),
            RawEventRow::new("2024-01-15 23:14:05", "FLG", json!("NaN")),
            RawEventRow::new("2024-01-15 23:14:05", "FLG", json!(1.4)),
        ];

        let normalized = normalize_rows(&rows);

        assert!(normalized.annotations.is_empty());
        // Out-of-range levels are kept as-is
        assert_eq!(normalized.flg_readings.len(), 1);
        assert_eq!(normalized.flg_readings[0].level, 1.4);
        assert_eq!(normalized.dropped_rows, 5);
    }

    #[test]
    fn test_drops_unrepresentable_duration() {
        let rows = vec![
            RawEventRow::new("2024-01-15 23:00:00", "Obstructive", json!(1e13)),
            RawEventRow::new("2024-01-15 23:01:00", "Obstructive", json!(10)),
            RawEventRow::new("2024-01-15 23:02:00", "Central", json!(1e300)),
        ];

        let normalized = normalize_rows(&rows);

        assert_eq!(normalized.annotations.len(), 1);
        assert_eq!(normalized.annotations[0].duration_sec, 10.0);
        assert_eq!(normalized.dropped_rows, 2);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let rows = vec![
            RawEventRow::new("2024-01-15T23:20:00Z", "Mixed", json!(10)),
            RawEventRow::new("2024-01-15T23:10:00Z", "Central", json!(11)),
            RawEventRow::new("2024-01-15T23:10:00Z", "Obstructive", json!(12)),
        ];

        let normalized = normalize_rows(&rows);
        let kinds: Vec<EventKind> = normalized.annotations.iter().map(|e| e.kind).collect();

        assert_eq!(
            kinds,
            vec![EventKind::Central, EventKind::Obstructive, EventKind::Mixed]
        );
    }

    #[test]
    fn test_timestamp_formats() {
        let rfc = parse_timestamp("2024-01-15T23:14:05+01:00").unwrap();
        let naive = parse_timestamp("2024-01-15 22:14:05").unwrap();
        let naive_t = parse_timestamp("2024-01-15T22:14:05").unwrap();
        let fractional = parse_timestamp("2024-01-15 22:14:05.500").unwrap();

        assert_eq!(rfc, naive);
        assert_eq!(naive, naive_t);
        assert_eq!((fractional - naive).num_milliseconds(), 500);
        assert!(parse_timestamp("15/01/2024").is_none());
    }
}
