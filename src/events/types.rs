// Event model types
// Defines respiratory event kinds, annotated apnea events, and flow-limitation readings

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a normalized respiratory event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Obstructive apnea - airway collapse with continued effort
    Obstructive,

    /// Central apnea (reported as "ClearAirway" by most devices)
    /// Airway open, no respiratory effort
    Central,

    /// Mixed apnea - central onset followed by obstructive component
    Mixed,

    /// Continuous flow-limitation (FLG) sample, not an annotated event
    FlowLimitation,
}

impl EventKind {
    /// Parse a device/export label
    /// Accepts the long names and the common two-letter abbreviations
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "Obstructive" | "ObstructiveApnea" | "OA" => Some(EventKind::Obstructive),
            "ClearAirway" | "Central" | "CentralApnea" | "CA" => Some(EventKind::Central),
            "Mixed" | "MixedApnea" | "MA" => Some(EventKind::Mixed),
            "FLG" | "FlowLimitation" | "FL" => Some(EventKind::FlowLimitation),
            _ => None,
        }
    }

    /// Canonical label (PascalCase, matches serde representation)
    pub fn to_string(&self) -> &'static str {
        match self {
            EventKind::Obstructive => "Obstructive",
            EventKind::Central => "Central",
            EventKind::Mixed => "Mixed",
            EventKind::FlowLimitation => "FlowLimitation",
        }
    }

    /// Whether this kind is a device-annotated apnea
    pub fn is_apnea(&self) -> bool {
        matches!(
            self,
            EventKind::Obstructive | EventKind::Central | EventKind::Mixed
        )
    }
}

/// A device-flagged apnea occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationEvent {
    /// Event onset
    pub timestamp: DateTime<Utc>,

    /// Apnea kind (never FlowLimitation)
    pub kind: EventKind,

    /// Event duration in seconds, >= 0
    pub duration_sec: f64,
}

impl AnnotationEvent {
    pub fn new(timestamp: DateTime<Utc>, kind: EventKind, duration_sec: f64) -> Self {
        AnnotationEvent {
            timestamp,
            kind,
            duration_sec,
        }
    }

    /// Onset plus duration
    pub fn end(&self) -> DateTime<Utc> {
        offset_by_secs(self.timestamp, self.duration_sec)
    }
}

/// A single flow-limitation signal sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLimitationReading {
    /// Sample time
    pub timestamp: DateTime<Utc>,

    /// Fractional flow-limitation grade
    /// Typically [0.0, 1.0] but not clamped
    pub level: f64,
}

impl FlowLimitationReading {
    pub fn new(timestamp: DateTime<Utc>, level: f64) -> Self {
        FlowLimitationReading { timestamp, level }
    }
}

/// Signed seconds from `from` to `to`
/// Nanosecond resolution; spans past ~292 years fall back to milliseconds
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}

/// Shift an instant by a fractional number of seconds
/// None when the offset is not finite or the result leaves chrono's range
pub fn checked_offset_by_secs(t: DateTime<Utc>, secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }

    let nanos = secs * 1e9;
    let delta = if nanos.abs() < i64::MAX as f64 {
        TimeDelta::nanoseconds(nanos.round() as i64)
    } else {
        let millis = secs * 1000.0;
        if millis.abs() >= i64::MAX as f64 {
            return None;
        }
        TimeDelta::try_milliseconds(millis.round() as i64)?
    };

    t.checked_add_signed(delta)
}

/// Shift an instant, saturating at the representable bounds
pub fn offset_by_secs(t: DateTime<Utc>, secs: f64) -> DateTime<Utc> {
    checked_offset_by_secs(t, secs).unwrap_or(if secs < 0.0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_kind_label_parsing() {
        assert_eq!(EventKind::from_label("ClearAirway"), Some(EventKind::Central));
        assert_eq!(EventKind::from_label("OA"), Some(EventKind::Obstructive));
        assert_eq!(EventKind::from_label(" Mixed "), Some(EventKind::Mixed));
        assert_eq!(EventKind::from_label("FLG"), Some(EventKind::FlowLimitation));
        assert_eq!(EventKind::from_label("Hypopnea"), None);
    }

    #[test]
    fn test_kind_label_round_trip() {
        let kind = EventKind::Central;
        assert_eq!(EventKind::from_label(kind.to_string()), Some(kind));
    }

    #[test]
    fn test_only_apneas_are_annotations() {
        assert!(EventKind::Obstructive.is_apnea());
        assert!(EventKind::Central.is_apnea());
        assert!(EventKind::Mixed.is_apnea());
        assert!(!EventKind::FlowLimitation.is_apnea());
    }

    #[test]
    fn test_annotation_end() {
        let event = AnnotationEvent::new(at(0), EventKind::Obstructive, 20.5);
        assert_eq!(seconds_between(event.timestamp, event.end()), 20.5);
    }

    #[test]
    fn test_seconds_between_is_signed() {
        assert_eq!(seconds_between(at(10), at(4)), -6.0);
        assert_eq!(seconds_between(at(4), at(10)), 6.0);
    }

    #[test]
    fn test_seconds_between_keeps_sub_millisecond_part() {
        let later = at(120) + TimeDelta::microseconds(900);
        assert!(seconds_between(at(0), later) > 120.0);
        assert!((seconds_between(at(0), later) - 120.0009).abs() < 1e-9);
    }

    #[test]
    fn test_offset_saturates_instead_of_overflowing() {
        assert_eq!(checked_offset_by_secs(at(0), 1e13), None);
        assert_eq!(checked_offset_by_secs(at(0), f64::INFINITY), None);
        assert_eq!(offset_by_secs(at(0), 1e13), DateTime::<Utc>::MAX_UTC);
        assert_eq!(offset_by_secs(at(0), -1e13), DateTime::<Utc>::MIN_UTC);
        assert_eq!(checked_offset_by_secs(at(0), 1.5), Some(at(0) + TimeDelta::milliseconds(1500)));
    }
}
