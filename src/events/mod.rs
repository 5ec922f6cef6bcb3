// Event model module
// Typed respiratory events and the adapter that produces them from export rows

pub mod normalize;
pub mod types;

pub use normalize::{normalize_rows, parse_timestamp, NormalizedEvents, RawEventRow};
pub use types::{
    checked_offset_by_secs, offset_by_secs, seconds_between, AnnotationEvent, EventKind, FlowLimitationReading,
};
