// Telemetry record domain model
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Sentinel state used when no telemetry covers a stretch of the shift.
pub const SIGNAL_LOSS: &str = "SIGNAL LOSS";

/// One sampled observation of a machine.
///
/// `timestamp` is plant-local wall-clock time; the infrastructure layer
/// converts absolute instants before records reach the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub timestamp: NaiveDateTime,
    pub counter: u64,
    pub operation_state: String,
}

impl TelemetryRecord {
    pub fn new(timestamp: NaiveDateTime, counter: u64, operation_state: impl Into<String>) -> Self {
        Self {
            timestamp,
            counter,
            operation_state: operation_state.into(),
        }
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    pub fn minute(&self) -> u32 {
        self.timestamp.minute()
    }
}

/// Visual tier a timeline segment is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Success,
    Warning,
    Danger,
    Info,
    Neutral,
}

/// Map an operation state label to its color tier.
pub fn color_tag(operation_state: &str) -> ColorTag {
    let state = operation_state.trim();
    if state.is_empty() {
        return ColorTag::Neutral;
    }

    match state.to_uppercase().as_str() {
        "NORMAL OPERATION" => ColorTag::Success,
        "CHOKOTEI" => ColorTag::Warning,
        "WARNING" => ColorTag::Danger,
        _ => ColorTag::Info,
    }
}

/// Sort a borrowed view of `records` by timestamp, dropping anything after `as_of`.
///
/// The caller's collection is left untouched.
pub fn sorted_up_to<'a>(records: &'a [TelemetryRecord], as_of: NaiveDateTime) -> Vec<&'a TelemetryRecord> {
    let mut sorted: Vec<&TelemetryRecord> = records.iter().filter(|r| r.timestamp <= as_of).collect();
    sorted.sort_by_key(|r| r.timestamp);
    sorted
}


#[cfg(test)]
mod tests {
    use super::fixtures::{at, record};
    use super::*;

    #[test]
    fn test_color_tag_table() {
        assert_eq!(color_tag("Normal Operation"), ColorTag::Success);
        assert_eq!(color_tag("NORMAL OPERATION"), ColorTag::Success);
        assert_eq!(color_tag("Chokotei"), ColorTag::Warning);
        assert_eq!(color_tag("Warning"), ColorTag::Danger);
        assert_eq!(color_tag("Setup"), ColorTag::Info);
        assert_eq!(color_tag(""), ColorTag::Neutral);
        assert_eq!(color_tag("   "), ColorTag::Neutral);
    }

    #[test]
    fn test_sorted_up_to_filters_future_and_keeps_input() {
        let records = vec![
            record(1, 9, 0, 30, "Normal Operation"),
            record(1, 7, 0, 10, "Normal Operation"),
            record(1, 8, 0, 20, "Warning"),
        ];

        let sorted = sorted_up_to(&records, at(1, 8, 30));
        let counters: Vec<u64> = sorted.iter().map(|r| r.counter).collect();
        assert_eq!(counters, vec![10, 20]);

        // Caller order is untouched
        assert_eq!(records[0].counter, 30);
    }
}
