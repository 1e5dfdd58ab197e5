// Carry-over state lookup
use crate::domain::telemetry::{TelemetryRecord, sorted_up_to};
use chrono::NaiveDateTime;

/// Latest record seen before a shift's first hour.
///
/// Scans the history in time order and stops at the first record whose clock
/// hour is the shift's start hour. Records after `as_of` are ignored.
pub fn latest_before(
    records: &[TelemetryRecord],
    shift_start_hour: u32,
    as_of: NaiveDateTime,
) -> Option<&TelemetryRecord> {
    let mut latest = None;

    for record in sorted_up_to(records, as_of) {
        if record.hour() == shift_start_hour {
            break;
        }
        latest = Some(record);
    }

    latest
}
