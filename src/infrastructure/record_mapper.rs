// Mapper from telemetry API rows to domain records
use crate::domain::telemetry::TelemetryRecord;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Deserialize;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// One row of a machine log as served by the telemetry API.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineLogRow {
    #[serde(rename = "MachineName", default)]
    pub machine_name: Option<String>,
    #[serde(rename = "OPERATION_NAME", default)]
    pub operation_name: Option<String>,
    #[serde(rename = "MACHINE_COUNTER", default)]
    pub machine_counter: Option<i64>,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: Option<String>,
}

/// Parse a timestamp into plant-local time.
///
/// Values carrying an offset are converted to `plant_offset`; naive values are
/// taken as already plant-local.
pub fn parse_timestamp(value: &str, plant_offset: FixedOffset) -> Option<NaiveDateTime> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&plant_offset).naive_local());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

pub fn row_to_record(row: &MachineLogRow, plant_offset: FixedOffset) -> Option<TelemetryRecord> {
    let Some(created_at) = row.created_at.as_deref() else {
        tracing::warn!("Skipping telemetry row without timestamp");
        return None;
    };

    let Some(timestamp) = parse_timestamp(created_at, plant_offset) else {
        tracing::warn!("Skipping telemetry row with unparsable timestamp {:?}", created_at);
        return None;
    };

    let counter = match row.machine_counter.map(u64::try_from) {
        Some(Ok(counter)) => counter,
        Some(Err(_)) => {
            tracing::warn!("Skipping telemetry row at {} with negative counter", created_at);
            return None;
        }
        None => {
            tracing::warn!("Skipping telemetry row at {} without counter", created_at);
            return None;
        }
    };

    Some(TelemetryRecord::new(
        timestamp,
        counter,
        row.operation_name.clone().unwrap_or_default(),
    ))
}

pub fn rows_to_records(rows: &[MachineLogRow], plant_offset: FixedOffset) -> Vec<TelemetryRecord> {
    rows.iter().filter_map(|row| row_to_record(row, plant_offset)).collect()
}
