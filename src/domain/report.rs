// Machine shift report domain model
use super::production::HourlyProduction;
use super::rollup::ProductionRollup;
use super::shift::ShiftPhase;
use super::telemetry::TelemetryRecord;
use super::timeline::TimelineSegment;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReport {
    pub name: String,
    pub start_hour: u32,
    pub end_hour: u32,
    pub phase: ShiftPhase,
    pub hour_labels: Vec<String>,
    pub hourly_production: HourlyProduction,
    pub segments: Vec<TimelineSegment>,
    /// Live clock marker, only while the shift is running inside production hours.
    pub now_marker_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineReport {
    pub machine_code: String,
    pub machine_name: Option<String>,
    pub generated_at: NaiveDateTime,
    pub day_progress_pct: f64,
    pub latest_record: Option<TelemetryRecord>,
    pub shifts: Vec<ShiftReport>,
    pub daily: ProductionRollup,
    pub weekly: ProductionRollup,
}

impl MachineReport {
    pub fn shift(&self, name: &str) -> Option<&ShiftReport> {
        self.shifts.iter().find(|s| s.name == name)
    }
}
