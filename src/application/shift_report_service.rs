// Shift report service - Use case for building a machine's shift reports
use crate::application::telemetry_repository::{MachineLog, TelemetryRepository};
use crate::domain::position::time_position;
use crate::domain::prior_state::latest_before;
use crate::domain::production::bucketize;
use crate::domain::report::{MachineReport, ShiftReport};
use crate::domain::rollup::{daily_rollup, weekday_rollup};
use crate::domain::shift::{
    ShiftDefinition, ShiftPhase, classify, day_progress, group_by_shift, merge_history, within_production_hours,
};
use crate::domain::telemetry::TelemetryRecord;
use crate::domain::timeline::build_segments;
use crate::infrastructure::config::EngineSettings;
use anyhow::Context;
use chrono::{Duration, NaiveDateTime, Timelike};
use std::sync::Arc;

/// How far back the carry-over lookup reaches before a shift starts.
///
/// Shorter than a day so the previous day's start hour never ends the scan early.
const CARRY_OVER_LOOKBACK_HOURS: i64 = 23;

#[derive(Clone)]
pub struct ShiftReportService {
    repository: Arc<dyn TelemetryRepository>,
    shifts: Vec<ShiftDefinition>,
    engine: EngineSettings,
    record_limit: usize,
}

impl ShiftReportService {
    pub fn new(
        repository: Arc<dyn TelemetryRepository>,
        shifts: Vec<ShiftDefinition>,
        engine: EngineSettings,
        record_limit: usize,
    ) -> Self {
        Self {
            repository,
            shifts,
            engine,
            record_limit,
        }
    }

    pub fn shifts(&self) -> &[ShiftDefinition] {
        &self.shifts
    }

    pub async fn list_machines(&self) -> anyhow::Result<Vec<String>> {
        self.repository.list_machine_codes().await
    }

    pub async fn build_report(&self, machine_code: &str, now: NaiveDateTime) -> anyhow::Result<MachineReport> {
        let log = self
            .repository
            .fetch_machine_log(machine_code, self.record_limit)
            .await
            .with_context(|| format!("Failed to fetch telemetry for machine {}", machine_code))?;

        tracing::debug!(
            "Building shift report for machine {} from {} records at {}",
            machine_code,
            log.records.len(),
            now
        );

        Ok(self.assemble_report(log, now))
    }

    /// Turn a telemetry snapshot into a report. Pure over its inputs.
    pub fn assemble_report(&self, log: MachineLog, now: NaiveDateTime) -> MachineReport {
        let groups = group_by_shift(&log.records, &self.shifts);
        let history = merge_history(&groups);

        let shifts = self
            .shifts
            .iter()
            .zip(&groups)
            .map(|(shift, group)| self.shift_report(shift, group, &history, now))
            .collect();

        let latest_record = log
            .records
            .iter()
            .filter(|r| r.timestamp <= now)
            .max_by_key(|r| r.timestamp)
            .cloned();

        MachineReport {
            machine_code: log.machine_code,
            machine_name: log.machine_name,
            generated_at: now,
            day_progress_pct: day_progress(now, self.engine.standard_start_hour),
            latest_record,
            shifts,
            daily: daily_rollup(&log.records, self.engine.rollup_days, now, self.engine.daily_target),
            weekly: weekday_rollup(&log.records, now, self.engine.daily_target),
        }
    }

    fn shift_report(
        &self,
        shift: &ShiftDefinition,
        group: &[TelemetryRecord],
        history: &[TelemetryRecord],
        now: NaiveDateTime,
    ) -> ShiftReport {
        let status = classify(shift, now);
        let (start_hour, end_hour) = (shift.start_hour(), shift.end_hour());

        let mut report = ShiftReport {
            name: shift.name().to_string(),
            start_hour,
            end_hour,
            phase: status.phase(),
            hour_labels: shift.hour_labels(),
            hourly_production: vec![0; shift.hour_marks().len()],
            segments: Vec::new(),
            now_marker_pct: None,
        };

        if report.phase == ShiftPhase::NotStarted {
            return report;
        }

        // Only the latest run of the shift; older days share the same clock window
        let (from, to) = shift.latest_occurrence(now);
        let current: Vec<TelemetryRecord> = group
            .iter()
            .filter(|r| r.timestamp >= from && r.timestamp < to)
            .cloned()
            .collect();

        let lookback = from - Duration::hours(CARRY_OVER_LOOKBACK_HOURS);
        let before_shift: Vec<TelemetryRecord> = history
            .iter()
            .filter(|r| r.timestamp >= lookback && r.timestamp < from)
            .cloned()
            .collect();
        let prior = latest_before(&before_shift, start_hour, now);

        report.hourly_production = bucketize(&current, shift.hour_marks(), now, self.engine.counter_decrease);
        report.segments = build_segments(&current, prior, start_hour, end_hour, status.active, now);

        if status.active && within_production_hours(now, self.engine.standard_start_hour) {
            report.now_marker_pct = Some(time_position(now.hour(), now.minute(), start_hour, end_hour));
        }

        report
    }
}
