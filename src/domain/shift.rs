// Shift definitions and shift window resolution
use crate::domain::position::{decimal_hour, in_window, occurrence_start, shift_length};
use crate::domain::telemetry::TelemetryRecord;
use chrono::{Duration, NaiveDateTime, Timelike};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShiftDefinitionError {
    #[error("shift '{0}' needs at least two hour marks")]
    TooFewMarks(String),
    #[error("shift '{name}' has hour mark {mark} outside 0..24")]
    HourOutOfRange { name: String, mark: u32 },
    #[error("shift '{0}' starts and ends on the same hour")]
    EmptyWindow(String),
}

/// A recurring daily shift and the hour boundaries its production is reported on.
///
/// The first and last marks are the nominal start and end hours. A last mark
/// smaller than the first means the shift crosses midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDefinition {
    name: String,
    hour_marks: Vec<u32>,
}

impl ShiftDefinition {
    pub fn new(name: impl Into<String>, hour_marks: Vec<u32>) -> Result<Self, ShiftDefinitionError> {
        let name = name.into();

        if hour_marks.len() < 2 {
            return Err(ShiftDefinitionError::TooFewMarks(name));
        }
        if let Some(&mark) = hour_marks.iter().find(|&&m| m >= 24) {
            return Err(ShiftDefinitionError::HourOutOfRange { name, mark });
        }
        if hour_marks.first() == hour_marks.last() {
            return Err(ShiftDefinitionError::EmptyWindow(name));
        }

        Ok(Self { name, hour_marks })
    }

    /// One mark per hour from `start_hour` to `end_hour`, wrapping past midnight.
    pub fn spanning(name: impl Into<String>, start_hour: u32, end_hour: u32) -> Result<Self, ShiftDefinitionError> {
        let name = name.into();
        if start_hour >= 24 || end_hour >= 24 {
            return Err(ShiftDefinitionError::HourOutOfRange {
                name,
                mark: start_hour.max(end_hour),
            });
        }

        let mut marks = vec![start_hour];
        let mut hour = start_hour;
        while hour != end_hour {
            hour = (hour + 1) % 24;
            marks.push(hour);
        }

        Self::new(name, marks)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hour_marks(&self) -> &[u32] {
        &self.hour_marks
    }

    pub fn start_hour(&self) -> u32 {
        self.hour_marks[0]
    }

    pub fn end_hour(&self) -> u32 {
        self.hour_marks[self.hour_marks.len() - 1]
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end_hour() < self.start_hour()
    }

    /// Whether a clock time falls inside `[start, end)` of this shift.
    pub fn contains(&self, hour: u32, minute: u32) -> bool {
        in_window(hour, minute, self.start_hour(), self.end_hour())
    }

    /// Start and end of the latest occurrence of this shift that began at or before `now`.
    pub fn latest_occurrence(&self, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        let start = occurrence_start(now, self.start_hour());
        let length = shift_length(self.start_hour(), self.end_hour()) as i64;
        (start, start + Duration::hours(length))
    }

    pub fn hour_labels(&self) -> Vec<String> {
        self.hour_marks.iter().map(|h| format!("{:02}:00", h)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShiftStatus {
    pub started: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftPhase {
    NotStarted,
    Active,
    Completed,
}

impl ShiftStatus {
    pub fn phase(&self) -> ShiftPhase {
        if self.active {
            ShiftPhase::Active
        } else if self.started {
            ShiftPhase::Completed
        } else {
            ShiftPhase::NotStarted
        }
    }
}

/// Classify a shift against the current time.
///
/// A shift is started from the first minute of its start hour, with no grace
/// period. Inside the window it is always started, so a night shift stays
/// started after midnight.
pub fn classify(shift: &ShiftDefinition, now: NaiveDateTime) -> ShiftStatus {
    let (hour, minute) = (now.hour(), now.minute());
    let active = shift.contains(hour, minute);
    let started = active || hour >= shift.start_hour();

    ShiftStatus { started, active }
}

/// Whether the current time is at or past the production day's standard start.
pub fn within_production_hours(now: NaiveDateTime, standard_start_hour: u32) -> bool {
    now.hour() >= standard_start_hour
}

/// Share of the 24 hour production day elapsed since `standard_start_hour`.
pub fn day_progress(now: NaiveDateTime, standard_start_hour: u32) -> f64 {
    if !within_production_hours(now, standard_start_hour) {
        return 0.0;
    }

    let elapsed = decimal_hour(now.hour(), now.minute()) - standard_start_hour as f64;
    (elapsed / 24.0 * 100.0).min(100.0)
}

/// Split a machine's history into per-shift groups, aligned with `shifts`.
///
/// A record goes to the first shift whose window contains its clock time.
pub fn group_by_shift(records: &[TelemetryRecord], shifts: &[ShiftDefinition]) -> Vec<Vec<TelemetryRecord>> {
    let mut groups = vec![Vec::new(); shifts.len()];

    for record in records {
        match shifts.iter().position(|s| s.contains(record.hour(), record.minute())) {
            Some(idx) => groups[idx].push(record.clone()),
            None => tracing::trace!("record at {} matches no shift window", record.timestamp),
        }
    }

    groups
}

/// Flatten grouped records back into one history.
pub fn merge_history(groups: &[Vec<TelemetryRecord>]) -> Vec<TelemetryRecord> {
    groups.iter().flat_map(|g| g.iter().cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::fixtures::{at, record};

    fn day_shift() -> ShiftDefinition {
        ShiftDefinition::spanning("Shift 1", 7, 15).unwrap()
    }

    fn night_shift() -> ShiftDefinition {
        ShiftDefinition::spanning("Shift 3", 22, 6).unwrap()
    }

    #[test]
    fn test_spanning_generates_marks() {
        assert_eq!(day_shift().hour_marks(), &[7, 8, 9, 10, 11, 12, 13, 14, 15]);
        assert_eq!(night_shift().hour_marks(), &[22, 23, 0, 1, 2, 3, 4, 5, 6]);
        assert!(night_shift().crosses_midnight());
        assert_eq!(night_shift().hour_labels()[2], "00:00");
    }

    #[test]
    fn test_latest_occurrence() {
        let (start, end) = night_shift().latest_occurrence(at(2, 2, 0));
        assert_eq!(start, at(1, 22, 0));
        assert_eq!(end, at(2, 6, 0));

        let (start, end) = day_shift().latest_occurrence(at(2, 6, 30));
        assert_eq!(start, at(1, 7, 0));
        assert_eq!(end, at(1, 15, 0));
    }

    #[test]
    fn test_definition_validation() {
        assert_eq!(
            ShiftDefinition::new("a", vec![7]),
            Err(ShiftDefinitionError::TooFewMarks("a".to_string()))
        );
        assert!(matches!(
            ShiftDefinition::new("b", vec![7, 25]),
            Err(ShiftDefinitionError::HourOutOfRange { mark: 25, .. })
        ));
        assert_eq!(
            ShiftDefinition::new("c", vec![7, 8, 7]),
            Err(ShiftDefinitionError::EmptyWindow("c".to_string()))
        );
    }

    #[test]
    fn test_classify_day_shift() {
        let shift = day_shift();

        let before = classify(&shift, at(1, 6, 30));
        assert_eq!(before.phase(), ShiftPhase::NotStarted);

        let start = classify(&shift, at(1, 7, 0));
        assert!(start.started && start.active);

        let after = classify(&shift, at(1, 16, 0));
        assert_eq!(after.phase(), ShiftPhase::Completed);
    }

    #[test]
    fn test_classify_night_shift_after_midnight() {
        let status = classify(&night_shift(), at(2, 2, 0));
        assert!(status.started);
        assert!(status.active);
    }

    #[test]
    fn test_early_shift_is_completed_after_it_ends() {
        let early = ShiftDefinition::spanning("Early", 6, 14).unwrap();
        assert_eq!(classify(&early, at(1, 15, 0)).phase(), ShiftPhase::Completed);
        assert_eq!(classify(&early, at(1, 5, 59)).phase(), ShiftPhase::NotStarted);
    }

    #[test]
    fn test_night_shift_before_its_start_hour() {
        let status = classify(&night_shift(), at(2, 7, 0));
        assert_eq!(status.phase(), ShiftPhase::NotStarted);

        let status = classify(&night_shift(), at(2, 22, 0));
        assert_eq!(status.phase(), ShiftPhase::Active);
    }

    #[test]
    fn test_day_progress() {
        assert_eq!(day_progress(at(1, 6, 0), 7), 0.0);
        assert_eq!(day_progress(at(1, 13, 0), 7), 25.0);
        assert!(within_production_hours(at(1, 7, 0), 7));
    }

    #[test]
    fn test_group_by_shift() {
        let shifts = vec![day_shift(), ShiftDefinition::spanning("Shift 2", 15, 22).unwrap(), night_shift()];
        let records = vec![
            record(1, 7, 5, 1, "Normal Operation"),
            record(1, 15, 0, 2, "Normal Operation"),
            record(1, 23, 0, 3, "Warning"),
            record(2, 5, 59, 4, "Warning"),
        ];

        let groups = group_by_shift(&records, &shifts);
        assert_eq!(groups[0].len(), 1);
        assert_eq!(groups[1].len(), 1);
        assert_eq!(groups[2].len(), 2);
        assert_eq!(merge_history(&groups).len(), 4);
    }
}
