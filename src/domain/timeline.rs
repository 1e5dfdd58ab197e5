// Shift timeline reconstruction
use crate::domain::position::{in_window, occurrence_start, time_position};
use crate::domain::telemetry::{ColorTag, SIGNAL_LOSS, TelemetryRecord, color_tag};
use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

/// A contiguous stretch of the shift timeline held in one operation state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSegment {
    pub start_pct: f64,
    pub end_pct: f64,
    pub operation_state: String,
    pub counter_at_segment: u64,
    pub color_tag: ColorTag,
}

impl TimelineSegment {
    pub fn new(start_pct: f64, end_pct: f64, operation_state: impl Into<String>, counter_at_segment: u64) -> Self {
        let operation_state = operation_state.into();
        let color_tag = color_tag(&operation_state);
        Self {
            start_pct,
            end_pct,
            operation_state,
            counter_at_segment,
            color_tag,
        }
    }

    pub fn signal_loss(start_pct: f64, end_pct: f64) -> Self {
        Self {
            start_pct,
            end_pct,
            operation_state: SIGNAL_LOSS.to_string(),
            counter_at_segment: 0,
            color_tag: ColorTag::Danger,
        }
    }

    pub fn no_status(start_pct: f64, end_pct: f64) -> Self {
        Self::new(start_pct, end_pct, "", 0)
    }

    fn continuing(&self, start_pct: f64, end_pct: f64) -> Self {
        Self {
            start_pct,
            end_pct,
            ..self.clone()
        }
    }

    pub fn width(&self) -> f64 {
        self.end_pct - self.start_pct
    }
}

/// What the segmenter has to work with for one shift.
enum TimelineInput<'a> {
    NoData,
    CarryOverOnly(&'a TelemetryRecord),
    RecordsPresent {
        records: Vec<&'a TelemetryRecord>,
        prior: Option<&'a TelemetryRecord>,
    },
}

/// Shift window and live clock, projected onto the 0..100 axis.
struct Frame {
    start_hour: u32,
    end_hour: u32,
    is_active: bool,
    now: NaiveDateTime,
}

impl Frame {
    fn position(&self, time: NaiveDateTime) -> f64 {
        time_position(time.hour(), time.minute(), self.start_hour, self.end_hour)
    }

    fn contains(&self, time: NaiveDateTime) -> bool {
        in_window(time.hour(), time.minute(), self.start_hour, self.end_hour)
    }

    /// Furthest point the timeline may reach: the live clock while the
    /// current time is inside the window, otherwise the end of the shift.
    fn bound(&self) -> f64 {
        if self.is_active || self.contains(self.now) {
            self.position(self.now)
        } else {
            100.0
        }
    }

    fn classify<'a>(&self, records: &'a [TelemetryRecord], prior: Option<&'a TelemetryRecord>) -> TimelineInput<'a> {
        // Only the latest run of the window; earlier days share its clock hours
        let opened = occurrence_start(self.now, self.start_hour);
        let mut in_shift: Vec<&TelemetryRecord> = records
            .iter()
            .filter(|r| r.timestamp >= opened && r.timestamp <= self.now && self.contains(r.timestamp))
            .collect();
        in_shift.sort_by_key(|r| r.timestamp);

        match (in_shift.is_empty(), prior) {
            (false, _) => TimelineInput::RecordsPresent { records: in_shift, prior },
            (true, Some(prior)) => TimelineInput::CarryOverOnly(prior),
            (true, None) => TimelineInput::NoData,
        }
    }
}

/// Reconstruct the operation-state timeline of one shift.
///
/// `records` are the shift's telemetry records in any order; only those
/// inside the window and not after `now` are used. `prior` is the last known
/// record before the shift began. Segments are returned in ascending order,
/// contiguous, zero-width segments dropped, and never extend past the live
/// clock while `now` lies inside the shift.
pub fn build_segments(
    records: &[TelemetryRecord],
    prior: Option<&TelemetryRecord>,
    start_hour: u32,
    end_hour: u32,
    is_active: bool,
    now: NaiveDateTime,
) -> Vec<TimelineSegment> {
    let frame = Frame {
        start_hour,
        end_hour,
        is_active,
        now,
    };

    match frame.classify(records, prior) {
        TimelineInput::NoData => {
            tracing::debug!("no telemetry for shift {:02}-{:02}, reporting signal loss", start_hour, end_hour);
            fill_from_start(&frame, |end| TimelineSegment::signal_loss(0.0, end))
        }
        TimelineInput::CarryOverOnly(prior) => fill_from_start(&frame, |end| {
            TimelineSegment::new(0.0, end, prior.operation_state.as_str(), prior.counter)
        }),
        TimelineInput::RecordsPresent { records, prior } => segments_from_records(&frame, &records, prior),
    }
}

/// One segment from shift start to the bound, padded to the end of a finished shift.
fn fill_from_start(frame: &Frame, segment: impl FnOnce(f64) -> TimelineSegment) -> Vec<TimelineSegment> {
    let end = frame.bound();
    let mut segments = Vec::with_capacity(2);

    if end > 0.0 {
        segments.push(segment(end));
    }
    if end < 100.0 && !frame.is_active {
        segments.push(TimelineSegment::no_status(end, 100.0));
    }

    segments
}

fn segments_from_records(
    frame: &Frame,
    records: &[&TelemetryRecord],
    prior: Option<&TelemetryRecord>,
) -> Vec<TimelineSegment> {
    let bound = frame.bound();
    let mut points: Vec<(f64, &TelemetryRecord)> = records.iter().map(|r| (frame.position(r.timestamp), *r)).collect();
    let mut segments = Vec::with_capacity(points.len() + 2);

    let first_pct = points[0].0;
    if first_pct > 0.0 {
        match prior {
            // Carry the state from before the shift up to the first observation
            Some(prior) => points.insert(0, (0.0, prior)),
            None => segments.push(TimelineSegment::no_status(0.0, first_pct.min(bound))),
        }
    }

    for (i, (start, record)) in points.iter().enumerate() {
        let end = points.get(i + 1).map_or(bound, |(next, _)| *next).min(bound);
        if end > *start {
            segments.push(TimelineSegment::new(
                *start,
                end,
                record.operation_state.as_str(),
                record.counter,
            ));
        }
    }

    let covered = segments.last().map_or(0.0, |s| s.end_pct);
    if covered < bound {
        let tail = match segments.last() {
            Some(last) => last.continuing(covered, bound),
            None => TimelineSegment::no_status(covered, bound),
        };
        segments.push(tail);
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::fixtures::{at, record};

    fn assert_contiguous(segments: &[TimelineSegment]) {
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end_pct, pair[1].start_pct, "gap between {:?} and {:?}", pair[0], pair[1]);
        }
        for segment in segments {
            assert!(segment.width() > 0.0);
            assert!(segment.end_pct <= 100.0);
        }
    }

    #[test]
    fn test_signal_loss_when_active_shift_has_no_data() {
        let segments = build_segments(&[], None, 7, 15, true, at(1, 9, 0));
        assert_eq!(segments, vec![TimelineSegment::signal_loss(0.0, 25.0)]);
        assert_eq!(segments[0].color_tag, ColorTag::Danger);
    }

    #[test]
    fn test_signal_loss_spans_completed_shift() {
        let segments = build_segments(&[], None, 7, 15, false, at(1, 18, 0));
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].operation_state, SIGNAL_LOSS);
        assert_eq!(segments[0].end_pct, 100.0);
    }

    #[test]
    fn test_carry_over_only() {
        let prior = record(1, 6, 30, 42, "Normal Operation");
        let segments = build_segments(&[], Some(&prior), 7, 15, true, at(1, 8, 0));

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_pct, 0.0);
        assert_eq!(segments[0].end_pct, 12.5);
        assert_eq!(segments[0].operation_state, "Normal Operation");
        assert_eq!(segments[0].counter_at_segment, 42);
        assert_eq!(segments[0].color_tag, ColorTag::Success);
    }

    #[test]
    fn test_carry_over_pads_when_clock_inside_inactive_window() {
        let prior = record(1, 6, 30, 42, "Chokotei");
        let segments = build_segments(&[], Some(&prior), 7, 15, false, at(1, 11, 0));

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].end_pct, 50.0);
        assert_eq!(segments[1], TimelineSegment::no_status(50.0, 100.0));
    }

    #[test]
    fn test_records_outside_window_count_as_no_data() {
        let records = vec![record(1, 16, 0, 5, "Normal Operation")];
        let segments = build_segments(&records, None, 7, 15, false, at(1, 18, 0));
        assert_eq!(segments[0].operation_state, SIGNAL_LOSS);
    }

    #[test]
    fn test_completed_shift_reaches_full_width() {
        let records = vec![
            record(1, 9, 0, 300, "Warning"),
            record(1, 7, 0, 100, "Normal Operation"),
            record(1, 11, 0, 500, "Normal Operation"),
        ];
        let segments = build_segments(&records, None, 7, 15, false, at(1, 16, 0));

        assert_contiguous(&segments);
        let bounds: Vec<(f64, f64)> = segments.iter().map(|s| (s.start_pct, s.end_pct)).collect();
        assert_eq!(bounds, vec![(0.0, 25.0), (25.0, 50.0), (50.0, 100.0)]);
        assert_eq!(segments[1].color_tag, ColorTag::Danger);
        assert_eq!(segments[2].counter_at_segment, 500);
    }

    #[test]
    fn test_prior_state_fills_gap_before_first_record() {
        let prior = record(1, 6, 45, 90, "Chokotei");
        let records = vec![record(1, 9, 0, 120, "Normal Operation")];
        let segments = build_segments(&records, Some(&prior), 7, 15, true, at(1, 11, 0));

        assert_contiguous(&segments);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].operation_state, "Chokotei");
        assert_eq!((segments[0].start_pct, segments[0].end_pct), (0.0, 25.0));
        assert_eq!((segments[1].start_pct, segments[1].end_pct), (25.0, 50.0));
    }

    #[test]
    fn test_leading_gap_without_prior_is_neutral() {
        let records = vec![record(1, 9, 0, 120, "Normal Operation")];
        let segments = build_segments(&records, None, 7, 15, false, at(1, 20, 0));

        assert_contiguous(&segments);
        assert_eq!(segments[0], TimelineSegment::no_status(0.0, 25.0));
        assert_eq!(segments[1].end_pct, 100.0);
    }

    #[test]
    fn test_active_shift_never_passes_now() {
        let records = vec![
            record(1, 7, 0, 100, "Normal Operation"),
            record(1, 10, 0, 200, "Warning"),
            // Reported by a clock running ahead of the plant clock
            record(1, 13, 0, 300, "Normal Operation"),
        ];
        let segments = build_segments(&records, None, 7, 15, true, at(1, 11, 0));

        assert_contiguous(&segments);
        assert_eq!(segments.last().unwrap().end_pct, 50.0);
        assert_eq!(segments.last().unwrap().operation_state, "Warning");
    }

    #[test]
    fn test_records_at_current_minute_extend_last_state() {
        let records = vec![record(1, 9, 0, 100, "Normal Operation")];
        let segments = build_segments(&records, None, 7, 15, true, at(1, 9, 0));

        assert_eq!(segments, vec![TimelineSegment::no_status(0.0, 25.0)]);
    }

    #[test]
    fn test_midnight_crossing_timeline() {
        let records = vec![record(1, 22, 0, 10, "Normal Operation"), record(2, 0, 0, 50, "Chokotei")];
        let segments = build_segments(&records, None, 22, 6, true, at(2, 2, 0));

        assert_contiguous(&segments);
        let bounds: Vec<(f64, f64)> = segments.iter().map(|s| (s.start_pct, s.end_pct)).collect();
        assert_eq!(bounds, vec![(0.0, 25.0), (25.0, 50.0)]);
    }

    #[test]
    fn test_earlier_days_are_ignored() {
        let records = vec![
            record(1, 14, 0, 900, "Warning"),
            record(2, 8, 0, 20, "Normal Operation"),
        ];
        let segments = build_segments(&records, None, 7, 15, true, at(2, 9, 0));

        assert_contiguous(&segments);
        assert_eq!(
            segments,
            vec![
                TimelineSegment::no_status(0.0, 12.5),
                TimelineSegment::new(12.5, 25.0, "Normal Operation", 20),
            ]
        );
    }

    #[test]
    fn test_carry_over_covers_completed_shift() {
        let prior = record(1, 6, 30, 42, "Normal Operation");
        let segments = build_segments(&[], Some(&prior), 7, 15, false, at(1, 18, 0));

        assert_eq!(segments, vec![TimelineSegment::new(0.0, 100.0, "Normal Operation", 42)]);
        let covered: f64 = segments.iter().map(TimelineSegment::width).sum();
        assert_eq!(covered, 100.0);
    }

    #[test]
    fn test_last_record_runs_to_end_of_completed_shift() {
        let records = vec![record(1, 8, 0, 77, "Chokotei")];
        let segments = build_segments(&records, None, 7, 15, false, at(1, 16, 0));

        let last = segments.last().unwrap();
        assert_eq!((last.start_pct, last.end_pct), (12.5, 100.0));
        assert_eq!(last.counter_at_segment, 77);
    }

    #[test]
    fn test_identical_inputs_give_identical_output() {
        let prior = record(1, 6, 0, 1, "Warning");
        let records = vec![record(1, 8, 0, 10, "Normal Operation"), record(1, 12, 0, 20, "Chokotei")];
        let now = at(1, 13, 30);

        let first = build_segments(&records, Some(&prior), 7, 15, true, now);
        let second = build_segments(&records, Some(&prior), 7, 15, true, now);
        assert_eq!(first, second);
    }
}
