// Clock time to timeline position mapping
use chrono::{Duration, NaiveDateTime, NaiveTime};

/// Decimal hour of a wall-clock time (e.g. 7:30 -> 7.5).
pub fn decimal_hour(hour: u32, minute: u32) -> f64 {
    hour as f64 + minute as f64 / 60.0
}

/// Length of a shift window in hours. A window whose end is before its start crosses midnight.
pub fn shift_length(start_hour: u32, end_hour: u32) -> f64 {
    if end_hour < start_hour {
        24.0 - start_hour as f64 + end_hour as f64
    } else {
        end_hour as f64 - start_hour as f64
    }
}

/// Midnight-aware containment: `[start, end)` in clock time.
pub fn in_window(hour: u32, minute: u32, start_hour: u32, end_hour: u32) -> bool {
    let t = decimal_hour(hour, minute);
    let (start, end) = (start_hour as f64, end_hour as f64);

    if end_hour < start_hour {
        t >= start || t < end
    } else {
        t >= start && t < end
    }
}

/// Most recent time at or before `now` when a window starting at `start_hour` opened.
pub fn occurrence_start(now: NaiveDateTime, start_hour: u32) -> NaiveDateTime {
    let start = now.date().and_time(NaiveTime::MIN) + Duration::hours(start_hour as i64);
    if start > now { start - Duration::days(1) } else { start }
}

/// Position of a clock time on a shift's timeline, as a percentage in `[0, 100]`.
pub fn time_position(hour: u32, minute: u32, start_hour: u32, end_hour: u32) -> f64 {
    let t = decimal_hour(hour, minute);
    let start = start_hour as f64;

    let elapsed = if end_hour < start_hour && t < start {
        24.0 - start + t
    } else {
        t - start
    };

    let length = shift_length(start_hour, end_hour);
    if length <= 0.0 {
        return 0.0;
    }

    (elapsed / length * 100.0).clamp(0.0, 100.0)
}
