// Daily production rollups for trend charts
use crate::domain::telemetry::{TelemetryRecord, sorted_up_to};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRollup {
    pub labels: Vec<String>,
    pub production: Vec<u64>,
    pub target: Vec<u64>,
}

/// Production per calendar day: the sum of counter increases between
/// consecutive readings of that day. Drops (resets) contribute nothing.
fn production_by_day(records: &[TelemetryRecord], as_of: NaiveDateTime) -> HashMap<NaiveDate, u64> {
    let mut per_day = HashMap::new();
    let mut previous: Option<&TelemetryRecord> = None;

    for record in sorted_up_to(records, as_of) {
        let day = record.timestamp.date();
        if let Some(prev) = previous.filter(|p| p.timestamp.date() == day) {
            *per_day.entry(day).or_insert(0) += record.counter.saturating_sub(prev.counter);
        } else {
            per_day.entry(day).or_insert(0);
        }
        previous = Some(record);
    }

    per_day
}

/// The last `days` calendar days up to and including `as_of`, oldest first.
pub fn daily_rollup(records: &[TelemetryRecord], days: u32, as_of: NaiveDateTime, target: u64) -> ProductionRollup {
    let per_day = production_by_day(records, as_of);
    let today = as_of.date();

    let dates: Vec<NaiveDate> = (0..days as i64)
        .rev()
        .map(|offset| today - Duration::days(offset))
        .collect();

    ProductionRollup {
        labels: dates.iter().map(|d| format!("{}/{}", d.month(), d.day())).collect(),
        production: dates.iter().map(|d| per_day.get(d).copied().unwrap_or(0)).collect(),
        target: vec![target; dates.len()],
    }
}

/// The last seven days folded into Sunday..Saturday buckets.
pub fn weekday_rollup(records: &[TelemetryRecord], as_of: NaiveDateTime, target: u64) -> ProductionRollup {
    let per_day = production_by_day(records, as_of);
    let first_day = as_of.date() - Duration::days(6);
    let mut production = vec![0; 7];

    for (day, amount) in per_day.into_iter().filter(|(day, _)| *day >= first_day) {
        production[day.weekday().num_days_from_sunday() as usize] += amount;
    }

    ProductionRollup {
        labels: WEEKDAY_LABELS.iter().map(|l| l.to_string()).collect(),
        production,
        target: vec![target; 7],
    }
}
