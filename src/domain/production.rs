// Hourly production bucketing
use crate::domain::telemetry::{TelemetryRecord, sorted_up_to};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Production increment per hour mark, aligned 1:1 with a shift's hour marks.
pub type HourlyProduction = Vec<u64>;

/// What to do when a reading is lower than the counter it follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterDecreasePolicy {
    /// The machine counter was reset: count again from zero.
    Reset,
    /// Treat the reading as a glitch and skip it.
    Ignore,
    /// Keep the reading but attribute no production to the drop.
    #[default]
    Clamp,
}

/// Bucket a reading taken during clock hour `hour` is attributed to.
///
/// Readings count toward the *next* boundary: a reading at 7:30 belongs to
/// the 8:00 mark. Readings from the hour before the first mark land on the
/// first mark.
fn bucket_for(hour: u32, marks: &[u32]) -> Option<usize> {
    let last = marks.len() - 1;

    for i in 0..last {
        let (current, next) = (marks[i], marks[i + 1]);
        let inside = if next < current {
            hour >= current || hour < next
        } else {
            hour >= current && hour < next
        };
        if inside {
            return Some(i + 1);
        }
    }

    if hour < marks[0] && hour >= marks[last] {
        return Some(0);
    }

    None
}

/// Running state of the bucket currently being filled.
struct OpenBucket {
    index: usize,
    /// Closing counter of the previous bucket.
    baseline: u64,
    /// Highest counter seen in this bucket.
    peak: u64,
    /// Production already accounted for before a counter reset inside this bucket.
    carried: u64,
}

impl OpenBucket {
    fn production(&self) -> u64 {
        self.carried + self.peak.saturating_sub(self.baseline)
    }
}

/// Compute per-hour production increments for one shift.
///
/// Records after `as_of` never contribute. The first bucket that receives a
/// reading reports the raw counter value, since there is no earlier closing
/// counter to subtract.
pub fn bucketize(
    records: &[TelemetryRecord],
    hour_marks: &[u32],
    as_of: NaiveDateTime,
    policy: CounterDecreasePolicy,
) -> HourlyProduction {
    let mut production = vec![0; hour_marks.len()];
    if hour_marks.is_empty() {
        return production;
    }

    let mut open: Option<OpenBucket> = None;

    for record in sorted_up_to(records, as_of) {
        let Some(index) = bucket_for(record.hour(), hour_marks) else {
            continue;
        };
        let counter = record.counter;

        let Some(bucket) = open.as_mut() else {
            open = Some(OpenBucket {
                index,
                baseline: 0,
                peak: counter,
                carried: 0,
            });
            production[index] = production[index].max(counter);
            continue;
        };

        if index == bucket.index {
            if counter < bucket.peak && policy == CounterDecreasePolicy::Reset {
                bucket.carried = bucket.production();
                bucket.baseline = 0;
                bucket.peak = counter;
            } else {
                bucket.peak = bucket.peak.max(counter);
            }
        } else if index < bucket.index {
            tracing::trace!("reading at {} falls before bucket {}, skipped", record.timestamp, bucket.index);
            continue;
        } else {
            let closing = bucket.peak;
            let baseline = if counter >= closing {
                closing
            } else {
                match policy {
                    CounterDecreasePolicy::Reset => 0,
                    CounterDecreasePolicy::Clamp => counter,
                    CounterDecreasePolicy::Ignore => {
                        tracing::debug!(
                            "counter dropped from {} to {} at {}, reading ignored",
                            closing,
                            counter,
                            record.timestamp
                        );
                        continue;
                    }
                }
            };

            production[bucket.index] = bucket.production();
            // Buckets skipped between the two readings produced nothing
            for skipped in &mut production[bucket.index + 1..index] {
                *skipped = 0;
            }

            *bucket = OpenBucket {
                index,
                baseline,
                peak: counter,
                carried: 0,
            };
        }

        production[bucket.index] = production[bucket.index].max(bucket.production());
    }

    production
}
