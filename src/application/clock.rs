// Plant clock - the only place wall-clock time is read
use anyhow::Context;
use chrono::{FixedOffset, NaiveDateTime, Utc};

pub trait Clock: Send + Sync {
    /// Current plant-local time
    fn now(&self) -> NaiveDateTime;
}

/// System clock shifted to the plant's fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct PlantClock {
    offset: FixedOffset,
}

impl PlantClock {
    pub fn new(utc_offset_minutes: i32) -> anyhow::Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
            .with_context(|| format!("invalid plant UTC offset: {} minutes", utc_offset_minutes))?;
        Ok(Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Clock for PlantClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
