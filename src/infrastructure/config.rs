// Configuration loading for the service, engine and shift definitions
use crate::domain::production::CounterDecreasePolicy;
use crate::domain::shift::{ShiftDefinition, ShiftDefinitionError};
use serde::Deserialize;
use thiserror::Error;

const ENV_PREFIX: &str = "SHIFTLINE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid shift definition: {0}")]
    Shift(#[from] ShiftDefinitionError),
    #[error("shift '{0}' needs either hour_marks or start_hour and end_hour")]
    MissingWindow(String),
    #[error("no shifts configured")]
    NoShifts,
    #[error("standard_start_hour {0} is outside 0..24")]
    StandardStartHour(u32),
    #[error("poll_interval_ms must be greater than zero")]
    PollInterval,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub telemetry_api: TelemetryApiSettings,
    #[serde(default)]
    pub engine: EngineSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryApiSettings {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_record_limit")]
    pub record_limit: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_record_limit() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineSettings {
    /// Hour the production day starts at
    pub standard_start_hour: u32,
    pub counter_decrease: CounterDecreasePolicy,
    pub poll_interval_ms: u64,
    /// Plant clock offset from UTC
    pub utc_offset_minutes: i32,
    pub daily_target: u64,
    pub rollup_days: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            standard_start_hour: 7,
            counter_decrease: CounterDecreasePolicy::default(),
            poll_interval_ms: 1000,
            utc_offset_minutes: 0,
            daily_target: 2000,
            rollup_days: 31,
        }
    }
}

impl AppConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.engine.standard_start_hour >= 24 {
            return Err(ConfigError::StandardStartHour(self.engine.standard_start_hour));
        }
        if self.engine.poll_interval_ms == 0 {
            return Err(ConfigError::PollInterval);
        }
        Ok(self)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShiftsConfig {
    #[serde(default)]
    pub shifts: Vec<ShiftConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShiftConfig {
    pub name: String,
    #[serde(default)]
    pub hour_marks: Vec<u32>,
    pub start_hour: Option<u32>,
    pub end_hour: Option<u32>,
}

impl ShiftConfig {
    pub fn to_definition(&self) -> Result<ShiftDefinition, ConfigError> {
        if !self.hour_marks.is_empty() {
            return Ok(ShiftDefinition::new(self.name.clone(), self.hour_marks.clone())?);
        }

        match (self.start_hour, self.end_hour) {
            (Some(start), Some(end)) => Ok(ShiftDefinition::spanning(self.name.clone(), start, end)?),
            _ => Err(ConfigError::MissingWindow(self.name.clone())),
        }
    }
}

impl ShiftsConfig {
    pub fn into_definitions(self) -> Result<Vec<ShiftDefinition>, ConfigError> {
        if self.shifts.is_empty() {
            return Err(ConfigError::NoShifts);
        }
        self.shifts.iter().map(ShiftConfig::to_definition).collect()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/app"))
        .add_source(environment())
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    Ok(config.validate()?)
}

pub fn load_shift_definitions() -> anyhow::Result<Vec<ShiftDefinition>> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/shifts"))
        .build()?;

    let shifts: ShiftsConfig = settings.try_deserialize()?;
    Ok(shifts.into_definitions()?)
}
