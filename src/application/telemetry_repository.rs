// Repository trait for machine telemetry access
use crate::domain::telemetry::TelemetryRecord;
use async_trait::async_trait;

/// Recent telemetry of one machine, newest rows as returned by the source.
#[derive(Debug, Clone, Default)]
pub struct MachineLog {
    pub machine_code: String,
    pub machine_name: Option<String>,
    pub records: Vec<TelemetryRecord>,
}

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// List all machine codes that report telemetry
    async fn list_machine_codes(&self) -> anyhow::Result<Vec<String>>;

    /// Fetch the most recent `limit` telemetry rows of a machine
    async fn fetch_machine_log(&self, machine_code: &str, limit: usize) -> anyhow::Result<MachineLog>;
}
