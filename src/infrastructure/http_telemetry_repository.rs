// Telemetry API repository implementation
use crate::application::telemetry_repository::{MachineLog, TelemetryRepository};
use crate::infrastructure::record_mapper::{MachineLogRow, rows_to_records};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::FixedOffset;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpTelemetryRepository {
    base_url: String,
    token: Option<String>,
    plant_offset: FixedOffset,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MachineRow {
    #[serde(rename = "MACHINE_CODE")]
    machine_code: serde_json::Value,
}

impl HttpTelemetryRepository {
    pub fn new(base_url: String, token: Option<String>, plant_offset: FixedOffset, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build telemetry API client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            plant_offset,
            client,
        })
    }

    fn machines_url(&self) -> String {
        format!("{}/machines", self.base_url)
    }

    fn logs_url(&self, machine_code: &str, limit: usize) -> String {
        format!(
            "{}/machines/{}/logs?limit={}",
            self.base_url,
            urlencoding::encode(machine_code),
            limit
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to telemetry API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telemetry API request failed with status {}: {}", status, body);
        }

        response
            .json::<T>()
            .await
            .context("Failed to parse telemetry API response")
    }
}

#[async_trait]
impl TelemetryRepository for HttpTelemetryRepository {
    async fn list_machine_codes(&self) -> Result<Vec<String>> {
        let rows: Vec<MachineRow> = self.get_json(&self.machines_url()).await?;

        let codes = rows
            .into_iter()
            .filter_map(|row| match row.machine_code {
                serde_json::Value::String(code) => Some(code),
                serde_json::Value::Number(code) => Some(code.to_string()),
                _ => None,
            })
            .collect();

        Ok(codes)
    }

    async fn fetch_machine_log(&self, machine_code: &str, limit: usize) -> Result<MachineLog> {
        let url = self.logs_url(machine_code, limit);
        tracing::debug!("Fetching machine log: {}", url);

        let rows: Vec<MachineLogRow> = self.get_json(&url).await?;
        let records = rows_to_records(&rows, self.plant_offset);

        if records.len() < rows.len() {
            tracing::warn!(
                "Machine {}: {} of {} telemetry rows were unusable",
                machine_code,
                rows.len() - records.len(),
                rows.len()
            );
        }

        Ok(MachineLog {
            machine_code: machine_code.to_string(),
            machine_name: rows.iter().find_map(|r| r.machine_name.clone()),
            records,
        })
    }
}
