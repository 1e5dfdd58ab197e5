// HTTP request handlers
use crate::application::live_refresh::LiveRefresh;
use crate::infrastructure::chunked_json::stream_from_refresh;
use crate::infrastructure::http_response::{accepts_brotli, error_response, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Response, StatusCode},
    response::IntoResponse,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const AT_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

#[derive(Deserialize)]
pub struct ReportQuery {
    pub at: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

fn validate_machine_code(code: &str) -> Result<&str, Response<Body>> {
    if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(code)
    } else {
        Err(error_response(StatusCode::BAD_REQUEST, "Invalid machine code format"))
    }
}

fn parse_at(value: &str) -> Result<NaiveDateTime, Response<Body>> {
    AT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Invalid 'at' timestamp"))
}

async fn respond<T: Serialize>(data: &T, compress: bool) -> Response<Body> {
    match json_response(data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// List configured shift definitions
pub async fn list_shifts(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response<Body> {
    respond(&state.report_service.shifts(), accepts_brotli(&headers)).await
}

/// List machines known to the telemetry API
pub async fn list_machines(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response<Body> {
    match state.report_service.list_machines().await {
        Ok(codes) => respond(&codes, accepts_brotli(&headers)).await,
        Err(e) => {
            tracing::error!("Error fetching machines: {:#}", e);
            error_response(StatusCode::BAD_GATEWAY, "Failed to fetch machines")
        }
    }
}

/// Shift reports for one machine, optionally as of `at`
pub async fn machine_shifts(
    Path(code): Path<String>,
    Query(query): Query<ReportQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response<Body> {
    let code = match validate_machine_code(&code) {
        Ok(code) => code,
        Err(response) => return response,
    };

    let now = match query.at.as_deref().map(parse_at) {
        Some(Ok(at)) => at,
        Some(Err(response)) => return response,
        None => state.clock.now(),
    };

    match state.report_service.build_report(code, now).await {
        Ok(report) => respond(&report, accepts_brotli(&headers)).await,
        Err(e) => {
            tracing::error!("Error building report for machine {}: {:#}", code, e);
            error_response(StatusCode::BAD_GATEWAY, "Failed to fetch machine telemetry")
        }
    }
}

/// Stream live shift reports for one machine until the client disconnects
pub async fn stream_machine_shifts(
    Path(code): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response<Body> {
    if let Err(response) = validate_machine_code(&code) {
        return response;
    }

    tracing::debug!("Starting live refresh for machine {}", code);
    let refresh = LiveRefresh::spawn(
        state.report_service.clone(),
        code,
        state.clock.clone(),
        state.poll_interval,
    );

    stream_from_refresh(refresh, accepts_brotli(&headers))
        .await
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::FixedClock;
    use crate::application::shift_report_service::tests::service;
    use crate::domain::telemetry::fixtures::{at, record};
    use std::time::Duration;

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            report_service: service(vec![record(1, 8, 0, 10, "Normal Operation")]),
            clock: Arc::new(FixedClock(at(1, 9, 0))),
            poll_interval: Duration::from_millis(1000),
        })
    }

    async fn get_shifts(code: &str, at: Option<&str>) -> StatusCode {
        machine_shifts(
            Path(code.to_string()),
            Query(ReportQuery {
                at: at.map(str::to_string),
            }),
            HeaderMap::new(),
            State(state()),
        )
        .await
        .status()
    }

    #[test]
    fn test_machine_code_validation() {
        assert!(validate_machine_code("101").is_ok());
        assert!(validate_machine_code("").is_err());
        assert!(validate_machine_code("10a").is_err());
        assert!(validate_machine_code("1;DROP").is_err());
    }

    #[test]
    fn test_parse_at() {
        assert_eq!(parse_at("2024-03-01T09:00").ok(), Some(at(1, 9, 0)));
        assert_eq!(parse_at("2024-03-01 09:30:00").ok(), Some(at(1, 9, 30)));
        assert!(parse_at("9 o'clock").is_err());
    }

    #[tokio::test]
    async fn test_machine_shifts_status_codes() {
        assert_eq!(get_shifts("101", None).await, StatusCode::OK);
        assert_eq!(get_shifts("101", Some("2024-03-01T23:30:00")).await, StatusCode::OK);
        assert_eq!(get_shifts("abc", None).await, StatusCode::BAD_REQUEST);
        assert_eq!(get_shifts("101", Some("tomorrow")).await, StatusCode::BAD_REQUEST);
        assert_eq!(get_shifts("999", None).await, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_list_shifts() {
        let response = list_shifts(HeaderMap::new(), State(state())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
