// Application state for HTTP handlers
use crate::application::clock::Clock;
use crate::application::shift_report_service::ShiftReportService;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub report_service: ShiftReportService,
    pub clock: Arc<dyn Clock>,
    pub poll_interval: Duration,
}
