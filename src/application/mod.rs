// Application layer - Use cases over the shift timeline engine
pub mod clock;
pub mod live_refresh;
pub mod shift_report_service;
pub mod telemetry_repository;
