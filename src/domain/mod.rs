// Domain layer - Telemetry models and the shift timeline engine
pub mod position;
pub mod prior_state;
pub mod production;
pub mod report;
pub mod rollup;
pub mod shift;
pub mod telemetry;
pub mod timeline;
