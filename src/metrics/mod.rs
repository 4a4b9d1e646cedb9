// src/metrics/mod.rs
mod collector;
mod server;

pub use collector::{ChaosMetrics, MetricsRegistry, Timer};
pub use server::start_metrics_server;
