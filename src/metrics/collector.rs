// src/metrics/collector.rs
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Instant;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<ChaosMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(ChaosMetrics::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<ChaosMetrics> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
        }
        buffer
    }
}

pub struct ChaosMetrics {
    // API metrics
    pub api_requests_total: IntCounterVec,
    pub api_request_duration_seconds: HistogramVec,

    // Worker metrics
    pub worker_cycles_total: IntCounterVec,
    pub worker_failures_total: IntCounterVec,
    pub replica_target: IntGaugeVec,
    pub workers_active: IntGauge,
}

impl ChaosMetrics {
    pub fn new(registry: &Registry) -> Result<Self> {
        let api_requests_total = IntCounterVec::new(
            Opts::new("chaos_api_requests_total", "Total Argo CD API calls"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(api_requests_total.clone()))?;

        let api_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "chaos_api_request_duration_seconds",
                "Argo CD API call duration in seconds",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(api_request_duration_seconds.clone()))?;

        let worker_cycles_total = IntCounterVec::new(
            Opts::new(
                "chaos_worker_cycles_total",
                "Completed scale up / scale down cycles",
            ),
            &["application"],
        )?;
        registry.register(Box::new(worker_cycles_total.clone()))?;

        let worker_failures_total = IntCounterVec::new(
            Opts::new(
                "chaos_worker_failures_total",
                "Workers stopped by an API error",
            ),
            &["application", "phase"],
        )?;
        registry.register(Box::new(worker_failures_total.clone()))?;

        let replica_target = IntGaugeVec::new(
            Opts::new(
                "chaos_replica_target",
                "Replica count most recently requested",
            ),
            &["application"],
        )?;
        registry.register(Box::new(replica_target.clone()))?;

        let workers_active = IntGauge::new("chaos_workers_active", "Running chaos workers")?;
        registry.register(Box::new(workers_active.clone()))?;

        Ok(Self {
            api_requests_total,
            api_request_duration_seconds,
            worker_cycles_total,
            worker_failures_total,
            replica_target,
            workers_active,
        })
    }

    pub fn record_api_call(&self, operation: &str, success: bool, duration: std::time::Duration) {
        let outcome = if success { "success" } else { "failure" };
        self.api_requests_total
            .with_label_values(&[operation, outcome])
            .inc();

        self.api_request_duration_seconds
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    pub fn record_cycle(&self, application: &str) {
        self.worker_cycles_total
            .with_label_values(&[application])
            .inc();
    }

    pub fn record_worker_failure(&self, application: &str, phase: &str) {
        self.worker_failures_total
            .with_label_values(&[application, phase])
            .inc();
    }

    pub fn update_replica_target(&self, application: &str, replicas: u32) {
        self.replica_target
            .with_label_values(&[application])
            .set(i64::from(replicas));
    }

    pub fn worker_started(&self) {
        self.workers_active.inc();
    }

    pub fn worker_stopped(&self) {
        self.workers_active.dec();
    }
}

// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
