// src/chaos/worker.rs
use super::session::Session;
use super::wait::{is_shutdown, pause};
use crate::api::{ApiError, ApplicationApi, ErrorBody};
use crate::config::ChaosConfig;
use crate::metrics::ChaosMetrics;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

/// States of the per-application chaos loop. After `Settling` the worker
/// cycles `ScaleUp -> WaitAfterScaleUp -> ScaleDown -> WaitAfterScaleDown`
/// until it fails or shutdown is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Syncing,
    Settling,
    ScaleUp,
    WaitAfterScaleUp,
    ScaleDown,
    WaitAfterScaleDown,
}

impl WorkerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerPhase::Syncing => "syncing",
            WorkerPhase::Settling => "settling",
            WorkerPhase::ScaleUp => "scale_up",
            WorkerPhase::WaitAfterScaleUp => "wait_after_scale_up",
            WorkerPhase::ScaleDown => "scale_down",
            WorkerPhase::WaitAfterScaleDown => "wait_after_scale_down",
        }
    }
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// Shutdown was requested
    Cancelled,
    /// An API call failed; the worker stopped without touching the application again
    Failed { phase: WorkerPhase, error: String },
    /// The worker task panicked or was aborted
    Aborted(String),
}

#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub application: String,
    /// Completed scale up / scale down cycles
    pub cycles: u64,
    pub exit: WorkerExit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSchedule {
    pub settle: Duration,
    pub scale_wait: Duration,
    pub high_replicas: u32,
    pub low_replicas: u32,
}

impl Default for WorkerSchedule {
    fn default() -> Self {
        Self::from_config(&ChaosConfig::default())
    }
}

impl WorkerSchedule {
    pub fn from_config(config: &ChaosConfig) -> Self {
        Self {
            settle: config.schedule.settle(),
            scale_wait: config.schedule.scale_wait(),
            high_replicas: config.replicas.high,
            low_replicas: config.replicas.low,
        }
    }
}

/// Holds the active-workers gauge up for as long as the worker runs,
/// including when its task panics.
struct ActiveWorker(Option<Arc<ChaosMetrics>>);

impl ActiveWorker {
    fn start(metrics: Option<Arc<ChaosMetrics>>) -> Self {
        if let Some(metrics) = &metrics {
            metrics.worker_started();
        }
        Self(metrics)
    }
}

impl Drop for ActiveWorker {
    fn drop(&mut self) {
        if let Some(metrics) = &self.0 {
            metrics.worker_stopped();
        }
    }
}

/// Drives one application for the lifetime of the process.
pub struct ChaosWorker {
    application: String,
    api: Arc<dyn ApplicationApi>,
    session: Session,
    schedule: WorkerSchedule,
    metrics: Option<Arc<ChaosMetrics>>,
}

impl ChaosWorker {
    pub fn new(
        application: impl Into<String>,
        api: Arc<dyn ApplicationApi>,
        session: Session,
        schedule: WorkerSchedule,
        metrics: Option<Arc<ChaosMetrics>>,
    ) -> Self {
        Self {
            application: application.into(),
            api,
            session,
            schedule,
            metrics,
        }
    }

    /// Run until failure or shutdown. `ready` fires once the initial sync
    /// and settle pause are over; it is dropped unsent if the worker stops
    /// before that.
    pub async fn run(
        self,
        mut shutdown: watch::Receiver<bool>,
        ready: oneshot::Sender<()>,
    ) -> WorkerReport {
        let _active = ActiveWorker::start(self.metrics.clone());

        let mut cycles = 0;
        let exit = self.drive(&mut shutdown, ready, &mut cycles).await;

        match &exit {
            WorkerExit::Cancelled => {
                info!(
                    application = %self.application,
                    cycles,
                    "Worker stopped on shutdown"
                );
            }
            WorkerExit::Failed { phase, error } => {
                error!(
                    application = %self.application,
                    %phase,
                    cycles,
                    "Worker stopped: {}",
                    error
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_worker_failure(&self.application, phase.as_str());
                }
            }
            WorkerExit::Aborted(reason) => {
                error!(application = %self.application, "Worker aborted: {}", reason);
            }
        }

        WorkerReport {
            application: self.application,
            cycles,
            exit,
        }
    }

    async fn drive(
        &self,
        shutdown: &mut watch::Receiver<bool>,
        ready: oneshot::Sender<()>,
        cycles: &mut u64,
    ) -> WorkerExit {
        info!(application = %self.application, "Pick application");

        if is_shutdown(shutdown) {
            return WorkerExit::Cancelled;
        }
        self.enter(WorkerPhase::Syncing, *cycles);
        match self.api.sync(self.session.token(), &self.application).await {
            Ok(response) => self.note_platform_error(WorkerPhase::Syncing, &response.status),
            Err(e) => {
                // The next worker's sync still waits out the settle pause.
                pause(self.schedule.settle, shutdown).await;
                return self.failed(WorkerPhase::Syncing, e);
            }
        }

        self.enter(WorkerPhase::Settling, *cycles);
        if !pause(self.schedule.settle, shutdown).await {
            return WorkerExit::Cancelled;
        }
        let _ = ready.send(());

        loop {
            info!(
                application = %self.application,
                cycle = *cycles,
                "Execute replication emulation"
            );

            if let Err(exit) = self
                .scale(WorkerPhase::ScaleUp, self.schedule.high_replicas, shutdown, *cycles)
                .await
            {
                return exit;
            }

            self.enter(WorkerPhase::WaitAfterScaleUp, *cycles);
            if !pause(self.schedule.scale_wait, shutdown).await {
                return WorkerExit::Cancelled;
            }

            if let Err(exit) = self
                .scale(WorkerPhase::ScaleDown, self.schedule.low_replicas, shutdown, *cycles)
                .await
            {
                return exit;
            }

            self.enter(WorkerPhase::WaitAfterScaleDown, *cycles);
            if !pause(self.schedule.scale_wait, shutdown).await {
                return WorkerExit::Cancelled;
            }

            *cycles += 1;
            if let Some(metrics) = &self.metrics {
                metrics.record_cycle(&self.application);
            }
        }
    }

    async fn scale(
        &self,
        phase: WorkerPhase,
        replicas: u32,
        shutdown: &watch::Receiver<bool>,
        cycle: u64,
    ) -> Result<(), WorkerExit> {
        if is_shutdown(shutdown) {
            return Err(WorkerExit::Cancelled);
        }
        self.enter(phase, cycle);
        info!(application = %self.application, "Scale to {}", replicas);

        let response = self
            .api
            .update_replicas(self.session.token(), replicas, &self.application)
            .await
            .map_err(|e| self.failed(phase, e))?;

        self.note_platform_error(phase, &response.status);
        if let Some(metrics) = &self.metrics {
            metrics.update_replica_target(&self.application, replicas);
        }
        Ok(())
    }

    fn enter(&self, phase: WorkerPhase, cycle: u64) {
        debug!(application = %self.application, %phase, cycle, "Entering phase");
    }

    fn failed(&self, phase: WorkerPhase, error: ApiError) -> WorkerExit {
        WorkerExit::Failed {
            phase,
            error: error.to_string(),
        }
    }

    // Errors inside a decoded body are reported but do not stop the worker.
    fn note_platform_error(&self, phase: WorkerPhase, status: &ErrorBody) {
        if let Some(message) = status.describe() {
            warn!(
                application = %self.application,
                %phase,
                "Platform reported an error: {}",
                message
            );
        }
    }
}
