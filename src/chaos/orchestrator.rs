// src/chaos/orchestrator.rs
use super::session::{Inventory, Session};
use super::wait::is_shutdown;
use super::worker::{ChaosWorker, WorkerExit, WorkerReport, WorkerSchedule};
use super::ChaosError;
use crate::api::ApplicationApi;
use crate::metrics::ChaosMetrics;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Starts one worker per selected application and owns the shutdown signal
/// they all listen to.
pub struct Orchestrator {
    api: Arc<dyn ApplicationApi>,
    session: Session,
    schedule: WorkerSchedule,
    metrics: Option<Arc<ChaosMetrics>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

struct WorkerHandle {
    application: String,
    handle: JoinHandle<WorkerReport>,
}

/// Workers spawned by [`Orchestrator::launch`], in inventory order.
#[derive(Default)]
pub struct Simulation {
    workers: Vec<WorkerHandle>,
}

impl Simulation {
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn applications(&self) -> Vec<&str> {
        self.workers.iter().map(|w| w.application.as_str()).collect()
    }

    /// Wait for every worker to stop. Workers only stop on failure or
    /// shutdown, so call [`Orchestrator::shutdown`] first unless all of
    /// them are expected to fail.
    pub async fn join(self) -> Vec<WorkerReport> {
        let (applications, handles): (Vec<_>, Vec<_>) = self
            .workers
            .into_iter()
            .map(|w| (w.application, w.handle))
            .unzip();

        let results = futures::future::join_all(handles).await;

        applications
            .into_iter()
            .zip(results)
            .map(|(application, result)| match result {
                Ok(report) => report,
                Err(e) => {
                    error!("Worker for {} did not finish cleanly: {}", application, e);
                    WorkerReport {
                        application,
                        cycles: 0,
                        exit: WorkerExit::Aborted(e.to_string()),
                    }
                }
            })
            .collect()
    }
}

impl Orchestrator {
    pub fn new(api: Arc<dyn ApplicationApi>, session: Session, schedule: WorkerSchedule) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            api,
            session,
            schedule,
            metrics: None,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<ChaosMetrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Spawn a worker for each of the first `threads` applications. Each
    /// worker syncs and settles before the next one is spawned, which
    /// staggers the initial sync load.
    pub async fn launch(
        &self,
        inventory: &Inventory,
        threads: usize,
    ) -> Result<Simulation, ChaosError> {
        let targets = inventory.select(threads)?;
        let mut simulation = Simulation::default();

        for app in targets {
            if is_shutdown(&self.shutdown_rx) {
                info!("Shutdown requested, not starting remaining workers");
                break;
            }

            let worker = ChaosWorker::new(
                app.name(),
                self.api.clone(),
                self.session.clone(),
                self.schedule,
                self.metrics.clone(),
            );
            let (ready_tx, ready_rx) = oneshot::channel();

            info!("Starting worker for {}", app.name());
            let handle = tokio::spawn(worker.run(self.shutdown_rx.clone(), ready_tx));
            simulation.workers.push(WorkerHandle {
                application: app.name().to_string(),
                handle,
            });

            // Resolves when the worker settles, or is dropped if it stops first.
            let _ = ready_rx.await;
        }

        info!("{} chaos workers started", simulation.len());
        Ok(simulation)
    }

    /// Launch the workers and keep them running until `stop` resolves, then
    /// shut them down and collect their reports.
    pub async fn run_until<F>(
        &self,
        inventory: &Inventory,
        threads: usize,
        stop: F,
    ) -> Result<Vec<WorkerReport>, ChaosError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        let mut launch = Box::pin(self.launch(inventory, threads));

        let launched = tokio::select! {
            result = launch.as_mut() => Some(result),
            _ = &mut stop => None,
        };

        let simulation = match launched {
            Some(result) => {
                let simulation = result?;
                stop.await;
                simulation
            }
            None => {
                self.shutdown();
                launch.await?
            }
        };

        info!("Stopping {} chaos workers", simulation.len());
        self.shutdown();
        Ok(simulation.join().await)
    }
}
