// src/chaos/mod.rs
mod error;
mod orchestrator;
mod session;
mod wait;
mod worker;

pub use error::ChaosError;
pub use orchestrator::{Orchestrator, Simulation};
pub use session::{Inventory, Session};
pub use wait::{is_shutdown, pause};
pub use worker::{ChaosWorker, WorkerExit, WorkerPhase, WorkerReport, WorkerSchedule};
