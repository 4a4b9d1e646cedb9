// src/chaos/error.rs
use crate::api::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum ChaosError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("threads must be at least 1")]
    InvalidThreads,

    #[error("{requested} workers requested but only {available} applications are visible")]
    NotEnoughApplications { requested: usize, available: usize },
}
