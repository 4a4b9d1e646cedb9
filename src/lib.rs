// src/lib.rs
pub mod api;
pub mod chaos;
pub mod config;
pub mod metrics;
pub mod prompt;
