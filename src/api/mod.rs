// src/api/mod.rs
mod client;
mod error;
mod models;
mod resource;

pub use client::ArgoApi;
pub use error::ApiError;
pub use models::{
    Application, ApplicationList, ErrorBody, ObjectMeta, ResourcePatchResponse, SessionResponse,
    SyncRequest, SyncResponse,
};
pub use resource::{replicas_patch, replicas_patch_body, TargetResource, MERGE_PATCH_TYPE};

use async_trait::async_trait;

/// The four Argo CD calls the harness needs.
#[async_trait]
pub trait ApplicationApi: Send + Sync {
    /// Exchange credentials for a bearer token (`POST /api/v1/session`).
    async fn get_token(&self, username: &str, password: &str) -> Result<String, ApiError>;

    /// Every application visible to the token, in server order.
    async fn list_applications(&self, token: &str) -> Result<Vec<Application>, ApiError>;

    async fn sync(&self, token: &str, application: &str) -> Result<SyncResponse, ApiError>;

    /// Merge-patch `spec.replicas` on the application's target workload.
    async fn update_replicas(
        &self,
        token: &str,
        replicas: u32,
        application: &str,
    ) -> Result<ResourcePatchResponse, ApiError>;
}
