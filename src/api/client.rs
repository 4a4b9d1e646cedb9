// src/api/client.rs
use super::error::ApiError;
use super::models::{
    ApplicationList, Application, ResourcePatchResponse, SessionRequest, SessionResponse,
    SyncRequest, SyncResponse,
};
use super::resource::{replicas_patch_body, TargetResource};
use super::ApplicationApi;
use crate::config::SyncConfig;
use crate::metrics::{ChaosMetrics, Timer};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Argo CD REST client. Holds no per-call state, so one instance is shared by
/// every worker. No retries: each failure goes back to the caller as is.
#[derive(Clone)]
pub struct ArgoApi {
    host: Url,
    client: Client,
    target: TargetResource,
    sync: SyncConfig,
    metrics: Option<Arc<ChaosMetrics>>,
}

impl ArgoApi {
    pub fn new(host: &str, insecure_skip_verify: bool) -> Result<Self, ApiError> {
        let host = Url::parse(host)?;

        if insecure_skip_verify {
            warn!(
                "TLS certificate verification is disabled for {}; use only against test clusters",
                host
            );
        }

        // The skip applies to this client only.
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()?;

        Ok(Self {
            host,
            client,
            target: TargetResource::default(),
            sync: SyncConfig::default(),
            metrics: None,
        })
    }

    pub fn with_target(mut self, target: TargetResource) -> Self {
        self.target = target;
        self
    }

    pub fn with_sync_config(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<ChaosMetrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.host.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        url: Url,
        token: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<T, ApiError> {
        let timer = Timer::new();
        let result = self.execute(operation, method, url, token, body).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_api_call(operation, result.is_ok(), timer.elapsed());
        }
        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        url: Url,
        token: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<T, ApiError> {
        let mut request = self.client.request(method, url);
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(operation, %status, bytes = bytes.len(), "API response");

        serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode { operation, source })
    }
}

#[async_trait]
impl ApplicationApi for ArgoApi {
    async fn get_token(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let body = serde_json::to_vec(&SessionRequest { username, password })
            .map_err(ApiError::Encode)?;
        let url = self.endpoint(&["api", "v1", "session"]);

        let response: SessionResponse =
            self.send("session", Method::POST, url, None, Some(body)).await?;

        response.token.ok_or_else(|| ApiError::MissingToken {
            message: response.status.describe(),
        })
    }

    async fn list_applications(&self, token: &str) -> Result<Vec<Application>, ApiError> {
        let url = self.endpoint(&["api", "v1", "applications"]);
        let list: ApplicationList = self
            .send("list_applications", Method::GET, url, Some(token), None)
            .await?;

        if let Some(message) = list.status.describe() {
            warn!("Application listing returned an error body: {}", message);
        }
        Ok(list.items)
    }

    async fn sync(&self, token: &str, application: &str) -> Result<SyncResponse, ApiError> {
        let request = SyncRequest::forced(&self.sync.revision, self.sync.sync_options.clone());
        let body = serde_json::to_vec(&request).map_err(ApiError::Encode)?;
        let url = self.endpoint(&["api", "v1", "applications", application, "sync"]);

        self.send("sync", Method::POST, url, Some(token), Some(body))
            .await
    }

    async fn update_replicas(
        &self,
        token: &str,
        replicas: u32,
        application: &str,
    ) -> Result<ResourcePatchResponse, ApiError> {
        let body = replicas_patch_body(replicas).map_err(ApiError::Encode)?;
        let url = self.target.patch_url(&self.host, application);

        self.send("update_replicas", Method::POST, url, Some(token), Some(body))
            .await
    }
}
