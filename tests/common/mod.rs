// tests/common/mod.rs
#![allow(dead_code)]

use argocd_chaos::api::{
    ApiError, Application, ApplicationApi, ErrorBody, ResourcePatchResponse, SyncResponse,
};
use argocd_chaos::chaos::WorkerSchedule;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Sync(String),
    Scale(String, u32),
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub call: Call,
    pub at: Instant,
}

/// In-memory Argo CD: records every call and fails on request.
#[derive(Default)]
pub struct FakeApi {
    pub applications: Vec<Application>,
    pub failing_syncs: HashSet<String>,
    /// Fail the n-th (1-based) scale call of an application
    pub failing_scales: HashMap<String, usize>,
    /// Panic inside the first scale call of these applications
    pub panicking_scales: HashSet<String>,
    pub token_error: bool,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: Mutex<HashMap<String, usize>>,
    overlapped: AtomicBool,
    total_calls: AtomicUsize,
}

impl FakeApi {
    pub fn with_applications(names: &[&str]) -> Self {
        Self {
            applications: names.iter().map(|n| Application::named(*n)).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, application: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .map(|c| c.call)
            .filter(|c| match c {
                Call::Sync(app) | Call::Scale(app, _) => app == application,
            })
            .collect()
    }

    pub fn replicas_for(&self, application: &str) -> Vec<u32> {
        self.calls_for(application)
            .into_iter()
            .filter_map(|c| match c {
                Call::Scale(_, replicas) => Some(replicas),
                Call::Sync(_) => None,
            })
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// True if two calls for the same application were ever in flight together
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    async fn record(&self, call: Call) {
        let application = match &call {
            Call::Sync(app) | Call::Scale(app, _) => app.clone(),
        };

        {
            let mut in_flight = self.in_flight.lock().unwrap();
            let count = in_flight.entry(application.clone()).or_insert(0);
            if *count > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            *count += 1;
        }
        self.calls.lock().unwrap().push(RecordedCall {
            call,
            at: Instant::now(),
        });
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        // Simulated network latency
        sleep(Duration::from_millis(1)).await;

        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(count) = in_flight.get_mut(&application) {
            *count -= 1;
        }
    }

    fn scale_count(&self, application: &str) -> usize {
        self.replicas_for(application).len()
    }
}

pub fn api_error(operation: &'static str) -> ApiError {
    ApiError::Decode {
        operation,
        source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
    }
}

#[async_trait]
impl ApplicationApi for FakeApi {
    async fn get_token(&self, _username: &str, _password: &str) -> Result<String, ApiError> {
        if self.token_error {
            return Err(ApiError::MissingToken {
                message: Some("invalid username or password".to_string()),
            });
        }
        Ok("abc123".to_string())
    }

    async fn list_applications(&self, _token: &str) -> Result<Vec<Application>, ApiError> {
        Ok(self.applications.clone())
    }

    async fn sync(&self, _token: &str, application: &str) -> Result<SyncResponse, ApiError> {
        self.record(Call::Sync(application.to_string())).await;
        if self.failing_syncs.contains(application) {
            return Err(api_error("sync"));
        }
        Ok(SyncResponse {
            metadata: None,
            status: ErrorBody::default(),
        })
    }

    async fn update_replicas(
        &self,
        _token: &str,
        replicas: u32,
        application: &str,
    ) -> Result<ResourcePatchResponse, ApiError> {
        self.record(Call::Scale(application.to_string(), replicas))
            .await;
        if self.panicking_scales.contains(application) {
            panic!("scale handler crashed for {}", application);
        }
        if self.failing_scales.get(application) == Some(&self.scale_count(application)) {
            return Err(api_error("update_replicas"));
        }
        Ok(ResourcePatchResponse {
            manifest: None,
            status: ErrorBody::default(),
        })
    }
}

pub fn fast_schedule() -> WorkerSchedule {
    WorkerSchedule {
        settle: Duration::from_millis(1),
        scale_wait: Duration::from_millis(5),
        high_replicas: 2,
        low_replicas: 1,
    }
}

/// Poll `condition` until it holds, failing the test after five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        sleep(Duration::from_millis(2)).await;
    }
}
