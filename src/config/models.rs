// src/config/models.rs
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosConfig {
    /// Argo CD API server, e.g. `https://argocd.example.com`
    pub host: String,
    pub username: String,
    pub password: String,
    /// Number of applications driven concurrently
    pub threads: usize,
    /// Accept self-signed certificates. Only meant for disposable dev clusters.
    pub insecure_skip_verify: bool,
    pub schedule: ScheduleConfig,
    pub target: TargetResourceConfig,
    pub sync: SyncConfig,
    pub replicas: ReplicaConfig,
    pub metrics: MetricsConfig,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:8080".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            threads: 1,
            insecure_skip_verify: true,
            schedule: ScheduleConfig::default(),
            target: TargetResourceConfig::default(),
            sync: SyncConfig::default(),
            replicas: ReplicaConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl ChaosConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            bail!("threads must be a positive integer");
        }

        let host = match Url::parse(&self.host) {
            Ok(url) => url,
            Err(e) => bail!("invalid host {:?}: {}", self.host, e),
        };
        if host.scheme() != "http" && host.scheme() != "https" {
            bail!("host must use http or https, got {}", host.scheme());
        }

        if self.schedule.scale_wait_secs == 0 {
            bail!("schedule.scale_wait_secs must be greater than zero");
        }

        if self.replicas.high == self.replicas.low {
            bail!(
                "replicas.high and replicas.low must differ (both are {})",
                self.replicas.high
            );
        }

        for (field, value) in [
            ("target.namespace", &self.target.namespace),
            ("target.kind", &self.target.kind),
            ("target.version", &self.target.version),
        ] {
            if value.trim().is_empty() {
                bail!("{} must not be empty", field);
            }
        }

        if !self.metrics.path.starts_with('/') {
            bail!("metrics.path must start with '/'");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Pause after each initial sync before the next worker starts
    pub settle_secs: u64,
    /// Pause after every replica change
    pub scale_wait_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            settle_secs: 5,
            scale_wait_secs: 30,
        }
    }
}

impl ScheduleConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn scale_wait(&self) -> Duration {
        Duration::from_secs(self.scale_wait_secs)
    }
}

/// Addresses the workload patched inside every application.
/// The resource name is `<application><name_suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetResourceConfig {
    pub name_suffix: String,
    pub namespace: String,
    pub kind: String,
    pub group: String,
    pub version: String,
}

impl Default for TargetResourceConfig {
    fn default() -> Self {
        Self {
            name_suffix: "-helm-guestbook".to_string(),
            namespace: "argocd".to_string(),
            kind: "Deployment".to_string(),
            group: "apps".to_string(),
            version: "v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub revision: String,
    pub sync_options: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            revision: "master".to_string(),
            sync_options: vec!["CreateNamespace=true".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicaConfig {
    pub high: u32,
    pub low: u32,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self { high: 2, low: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
            path: "/metrics".to_string(),
        }
    }
}
