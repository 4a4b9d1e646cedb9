// src/api/models.rs
use serde::{Deserialize, Serialize};

/// Error envelope returned by the Argo CD API gateway. The same fields can
/// show up inside an otherwise successful body, so every response embeds it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn describe(&self) -> Option<String> {
        self.message.clone().or_else(|| self.error.clone())
    }
}

#[derive(Debug, Serialize)]
pub struct SessionRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(flatten)]
    pub status: ErrorBody,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Application {
    #[serde(default)]
    pub metadata: ObjectMeta,
}

impl Application {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                namespace: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationList {
    /// The API sends `null` rather than `[]` when nothing is visible
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Application>,
    #[serde(flatten)]
    pub status: ErrorBody,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Application>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Application>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize)]
pub struct HookStrategy {
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStrategy {
    pub hook: HookStrategy,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncOptions {
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub revision: String,
    pub prune: bool,
    pub dry_run: bool,
    pub strategy: SyncStrategy,
    pub resources: Option<Vec<serde_json::Value>>,
    pub sync_options: SyncOptions,
}

impl SyncRequest {
    /// Forced, non-pruning, non-dry-run sync of the whole application.
    pub fn forced(revision: impl Into<String>, sync_options: Vec<String>) -> Self {
        Self {
            revision: revision.into(),
            prune: false,
            dry_run: false,
            strategy: SyncStrategy {
                hook: HookStrategy { force: false },
            },
            resources: None,
            sync_options: SyncOptions {
                items: sync_options,
            },
        }
    }
}

/// Sync answers with the full Application; only the bits worth logging are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub metadata: Option<ObjectMeta>,
    #[serde(flatten)]
    pub status: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourcePatchResponse {
    /// Live manifest after the patch, as a JSON string
    #[serde(default)]
    pub manifest: Option<String>,
    #[serde(flatten)]
    pub status: ErrorBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sync_request_wire_shape() {
        let request = SyncRequest::forced("master", vec!["CreateNamespace=true".to_string()]);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "revision": "master",
                "prune": false,
                "dryRun": false,
                "strategy": {"hook": {"force": false}},
                "resources": null,
                "syncOptions": {"items": ["CreateNamespace=true"]}
            })
        );
    }

    #[test]
    fn test_application_list_null_items() {
        let list: ApplicationList =
            serde_json::from_str(r#"{"metadata": {}, "items": null}"#).unwrap();
        assert!(list.items.is_empty());

        let list: ApplicationList = serde_json::from_str(r#"{"metadata": {}}"#).unwrap();
        assert!(list.items.is_empty());
    }

    #[test]
    fn test_application_list_keeps_order() {
        let list: ApplicationList = serde_json::from_value(json!({
            "items": [
                {"metadata": {"name": "app1", "namespace": "argocd"}, "spec": {}},
                {"metadata": {"name": "app2"}},
            ]
        }))
        .unwrap();

        let names: Vec<&str> = list.items.iter().map(Application::name).collect();
        assert_eq!(names, ["app1", "app2"]);
        assert_eq!(list.items[0].metadata.namespace.as_deref(), Some("argocd"));
    }

    #[test]
    fn test_error_body_is_captured_from_any_response() {
        let response: SyncResponse = serde_json::from_value(json!({
            "error": "permission denied",
            "code": 7,
            "message": "permission denied: applications, sync, default/app1"
        }))
        .unwrap();

        assert!(response.metadata.is_none());
        assert_eq!(response.status.code, Some(7));
        assert_eq!(
            response.status.describe().as_deref(),
            Some("permission denied: applications, sync, default/app1")
        );
    }
}
