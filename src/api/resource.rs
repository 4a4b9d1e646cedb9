// src/api/resource.rs
use crate::config::TargetResourceConfig;
use serde_json::json;
use url::Url;

pub const MERGE_PATCH_TYPE: &str = "application/merge-patch+json";

/// The workload inside an application whose replica count gets patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResource {
    config: TargetResourceConfig,
}

impl Default for TargetResource {
    fn default() -> Self {
        Self::new(TargetResourceConfig::default())
    }
}

impl TargetResource {
    pub fn new(config: TargetResourceConfig) -> Self {
        Self { config }
    }

    pub fn resource_name(&self, application: &str) -> String {
        format!("{}{}", application, self.config.name_suffix)
    }

    /// `POST {host}/api/v1/applications/{app}/resource?name=..&patchType=..`
    ///
    /// Pure in `(base, application)`: no clock, counter or token goes in.
    pub fn patch_url(&self, base: &Url, application: &str) -> Url {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "v1", "applications", application, "resource"]);
        }

        let resource_name = self.resource_name(application);
        url.query_pairs_mut()
            .append_pair("name", &resource_name)
            .append_pair("namespace", &self.config.namespace)
            .append_pair("resourceName", &resource_name)
            .append_pair("version", &self.config.version)
            .append_pair("kind", &self.config.kind)
            .append_pair("group", &self.config.group)
            .append_pair("patchType", MERGE_PATCH_TYPE);
        url
    }
}

/// Merge patch document setting `spec.replicas`.
pub fn replicas_patch(replicas: u32) -> serde_json::Value {
    json!({ "spec": { "replicas": replicas } })
}

/// The resource endpoint takes the patch document as a JSON string value,
/// so the patch is serialized twice.
pub fn replicas_patch_body(replicas: u32) -> Result<Vec<u8>, serde_json::Error> {
    let patch = serde_json::to_string(&replicas_patch(replicas))?;
    serde_json::to_vec(&patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_url_default_target() {
        let base = Url::parse("http://localhost:8080").unwrap();
        let url = TargetResource::default().patch_url(&base, "app1");

        assert_eq!(url.path(), "/api/v1/applications/app1/resource");
        assert_eq!(
            url.query(),
            Some(
                "name=app1-helm-guestbook&namespace=argocd&resourceName=app1-helm-guestbook\
                 &version=v1&kind=Deployment&group=apps\
                 &patchType=application%2Fmerge-patch%2Bjson"
            )
        );
    }

    #[test]
    fn test_patch_url_is_deterministic() {
        let base = Url::parse("https://argocd.example.test/").unwrap();
        let target = TargetResource::default();

        assert_eq!(
            target.patch_url(&base, "guestbook"),
            target.patch_url(&base, "guestbook")
        );
    }

    #[test]
    fn test_patch_url_keeps_base_path_prefix() {
        let base = Url::parse("https://example.test/argo-cd/").unwrap();
        let url = TargetResource::default().patch_url(&base, "app2");
        assert_eq!(url.path(), "/argo-cd/api/v1/applications/app2/resource");
    }

    #[test]
    fn test_custom_target() {
        let target = TargetResource::new(TargetResourceConfig {
            name_suffix: "-web".to_string(),
            namespace: "shop".to_string(),
            kind: "StatefulSet".to_string(),
            group: "apps".to_string(),
            version: "v1".to_string(),
        });
        let base = Url::parse("http://localhost:8080").unwrap();
        let url = target.patch_url(&base, "store");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("name".to_string(), "store-web".to_string())));
        assert!(pairs.contains(&("namespace".to_string(), "shop".to_string())));
        assert!(pairs.contains(&("kind".to_string(), "StatefulSet".to_string())));
    }

    #[test]
    fn test_patch_body_is_json_string() {
        let body = replicas_patch_body(2).unwrap();
        assert_eq!(
            String::from_utf8(body).unwrap(),
            r#""{\"spec\":{\"replicas\":2}}""#
        );
    }
}
