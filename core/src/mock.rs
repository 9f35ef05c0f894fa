//! Static mock payloads substituted when the device is unreachable or mock
//! mode is forced.
//!
//! # Design
//! `MockRegistry` maps a logical path to a file under the mock data root; the
//! `/macros/{id}` family is resolved by rule rather than listed. Files are
//! fetched through the same `Transport` as device requests. When a file
//! cannot be loaded, the three endpoints the UI cannot start without (device
//! info, component layout, action catalog) fall back to built-in payloads.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::endpoints::{self, macro_id};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;

const MOCK_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Logical path → mock file (relative to the mock data root).
#[derive(Debug, Clone)]
pub struct MockRegistry {
    files: HashMap<String, String>,
}

impl Default for MockRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (path, file) in [
            (endpoints::CONFIG_COMPONENTS, "config/components.json"),
            (endpoints::CONFIG_ACTIONS, "config/actions.json"),
            (endpoints::CONFIG_EXAMPLE, "config/example.json"),
            (endpoints::CONFIG_INFO, "config/info.json"),
            (endpoints::CONFIG_LEDS, "config/leds.json"),
            (endpoints::CONFIG_REPORTS, "config/reports.json"),
            (endpoints::CONFIG_DISPLAY, "config/display.json"),
            (endpoints::WIFI_STATUS, "config/status.json"),
            (endpoints::MACROS, "macros/index.json"),
        ] {
            registry.insert(path, file);
        }
        registry
    }
}

impl MockRegistry {
    pub fn empty() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    pub fn insert(&mut self, path: &str, file: &str) {
        self.files.insert(path.to_string(), file.to_string());
    }

    /// Mock file for `path`: exact entries first, then the macro rule.
    pub fn file_for(&self, path: &str) -> Option<String> {
        if let Some(file) = self.files.get(path) {
            return Some(file.clone());
        }
        macro_id(path)
            .filter(|id| !id.contains('/'))
            .map(|id| format!("macros/{id}.json"))
    }
}

/// Built-in payloads for endpoints the console cannot start without.
pub fn critical_default(path: &str) -> Option<Value> {
    match path {
        endpoints::CONFIG_INFO => Some(json!({
            "name": "Modular Macropad (Mock)",
            "version": "1.0.0-mock",
            "device_id": "MOCK-123456",
            "features": ["keys", "encoders", "leds", "display"],
            "status": "ready"
        })),
        endpoints::CONFIG_COMPONENTS => Some(json!({
            "rows": 3,
            "cols": 3,
            "encoders": 2,
            "leds": 9,
            "display": true
        })),
        endpoints::CONFIG_ACTIONS => Some(json!({
            "actions": [
                { "id": "press", "name": "Press", "type": "key" },
                { "id": "release", "name": "Release", "type": "key" },
                { "id": "type", "name": "Type", "type": "text" }
            ]
        })),
        _ => None,
    }
}

/// Resolves and loads mock payloads.
#[derive(Clone)]
pub struct MockResolver {
    registry: Arc<MockRegistry>,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl MockResolver {
    pub fn new(registry: MockRegistry, base_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry: Arc::new(registry),
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn has_mock(&self, path: &str) -> bool {
        self.registry.file_for(path).is_some()
    }

    /// Load the mock payload for `path`.
    ///
    /// Fails with `MockUnavailable` when nothing is registered, and with
    /// `MockLoad` when the file cannot be loaded and no built-in default
    /// exists.
    pub async fn fetch_mock(&self, path: &str) -> Result<Value, ApiError> {
        let file = self
            .registry
            .file_for(path)
            .ok_or_else(|| ApiError::MockUnavailable { path: path.to_string() })?;
        let url = format!("{}/{}", self.base_url, file);
        tracing::debug!(%path, %url, "loading mock data");

        match self.load(&url).await {
            Ok(value) => Ok(value),
            Err(reason) => {
                if let Some(value) = critical_default(path) {
                    tracing::info!(%path, %reason, "mock file unavailable, using built-in default");
                    return Ok(value);
                }
                tracing::warn!(%path, %reason, "failed to load mock data");
                Err(ApiError::MockLoad {
                    path: path.to_string(),
                    reason,
                })
            }
        }
    }

    async fn load(&self, url: &str) -> Result<Value, String> {
        let request = HttpRequest::json(HttpMethod::Get, url.to_string(), None);
        let response = tokio::time::timeout(MOCK_LOAD_TIMEOUT, self.transport.send(request))
            .await
            .map_err(|_| format!("timed out loading {url}"))?
            .map_err(|e| e.to_string())?;
        if !response.is_success() {
            return Err(format!("HTTP {} loading {url}", response.status));
        }
        serde_json::from_str(&response.body).map_err(|e| format!("invalid JSON in {url}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;

    fn resolver(transport: &ScriptedTransport) -> MockResolver {
        MockResolver::new(
            MockRegistry::default(),
            "http://console/mock_data/",
            Arc::new(transport.clone()),
        )
    }

    #[test]
    fn registry_resolves_exact_and_macro_paths() {
        let registry = MockRegistry::default();
        assert_eq!(registry.file_for("/config/leds").as_deref(), Some("config/leds.json"));
        assert_eq!(registry.file_for("/wifi/status").as_deref(), Some("config/status.json"));
        assert_eq!(registry.file_for("/macros").as_deref(), Some("macros/index.json"));
        assert_eq!(registry.file_for("/macros/2_copy").as_deref(), Some("macros/2_copy.json"));
        assert_eq!(registry.file_for("/macros/a/b"), None);
        assert_eq!(registry.file_for("/wifi/scan"), None);
    }

    #[tokio::test]
    async fn fetches_mock_file_through_transport() {
        let t = ScriptedTransport::new();
        t.respond("/mock_data/config/leds.json", 200, r#"{"leds":{"brightness":127}}"#);

        let value = resolver(&t).fetch_mock("/config/leds").await.unwrap();
        assert_eq!(value["leds"]["brightness"], 127);
        assert_eq!(
            t.last_request("leds.json").unwrap().url,
            "http://console/mock_data/config/leds.json"
        );
    }

    #[tokio::test]
    async fn unmapped_endpoint_is_unavailable() {
        let t = ScriptedTransport::new();
        let r = resolver(&t);
        assert!(!r.has_mock("/wifi/scan"));
        let err = r.fetch_mock("/wifi/scan").await.unwrap_err();
        assert!(matches!(err, ApiError::MockUnavailable { .. }));
        assert!(t.requests().is_empty());
    }

    #[tokio::test]
    async fn critical_endpoints_fall_back_to_builtin_payload() {
        let t = ScriptedTransport::new();
        t.respond("/mock_data/config/info.json", 404, "");

        let value = resolver(&t).fetch_mock("/config/info").await.unwrap();
        assert_eq!(value["device_id"], "MOCK-123456");
    }

    #[tokio::test]
    async fn non_critical_load_failure_propagates() {
        let t = ScriptedTransport::new();
        t.respond("/mock_data/config/display.json", 200, "<html>");

        let err = resolver(&t).fetch_mock("/config/display").await.unwrap_err();
        assert!(matches!(err, ApiError::MockLoad { ref path, .. } if path == "/config/display"));
    }
}
