//! The explicitly constructed context every API call runs against.
//!
//! `ApiContext` bundles the transport, the shared connection tracker, the
//! mock resolver and the retry knobs. It is built once by the host and passed
//! down; tests build as many independent contexts as they need.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ConsoleConfig;
use crate::error::TransportError;
use crate::mock::{MockRegistry, MockResolver};
use crate::status::{ConnectionTracker, FileSwitch, MockSwitch, SharedSwitch};
use crate::transport::{ReqwestTransport, Transport};

/// Retry budget shared by every call made through one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total dispatches per call, the first attempt included.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Clone)]
pub struct ApiContext {
    pub(crate) device_url: String,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) tracker: ConnectionTracker,
    pub(crate) mocks: MockResolver,
    pub(crate) retry: RetryPolicy,
    pub(crate) default_timeout: Duration,
    pub(crate) fallback_to_mock: bool,
}

impl ApiContext {
    pub fn builder(device_url: &str, transport: Arc<dyn Transport>) -> ApiContextBuilder {
        ApiContextBuilder::new(device_url, transport)
    }

    /// Production context talking to the device over HTTP.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, TransportError> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
        let switch: Arc<dyn MockSwitch> = match &config.force_mock_file {
            Some(path) => Arc::new(FileSwitch::new(path)),
            None => Arc::new(SharedSwitch::new(config.force_mock)),
        };
        Ok(Self::builder(&config.device_url, transport)
            .mock_data_url(&config.mock_data_url)
            .mock_switch(switch)
            .retry_policy(RetryPolicy {
                max_attempts: config.max_attempts,
                backoff: config.retry_backoff(),
            })
            .default_timeout(config.request_timeout())
            .fallback_to_mock(config.fallback_to_mock)
            .build())
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    pub fn mocks(&self) -> &MockResolver {
        &self.mocks
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn device_url(&self) -> &str {
        &self.device_url
    }
}

impl std::fmt::Debug for ApiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiContext")
            .field("device_url", &self.device_url)
            .field("retry", &self.retry)
            .field("default_timeout", &self.default_timeout)
            .field("fallback_to_mock", &self.fallback_to_mock)
            .finish_non_exhaustive()
    }
}

pub struct ApiContextBuilder {
    device_url: String,
    mock_data_url: Option<String>,
    transport: Arc<dyn Transport>,
    switch: Arc<dyn MockSwitch>,
    registry: MockRegistry,
    retry: RetryPolicy,
    default_timeout: Duration,
    fallback_to_mock: bool,
}

impl ApiContextBuilder {
    fn new(device_url: &str, transport: Arc<dyn Transport>) -> Self {
        let defaults = ConsoleConfig::default();
        Self {
            device_url: device_url.trim_end_matches('/').to_string(),
            mock_data_url: None,
            transport,
            switch: Arc::new(SharedSwitch::new(false)),
            registry: MockRegistry::default(),
            retry: RetryPolicy::default(),
            default_timeout: defaults.request_timeout(),
            fallback_to_mock: defaults.fallback_to_mock,
        }
    }

    pub fn mock_data_url(mut self, url: &str) -> Self {
        self.mock_data_url = Some(url.to_string());
        self
    }

    pub fn mock_switch(mut self, switch: Arc<dyn MockSwitch>) -> Self {
        self.switch = switch;
        self
    }

    pub fn mock_registry(mut self, registry: MockRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn fallback_to_mock(mut self, enabled: bool) -> Self {
        self.fallback_to_mock = enabled;
        self
    }

    pub fn build(self) -> ApiContext {
        let mock_data_url = self
            .mock_data_url
            .unwrap_or_else(|| ConsoleConfig::default().mock_data_url);
        ApiContext {
            mocks: MockResolver::new(self.registry, &mock_data_url, self.transport.clone()),
            tracker: ConnectionTracker::new(self.switch),
            device_url: self.device_url,
            transport: self.transport,
            retry: self.retry,
            default_timeout: self.default_timeout,
            fallback_to_mock: self.fallback_to_mock,
        }
    }
}
