//! Client configuration.

use std::time::Duration;

use super::endpoints::Endpoints;
use crate::types::BaseUrl;

/// Default transport timeout. A hung refresh holds every waiter until this elapses.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL.
    pub base_url: BaseUrl,
    /// Endpoint paths.
    pub endpoints: Endpoints,
    /// Per-request transport timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            endpoints: Endpoints::default(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("palaver/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}
