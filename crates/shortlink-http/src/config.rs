// Client configuration
//
// RemoteConfig covers the HTTP side; ClientConfig bundles it with the
// dispatcher settings so the binary can load everything from one place.

use shortlink_dispatch::DispatcherConfig;
use std::env;
use std::time::Duration;

/// Staging deployment of the shortlink service
pub const DEFAULT_BASE_URL: &str = "https://staging-link.inawo.live";

/// Per-request HTTP timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Where and how to reach the shortlink service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Service root, without a trailing slash
    pub base_url: String,

    /// Applied to every request, connect included
    pub request_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl RemoteConfig {
    /// Create configuration from environment variables
    ///
    /// - `SHORTLINK_BASE_URL`: service root (default: staging)
    /// - `SHORTLINK_REQUEST_TIMEOUT_MS`: per-request timeout (default: 3000)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = env::var("SHORTLINK_BASE_URL") {
            if !base_url.trim().is_empty() {
                config = config.with_base_url(base_url);
            }
        }
        if let Some(ms) = env::var("SHORTLINK_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config = config.with_request_timeout(Duration::from_millis(ms));
        }

        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout.max(Duration::from_millis(1));
        self
    }
}

/// Everything needed to stand up a dispatcher in front of the HTTP service
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub remote: RemoteConfig,
    pub dispatcher: DispatcherConfig,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            remote: RemoteConfig::from_env(),
            dispatcher: DispatcherConfig::from_env(),
        }
    }

    pub fn with_remote(mut self, remote: RemoteConfig) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: DispatcherConfig) -> Self {
        self.dispatcher = dispatcher;
        self
    }
}
