// Dispatcher configuration
//
// Defaults: one worker behind a single-slot queue, reconciled every 5 s,
// with a 1 s submission window and no result deadline.

use std::env;
use std::time::Duration;

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Desired worker count at startup; these workers are spawned immediately
    pub initial_pool_size: usize,

    /// Dispatch queue capacity; submit blocks while the queue is full
    pub queue_capacity: usize,

    /// Pool controller tick
    pub control_interval: Duration,

    /// Submission counter reset period
    pub submission_window: Duration,

    /// Default deadline for submit, covering enqueue and result wait.
    /// `None` waits indefinitely.
    pub result_timeout: Option<Duration>,

    /// Run length and syntax checks before dispatching a shorten request
    pub validate_urls: bool,

    /// Also resolve the URL's host before dispatching
    pub check_host_exists: bool,

    /// Pool actor mailbox size
    pub command_buffer: usize,

    /// How long shutdown waits for workers to drain
    pub shutdown_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            initial_pool_size: 1,
            queue_capacity: 1,
            control_interval: Duration::from_secs(5),
            submission_window: Duration::from_secs(1),
            result_timeout: None,
            validate_urls: true,
            check_host_exists: false,
            command_buffer: 64,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl DispatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables (all optional, unparsable values fall back to defaults):
    /// - `SHORTLINK_POOL_SIZE`: initial desired worker count
    /// - `SHORTLINK_QUEUE_CAPACITY`: dispatch queue capacity
    /// - `SHORTLINK_CONTROL_INTERVAL_MS`: controller tick in milliseconds
    /// - `SHORTLINK_RESULT_TIMEOUT_MS`: default submit deadline in milliseconds
    /// - `SHORTLINK_VALIDATE_URLS`: `true`/`1` to validate before dispatch
    /// - `SHORTLINK_CHECK_HOST_EXISTS`: `true`/`1` to resolve hosts before dispatch
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut config = Self {
            initial_pool_size: env_parse("SHORTLINK_POOL_SIZE")
                .unwrap_or(defaults.initial_pool_size),
            validate_urls: env_flag("SHORTLINK_VALIDATE_URLS").unwrap_or(defaults.validate_urls),
            check_host_exists: env_flag("SHORTLINK_CHECK_HOST_EXISTS")
                .unwrap_or(defaults.check_host_exists),
            ..defaults
        };

        if let Some(capacity) = env_parse("SHORTLINK_QUEUE_CAPACITY") {
            config = config.with_queue_capacity(capacity);
        }
        if let Some(ms) = env_parse::<u64>("SHORTLINK_CONTROL_INTERVAL_MS") {
            config = config.with_control_interval(Duration::from_millis(ms));
        }
        if let Some(ms) = env_parse::<u64>("SHORTLINK_RESULT_TIMEOUT_MS") {
            config = config.with_result_timeout(Duration::from_millis(ms));
        }

        config
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.initial_pool_size = size;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_control_interval(mut self, interval: Duration) -> Self {
        self.control_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_submission_window(mut self, window: Duration) -> Self {
        self.submission_window = window.max(Duration::from_millis(1));
        self
    }

    pub fn with_result_timeout(mut self, timeout: Duration) -> Self {
        self.result_timeout = Some(timeout);
        self
    }

    /// Wait for results indefinitely
    pub fn without_result_timeout(mut self) -> Self {
        self.result_timeout = None;
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_urls = enabled;
        self
    }

    pub fn with_host_check(mut self, enabled: bool) -> Self {
        self.check_host_exists = enabled;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}
