use std::time::Duration;

/// Base URL of the Tenable.io cloud API.
pub const DEFAULT_BASE_URL: &str = "https://cloud.tenable.com";

/// Configures timeout, retry and TLS behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of attempts per call, including the first one.
    pub max_attempts: usize,
    /// Backoff shape used between attempts.
    pub backoff: BackoffOptions,
    /// Accept invalid TLS certificates (self-hosted Nessus scanners).
    pub allow_insecure: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_attempts: 10,
            backoff: BackoffOptions::default(),
            allow_insecure: false,
        }
    }
}

/// Exponential backoff parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct BackoffOptions {
    /// Lower bound of every wait.
    pub min: Duration,
    /// Upper bound of every wait.
    pub max: Duration,
    /// Growth factor applied per attempt.
    pub factor: f64,
    /// Randomize each wait between `min` and the attempt's bound.
    pub jitter: bool,
}

impl Default for BackoffOptions {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(100),
            max: Duration::from_secs(60),
            factor: 1.5,
            jitter: true,
        }
    }
}
