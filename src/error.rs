/// Boxed error produced by a [`Transport`](crate::Transport) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum TenableError {
    /// The request could not be built (bad URL, unserializable body, invalid header).
    #[error("request construction error: {0}")]
    Construction(String),
    /// Network or connection level failure. Never retried.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
    /// Every attempt of the call returned a non-success status.
    #[error("retry limit exceeded after {attempts} attempts (last status {last_status}): {last_body}")]
    RetryLimitExceeded {
        /// Number of attempts performed.
        attempts: usize,
        /// Status code of the final attempt.
        last_status: u16,
        /// Response body of the final attempt.
        last_body: String,
    },
    /// Response was successful but the body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// The call's cancel token or deadline fired.
    #[error("call canceled")]
    Canceled,
    /// Auth provider setup failed.
    #[error("auth provider setup failed: {0}")]
    Auth(String),
    /// A lookup by name found nothing.
    #[error("not found: {0}")]
    NotFound(String),
    /// A lookup by name found more than one match.
    #[error("more than one match for '{name}' ({count})")]
    Ambiguous { name: String, count: usize },
}

impl TenableError {
    /// Returns the last observed HTTP status, when the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RetryLimitExceeded { last_status, .. } => Some(*last_status),
            _ => None,
        }
    }
}
