use std::{fmt, sync::Arc, time::Duration};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::{
    backoff::Backoff, AuthProvider, BoxError, CancelToken, ClientOptions, PreparedRequest,
    RawResponse, Result, TenableError, Transport,
};

/// Classified result of a single attempt.
#[derive(Debug)]
pub(crate) enum Outcome {
    Success(RawResponse),
    RateLimited {
        retry_after: Option<Duration>,
        response: RawResponse,
    },
    RetryableFailure(RawResponse),
    TransportFailure(BoxError),
}

impl Outcome {
    // The backend reports its own faults with arbitrary statuses (404 for a
    // scan it failed to create, spurious 403s, 500s under load), so anything
    // that is not 2xx or 429 is retried the same way.
    pub(crate) fn classify(sent: std::result::Result<RawResponse, BoxError>) -> Self {
        let response = match sent {
            Ok(response) => response,
            Err(err) => return Self::TransportFailure(err),
        };

        if response.status < 300 {
            Self::Success(response)
        } else if response.status == StatusCode::TOO_MANY_REQUESTS.as_u16() {
            Self::RateLimited {
                retry_after: retry_after(&response),
                response,
            }
        } else {
            Self::RetryableFailure(response)
        }
    }
}

/// Reads `retry-after` as a whole number of seconds.
fn retry_after(response: &RawResponse) -> Option<Duration> {
    let raw = response.headers.get(reqwest::header::RETRY_AFTER)?;
    match raw.to_str().ok().and_then(|value| value.trim().parse::<u64>().ok()) {
        Some(secs) => Some(Duration::from_secs(secs)),
        None => {
            #[cfg(feature = "tracing")]
            tracing::warn!(value = ?raw, "ignoring unparsable retry-after header");
            None
        }
    }
}

/// Runs prepared requests against the API with the retry policy applied.
///
/// Cheap to clone; clones share the transport and the auth provider.
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
    auth: Arc<dyn AuthProvider>,
    options: ClientOptions,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Executor {
    pub fn new(
        transport: Arc<dyn Transport>,
        auth: Arc<dyn AuthProvider>,
        options: ClientOptions,
    ) -> Self {
        Self {
            transport,
            auth,
            options,
        }
    }

    /// Timeout, attempt ceiling and backoff shape applied to every call.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sends `request` and decodes the successful JSON body into `T`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: &PreparedRequest,
        cancel: &CancelToken,
    ) -> Result<T> {
        let response = self.send(request, cancel).await?;
        decode_body(&response)
    }

    /// Sends `request` and ignores the successful body.
    pub async fn execute_discard(
        &self,
        request: &PreparedRequest,
        cancel: &CancelToken,
    ) -> Result<()> {
        self.send(request, cancel).await.map(drop)
    }

    /// Sends `request` until it succeeds, the attempt budget runs out, a
    /// transport failure occurs or `cancel` fires.
    ///
    /// Auth headers are applied to a fresh copy of the request before every
    /// attempt. The body buffer is shared by all copies.
    pub async fn send(&self, request: &PreparedRequest, cancel: &CancelToken) -> Result<RawResponse> {
        let max_attempts = self.options.max_attempts.max(1);
        let mut backoff = Backoff::new(&self.options.backoff);
        let mut attempt = 0usize;

        loop {
            if cancel.is_canceled() {
                return Err(TenableError::Canceled);
            }
            attempt += 1;

            let mut outgoing = request.clone();
            self.auth.add_auth_headers(&mut outgoing);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                attempt,
                max_attempts,
                "sending request"
            );

            let timeout = Duration::from_millis(self.options.timeout_ms);
            let sent = tokio::select! {
                biased;
                _ = cancel.canceled() => return Err(TenableError::Canceled),
                sent = tokio::time::timeout(timeout, self.transport.send(outgoing)) => {
                    sent.unwrap_or_else(|elapsed| Err(elapsed.into()))
                }
            };

            let (wait, failed) = match Outcome::classify(sent) {
                Outcome::Success(response) => return Ok(response),
                Outcome::TransportFailure(err) => return Err(TenableError::Transport(err)),
                Outcome::RateLimited {
                    retry_after,
                    response,
                } => {
                    // Backoff advances on every failure, even when the server
                    // dictates the wait.
                    let computed = backoff.next_wait();
                    let wait = retry_after.unwrap_or(computed);

                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        url = %request.url,
                        request_body = %request.body_snapshot(),
                        status = response.status,
                        response_body = %response.body_text(),
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        from_retry_after = retry_after.is_some(),
                        "rate limit exceeded, retrying"
                    );

                    (wait, response)
                }
                Outcome::RetryableFailure(response) => {
                    let wait = backoff.next_wait();

                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        url = %request.url,
                        request_body = %request.body_snapshot(),
                        status = response.status,
                        response_body = %response.body_text(),
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        "unexpected status code, retrying"
                    );

                    (wait, response)
                }
            };

            if attempt >= max_attempts {
                return Err(TenableError::RetryLimitExceeded {
                    attempts: attempt,
                    last_status: failed.status,
                    last_body: failed.body_text(),
                });
            }
            drop(failed);

            tokio::select! {
                biased;
                _ = cancel.canceled() => return Err(TenableError::Canceled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}

pub(crate) fn decode_body<T: DeserializeOwned>(response: &RawResponse) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|err| {
        TenableError::Decode(format!(
            "invalid response JSON: {err}; body: {}",
            response.body_text()
        ))
    })
}
