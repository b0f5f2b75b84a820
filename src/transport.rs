//! Transport seam between the executor and the network.
//!
//! The executor only needs "send these bytes, give me status, headers and the
//! whole body back". `reqwest::Client` is the production implementation;
//! tests plug in scripted transports.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;

use crate::{BoxError, PreparedRequest};

/// A fully buffered HTTP response.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    /// Lossy UTF-8 rendering of the body for diagnostics.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one request and returns the buffered response.
///
/// Errors returned here are failures to obtain a response; HTTP error
/// statuses must be returned as `Ok` responses so the executor can classify
/// them, even when their body could not be read.
/// Implementations must be safe to share between concurrent calls.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, BoxError>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, BoxError> {
        let mut builder = self
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        // An error status is classified by its code alone, so a body cut off
        // mid-stream must not turn a retryable failure into a fatal one.
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(_read_error) if status >= 300 => {
                #[cfg(feature = "tracing")]
                tracing::warn!(status, error = %_read_error, "failed to read error response body");
                Bytes::new()
            }
            Err(read_error) => return Err(read_error.into()),
        };

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
