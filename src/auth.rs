use std::fmt;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderName, HeaderValue},
    Url,
};

use crate::{PreparedRequest, Result, TenableError, Transport};

/// Supplies credentials for every outgoing request.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// One-time setup against the API, run while the client is built.
    async fn prepare(&mut self, _base_url: &Url, _transport: &dyn Transport) -> Result<()> {
        Ok(())
    }

    /// Adds credential headers. Called before every attempt, retries included.
    fn add_auth_headers(&self, request: &mut PreparedRequest);
}

/// Tenable.io API key authentication (`X-ApiKeys` header).
#[derive(Clone)]
pub struct ApiKeyAuth {
    header: HeaderValue,
}

impl fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("header", &"<redacted>")
            .finish()
    }
}

impl ApiKeyAuth {
    const HEADER: HeaderName = HeaderName::from_static("x-apikeys");

    pub fn new(access_key: &str, secret_key: &str) -> Result<Self> {
        let access_key = access_key.trim();
        let secret_key = secret_key.trim();
        if access_key.is_empty() || secret_key.is_empty() {
            return Err(TenableError::Construction(
                "access key and secret key must not be empty".to_owned(),
            ));
        }

        let mut header =
            HeaderValue::from_str(&format!("accessKey={access_key};secretKey={secret_key}"))
                .map_err(|err| {
                    TenableError::Construction(format!("invalid API key characters: {err}"))
                })?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

impl AuthProvider for ApiKeyAuth {
    fn add_auth_headers(&self, request: &mut PreparedRequest) {
        request.headers.insert(Self::HEADER, self.header.clone());
    }
}

/// Sends requests without credentials.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn add_auth_headers(&self, _request: &mut PreparedRequest) {}
}
