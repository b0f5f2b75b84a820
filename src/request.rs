use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE},
    Method, Url,
};
use serde::Serialize;

use crate::{Result, TenableError};

/// A fully built request that can be sent any number of times.
///
/// The body is captured once as an immutable buffer; every clone shares the
/// same bytes, so each retry presents exactly what the first attempt sent.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl PreparedRequest {
    /// Creates a body-less request.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Parses `url` and creates a body-less request.
    pub fn parse(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|err| TenableError::Construction(format!("invalid url '{url}': {err}")))?;
        Ok(Self::new(method, url))
    }

    /// Serializes `body` as JSON and sets `Content-Type: application/json`.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let encoded = serde_json::to_vec(body).map_err(|err| {
            TenableError::Construction(format!("unable to serialize request body: {err}"))
        })?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(Bytes::from(encoded));
        Ok(self)
    }

    /// Sets a raw body without touching headers.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets `Accept: application/json`.
    pub fn accept_json(mut self) -> Self {
        self.headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        self
    }

    /// Inserts a header, replacing any previous value.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self> {
        let value = HeaderValue::from_str(value).map_err(|err| {
            TenableError::Construction(format!("invalid value for header {name}: {err}"))
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Appends a query parameter to the URL.
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }

    /// Lossy UTF-8 rendering of the body for diagnostics.
    pub fn body_snapshot(&self) -> String {
        self.body
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }
}
