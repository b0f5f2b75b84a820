//! `tenable-http` is an async client for the Tenable.io / Nessus API.
//!
//! The backend answers its own internal faults with arbitrary status codes
//! and enforces undocumented rate limits, so every call goes through the
//! [`Executor`]:
//! - any non-2xx status is retried, up to 10 attempts, with jittered
//!   exponential backoff ([`Backoff`])
//! - `429` responses honor an integer `retry-after` header exactly
//! - transport failures, decode failures and cancellation end the call at once
//!
//! Multi-page search endpoints are aggregated by [`paginate::collect_pages`].

mod auth;
mod backoff;
mod cancel;
mod client;
mod error;
mod executor;
mod options;
pub mod paginate;
mod request;
mod transport;
mod types;
mod wire;

pub use auth::{ApiKeyAuth, AuthProvider, NoAuth};
pub use backoff::Backoff;
pub use cancel::CancelToken;
pub use client::TenableClient;
pub use error::{BoxError, TenableError};
pub use executor::Executor;
pub use options::{BackoffOptions, ClientOptions, DEFAULT_BASE_URL};
pub use request::PreparedRequest;
pub use transport::{RawResponse, Transport};
pub use types::{
    Asset, AssetTag, CvssScore, Finding, FindingDefinition, Host, Network, ObservationSource,
    PersistedScan, Plugin, PluginAttribute, PluginOutput, PluginOutputResponse, Policy,
    PolicySettings, Scan, ScanDetail, ScanInfo, ScanSettings, ScanTemplate, Vulnerability,
};

pub type Result<T> = std::result::Result<T, TenableError>;
