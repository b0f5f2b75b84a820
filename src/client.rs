use std::{fmt, sync::Arc};

use reqwest::{Method, Url};

use crate::{
    options::DEFAULT_BASE_URL,
    paginate::paginate,
    wire::{
        AssetsEnvelope, FindingsEnvelope, ScanEnvelope, ScansEnvelope, SearchRequest,
        TemplatesEnvelope, FINDING_FIELDS,
    },
    ApiKeyAuth, Asset, AuthProvider, CancelToken, ClientOptions, Executor, Finding,
    PersistedScan, Plugin, PluginOutputResponse, Policy, PreparedRequest, Result, Scan,
    ScanDetail, ScanTemplate, TenableError, Transport,
};

#[derive(Clone)]
/// Client for the Tenable.io / Nessus REST API.
///
/// Every endpoint goes through the shared [`Executor`], so each call gets the
/// full retry and rate-limit policy. Every method has a `*_with_cancel`
/// variant that stops the call when the given [`CancelToken`] fires.
pub struct TenableClient {
    base_url: String,
    executor: Executor,
}

impl fmt::Debug for TenableClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenableClient")
            .field("base_url", &self.base_url)
            .field("executor", &self.executor)
            .finish()
    }
}

impl TenableClient {
    /// Creates a client with default options over a `reqwest` transport.
    pub async fn connect<A>(base_url: &str, auth: A) -> Result<Self>
    where
        A: AuthProvider + 'static,
    {
        Self::connect_with_options(base_url, auth, ClientOptions::default()).await
    }

    /// Creates a client over a `reqwest` transport built from `options`.
    pub async fn connect_with_options<A>(
        base_url: &str,
        auth: A,
        options: ClientOptions,
    ) -> Result<Self>
    where
        A: AuthProvider + 'static,
    {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(options.allow_insecure)
            .build()
            .map_err(|err| {
                TenableError::Construction(format!("unable to build HTTP client: {err}"))
            })?;
        Self::with_transport(base_url, auth, http, options).await
    }

    /// Creates a client over any [`Transport`].
    ///
    /// Runs [`AuthProvider::prepare`] once before the client is returned.
    pub async fn with_transport<A, T>(
        base_url: &str,
        mut auth: A,
        transport: T,
        options: ClientOptions,
    ) -> Result<Self>
    where
        A: AuthProvider + 'static,
        T: Transport + 'static,
    {
        let base_url = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(base_url).map_err(|err| {
            TenableError::Construction(format!("invalid base url '{base_url}': {err}"))
        })?;

        auth.prepare(&parsed, &transport)
            .await
            .map_err(|err| TenableError::Auth(err.to_string()))?;

        Ok(Self {
            base_url: base_url.to_owned(),
            executor: Executor::new(Arc::new(transport), Arc::new(auth), options),
        })
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `TENABLE_URL` — API base URL, defaults to `https://cloud.tenable.com`
    /// - `TENABLE_ACCESS_KEY` / `TENABLE_SECRET_KEY` — API key pair
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn run() -> tenable_http::Result<()> {
    /// let client = tenable_http::TenableClient::from_env().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from_env() -> Result<Self> {
        let base_url = std::env::var("TENABLE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let access_key = required_env("TENABLE_ACCESS_KEY")?;
        let secret_key = required_env("TENABLE_SECRET_KEY")?;
        let auth = ApiKeyAuth::new(&access_key, &secret_key)?;
        Self::connect(&base_url, auth).await
    }

    /// Base URL with surrounding whitespace and trailing slashes removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Executor used by this client, for endpoints not wrapped here.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Builds a request for `path` relative to the base URL.
    pub fn request(&self, method: Method, path: &str) -> Result<PreparedRequest> {
        PreparedRequest::parse(method, &format!("{}{path}", self.base_url))
    }

    /// Lists the available scan templates.
    pub async fn scan_templates(&self) -> Result<Vec<ScanTemplate>> {
        self.scan_templates_with_cancel(&CancelToken::new()).await
    }

    pub async fn scan_templates_with_cancel(
        &self,
        cancel: &CancelToken,
    ) -> Result<Vec<ScanTemplate>> {
        let request = self.request(Method::GET, "/editor/scan/templates")?;
        let envelope: TemplatesEnvelope = self.executor.execute(&request, cancel).await?;
        Ok(envelope.templates)
    }

    pub async fn launch_scan(&self, scan_id: i64) -> Result<()> {
        self.launch_scan_with_cancel(scan_id, &CancelToken::new())
            .await
    }

    pub async fn launch_scan_with_cancel(&self, scan_id: i64, cancel: &CancelToken) -> Result<()> {
        let request = self.request(Method::POST, &format!("/scans/{scan_id}/launch"))?;
        self.executor.execute_discard(&request, cancel).await
    }

    pub async fn stop_scan(&self, scan_id: i64) -> Result<()> {
        self.stop_scan_with_cancel(scan_id, &CancelToken::new()).await
    }

    pub async fn stop_scan_with_cancel(&self, scan_id: i64, cancel: &CancelToken) -> Result<()> {
        let request = self.request(Method::POST, &format!("/scans/{scan_id}/stop"))?;
        self.executor.execute_discard(&request, cancel).await
    }

    pub async fn delete_scan(&self, scan_id: i64) -> Result<()> {
        self.delete_scan_with_cancel(scan_id, &CancelToken::new())
            .await
    }

    pub async fn delete_scan_with_cancel(&self, scan_id: i64, cancel: &CancelToken) -> Result<()> {
        let request = self.request(Method::DELETE, &format!("/scans/{scan_id}"))?;
        self.executor.execute_discard(&request, cancel).await
    }

    /// Creates a scan and returns the persisted record.
    pub async fn create_scan(&self, scan: &Scan) -> Result<PersistedScan> {
        self.create_scan_with_cancel(scan, &CancelToken::new())
            .await
    }

    pub async fn create_scan_with_cancel(
        &self,
        scan: &Scan,
        cancel: &CancelToken,
    ) -> Result<PersistedScan> {
        let request = self.request(Method::POST, "/scans")?.with_json(scan)?;
        let envelope: ScanEnvelope = self.executor.execute(&request, cancel).await?;
        Ok(envelope.scan)
    }

    /// Lists scans, restricted to those modified after
    /// `last_modification_date` (unix seconds) when it is positive.
    pub async fn scans(&self, last_modification_date: i64) -> Result<Vec<PersistedScan>> {
        self.scans_with_cancel(last_modification_date, &CancelToken::new())
            .await
    }

    pub async fn scans_with_cancel(
        &self,
        last_modification_date: i64,
        cancel: &CancelToken,
    ) -> Result<Vec<PersistedScan>> {
        let mut request = self.request(Method::GET, "/scans")?;
        if last_modification_date > 0 {
            request = request.with_query(
                "last_modification_date",
                &last_modification_date.to_string(),
            );
        }
        let envelope: ScansEnvelope = self.executor.execute(&request, cancel).await?;
        Ok(envelope.scans)
    }

    pub async fn scan(&self, scan_id: i64) -> Result<ScanDetail> {
        self.scan_with_cancel(scan_id, &CancelToken::new()).await
    }

    pub async fn scan_with_cancel(&self, scan_id: i64, cancel: &CancelToken) -> Result<ScanDetail> {
        let request = self.request(Method::GET, &format!("/scans/{scan_id}"))?;
        let mut detail: ScanDetail = self.executor.execute(&request, cancel).await?;
        detail.id = scan_id;
        Ok(detail)
    }

    pub async fn plugin(&self, plugin_id: i64) -> Result<Plugin> {
        self.plugin_with_cancel(plugin_id, &CancelToken::new())
            .await
    }

    pub async fn plugin_with_cancel(&self, plugin_id: i64, cancel: &CancelToken) -> Result<Plugin> {
        let request = self.request(Method::GET, &format!("/plugins/plugin/{plugin_id}"))?;
        self.executor.execute(&request, cancel).await
    }

    /// Output of one plugin on one host of a scan.
    pub async fn plugin_output(
        &self,
        scan_id: i64,
        host_id: i64,
        plugin_id: i64,
    ) -> Result<PluginOutputResponse> {
        self.plugin_output_with_cancel(scan_id, host_id, plugin_id, &CancelToken::new())
            .await
    }

    pub async fn plugin_output_with_cancel(
        &self,
        scan_id: i64,
        host_id: i64,
        plugin_id: i64,
        cancel: &CancelToken,
    ) -> Result<PluginOutputResponse> {
        let path = format!("/scans/{scan_id}/hosts/{host_id}/plugins/{plugin_id}");
        let request = self.request(Method::GET, &path)?;
        self.executor.execute(&request, cancel).await
    }

    pub async fn policy(&self, policy_id: i64) -> Result<Policy> {
        self.policy_with_cancel(policy_id, &CancelToken::new())
            .await
    }

    pub async fn policy_with_cancel(&self, policy_id: i64, cancel: &CancelToken) -> Result<Policy> {
        let request = self.request(Method::GET, &format!("/policies/{policy_id}"))?;
        let mut policy: Policy = self.executor.execute(&request, cancel).await?;
        policy.id = policy_id;
        Ok(policy)
    }

    /// Looks up the single asset named `name`.
    ///
    /// Fails with [`TenableError::NotFound`] when nothing matches and
    /// [`TenableError::Ambiguous`] when more than one asset does.
    pub async fn asset_by_name(&self, name: &str) -> Result<Asset> {
        self.asset_by_name_with_cancel(name, &CancelToken::new())
            .await
    }

    pub async fn asset_by_name_with_cancel(
        &self,
        name: &str,
        cancel: &CancelToken,
    ) -> Result<Asset> {
        let request = self
            .request(Method::POST, "/api/v3/assets/search")?
            .accept_json()
            .with_json(&SearchRequest::eq("name", name))?;
        let envelope: AssetsEnvelope = self.executor.execute(&request, cancel).await?;

        let mut assets = envelope.assets;
        match assets.len() {
            0 => Err(TenableError::NotFound(format!(
                "no assets matching name: {name}"
            ))),
            1 => Ok(assets.remove(0)),
            count => Err(TenableError::Ambiguous {
                name: name.to_owned(),
                count,
            }),
        }
    }

    /// Collects every finding for the asset named `name`, across all pages.
    pub async fn findings_by_asset_name(&self, name: &str) -> Result<Vec<Finding>> {
        self.findings_by_asset_name_with_cancel(name, &CancelToken::new())
            .await
    }

    pub async fn findings_by_asset_name_with_cancel(
        &self,
        name: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<Finding>> {
        let request = self
            .request(Method::POST, "/api/v3/findings/vulnerabilities/host/search")?
            .accept_json()
            .with_json(&SearchRequest::eq("asset.name", name).with_fields(&FINDING_FIELDS))?;
        paginate::<FindingsEnvelope>(&self.executor, &request, cancel).await
    }
}

fn required_env(name: &str) -> Result<String> {
    let value = std::env::var(name)
        .map_err(|_| TenableError::Construction(format!("missing {name} environment variable")))?;
    if value.trim().is_empty() {
        return Err(TenableError::Construction(format!("{name} is set but empty")));
    }
    Ok(value)
}
