use serde::{Deserialize, Deserializer, Serialize};

/// Reads a missing or `null` field as the type's default. The API emits
/// `null` for empty lists and strings in most records.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PersistedScan {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub creation_date: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_modification_date: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Vulnerability {
    #[serde(rename = "vuln_index", default, deserialize_with = "null_as_default")]
    pub vulnerability_index: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub plugin_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub plugin_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub plugin_family: String,
}

/// Scan details. `id` is not part of the payload; the client fills it in.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ScanDetail {
    #[serde(skip)]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub info: ScanInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hosts: Vec<Host>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vulnerabilities: Vec<Vulnerability>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ScanInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Host {
    #[serde(rename = "host_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hostname: String,
}

/// Settings of a scan to create.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScanSettings {
    pub name: String,
    pub enabled: bool,
    #[serde(rename = "text_targets")]
    pub targets: String,
    pub policy_id: i64,
}

/// Scan creation payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Scan {
    #[serde(rename = "uuid")]
    pub template_uuid: String,
    pub settings: ScanSettings,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ScanTemplate {
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cloud_only: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subscription_only: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_agent: bool,
    #[serde(rename = "more_info", default, deserialize_with = "null_as_default")]
    pub info: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PluginAttribute {
    #[serde(rename = "attribute_name")]
    pub name: String,
    #[serde(rename = "attribute_value", default, deserialize_with = "null_as_default")]
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Plugin {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub family_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Vec<PluginAttribute>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PluginOutputResponse {
    #[serde(rename = "outputs", default, deserialize_with = "null_as_default")]
    pub output: Vec<PluginOutput>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PluginOutput {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hosts: String,
    /// Port map whose shape varies by plugin.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: serde_json::Value,
    #[serde(rename = "plugin_output", default, deserialize_with = "null_as_default")]
    pub output: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: i32,
}

/// Scan policy. `id` is filled in by the client.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Policy {
    #[serde(skip)]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub settings: PolicySettings,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PolicySettings {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Asset entity of the v3 API. Timestamps are kept as RFC 3339 strings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub types: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub observation_sources: Vec<ObservationSource>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_licensed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fqdns: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<AssetTag>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub network: Option<Network>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_observed: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_fqdn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_deleted: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_observed: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ObservationSource {
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_observed: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_observed: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AssetTag {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Network {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Vulnerability finding on a host.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Finding {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub port: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub protocol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub definition: FindingDefinition,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct FindingDefinition {
    /// Plugin ID.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub synopsis: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub solution: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cvss3: CvssScore,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cvss2: CvssScore,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cwe: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub see_also: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CvssScore {
    #[serde(default, deserialize_with = "null_as_default")]
    pub base_score: Option<f32>,
}
