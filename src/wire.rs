use serde::{Deserialize, Serialize};

use crate::{
    paginate::{Page, Paginated, Pagination},
    Asset, Finding, PersistedScan, ScanTemplate,
};

/// Fields requested from the host vulnerability search.
pub const FINDING_FIELDS: [&str; 14] = [
    "output",
    "id",
    "severity",
    "port",
    "protocol",
    "service",
    "plugin_id",
    "name",
    "description",
    "synopsis",
    "cvss3_base_score",
    "cvss2_base_score",
    "cwe",
    "see_also",
];

#[derive(Debug, Deserialize)]
pub struct TemplatesEnvelope {
    #[serde(default, deserialize_with = "crate::types::null_as_default")]
    pub templates: Vec<ScanTemplate>,
}

#[derive(Debug, Deserialize)]
pub struct ScansEnvelope {
    #[serde(default, deserialize_with = "crate::types::null_as_default")]
    pub scans: Vec<PersistedScan>,
}

#[derive(Debug, Deserialize)]
pub struct ScanEnvelope {
    pub scan: PersistedScan,
}

#[derive(Debug, Deserialize)]
pub struct AssetsEnvelope {
    #[serde(default, deserialize_with = "crate::types::null_as_default")]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
pub struct FindingsEnvelope {
    #[serde(default, deserialize_with = "crate::types::null_as_default")]
    pub findings: Vec<Finding>,
    #[serde(default, deserialize_with = "crate::types::null_as_default")]
    pub pagination: Pagination,
}

impl Paginated for FindingsEnvelope {
    type Item = Finding;

    fn into_page(self) -> Page<Finding> {
        Page {
            items: self.findings,
            next: self.pagination.next,
        }
    }
}

/// Body of a v3 search request: a single `eq` condition and optional fields.
#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub filter: Filter<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<&'a [&'a str]>,
}

#[derive(Debug, Serialize)]
pub struct Filter<'a> {
    pub and: Vec<Condition<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Condition<'a> {
    pub property: &'a str,
    pub operator: &'a str,
    pub value: &'a str,
}

impl<'a> SearchRequest<'a> {
    pub fn eq(property: &'a str, value: &'a str) -> Self {
        Self {
            filter: Filter {
                and: vec![Condition {
                    property,
                    operator: "eq",
                    value,
                }],
            },
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: &'a [&'a str]) -> Self {
        self.fields = Some(fields);
        self
    }
}
