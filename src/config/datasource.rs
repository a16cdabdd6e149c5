//! Data source records
//!
//! A data source is a named backend connection the host queries for
//! dashboard data. Names come from the keys of the `datasources` mapping.

use crate::config::secret::Secret;
use crate::error::{DashconfError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;
use url::Url;

/// Backends the host knows how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceType {
    Influxdb,
    Graphite,
    Opentsdb,
    Elasticsearch,
}

impl DataSourceType {
    pub const ALL: [DataSourceType; 4] = [
        DataSourceType::Influxdb,
        DataSourceType::Graphite,
        DataSourceType::Opentsdb,
        DataSourceType::Elasticsearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceType::Influxdb => "influxdb",
            DataSourceType::Graphite => "graphite",
            DataSourceType::Opentsdb => "opentsdb",
            DataSourceType::Elasticsearch => "elasticsearch",
        }
    }
}

impl FromStr for DataSourceType {
    type Err = DashconfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DashconfError::invalid_argument(format!("unknown backend '{}'", s)))
    }
}

impl fmt::Display for DataSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend address as the document spelled it, alongside its parsed form
///
/// Serializes as the original text; the host appends request paths to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl {
    raw: String,
    parsed: Url,
}

impl SourceUrl {
    pub fn new<S: Into<String>>(raw: S, parsed: Url) -> Self {
        Self {
            raw: raw.into(),
            parsed,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.parsed
    }
}

impl FromStr for SourceUrl {
    type Err = DashconfError;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = Url::parse(s)
            .map_err(|e| DashconfError::invalid_argument(format!("invalid URL '{}': {}", s, e)))?;
        Ok(Self::new(s, parsed))
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for SourceUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSource {
    #[serde(skip)]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: DataSourceType,

    pub url: SourceUrl,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,

    #[serde(rename = "default", skip_serializing_if = "is_false")]
    pub is_default: bool,

    /// Marks the store the host keeps its own dashboards in
    #[serde(rename = "grafanaDB", skip_serializing_if = "is_false")]
    pub grafana_db: bool,

    /// Elasticsearch index holding the dashboards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl DataSource {
    pub fn has_credentials(&self) -> bool {
        self.password.as_ref().map(|p| !p.is_empty()).unwrap_or(false)
    }

    /// Copy with the password replaced by a placeholder
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.password = self
            .password
            .as_ref()
            .map(|p| Secret::new(p.masked()));
        copy
    }
}

/// Flattened view of a data source for table output
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct DataSourceRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "URL")]
    pub url: String,
    #[tabled(rename = "Username")]
    pub username: String,
    #[tabled(rename = "Password")]
    pub password: String,
    #[tabled(rename = "Default")]
    pub is_default: String,
    #[tabled(rename = "Metadata Store")]
    pub grafana_db: String,
}

impl DataSourceRow {
    pub fn from_datasource(source: &DataSource, show_secrets: bool) -> Self {
        let password = match &source.password {
            Some(p) if show_secrets => p.expose().to_string(),
            Some(p) => p.masked().to_string(),
            None => String::new(),
        };

        Self {
            name: source.name.clone(),
            kind: source.kind.to_string(),
            url: source.url.to_string(),
            username: source.username.clone().unwrap_or_default(),
            password,
            is_default: yes_no(source.is_default),
            grafana_db: yes_no(source.grafana_db),
        }
    }
}

fn yes_no(value: bool) -> String {
    let text = if value { "yes" } else { "no" };
    text.to_string()
}
