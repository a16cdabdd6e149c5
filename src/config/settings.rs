//! Dashboard host settings
//!
//! The typed form of a settings document. Values are built once by the
//! loader and never mutated afterwards; every field that the document may
//! omit already carries its default here.

use crate::config::datasource::{DataSource, DataSourceRow};
use crate::config::secret::Secret;
use crate::config::timespan::Timespan;
use serde::{Serialize, Serializer};

pub const DEFAULT_MAX_RESULTS: u64 = 20;
pub const DEFAULT_ROUTE: &str = "/dashboard/file/default.json";
pub const DEFAULT_WINDOW_TITLE_PREFIX: &str = "Grafana - ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchSettings {
    pub max_results: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminSettings {
    pub password: Secret,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginSettings {
    pub panels: Vec<String>,
    pub dependencies: Vec<String>,
}

impl PluginSettings {
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty() && self.dependencies.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Data sources in document order
    #[serde(serialize_with = "serialize_datasources")]
    pub datasources: Vec<DataSource>,
    pub search: SearchSettings,
    pub default_route: String,
    pub unsaved_changes_warning: bool,
    pub playlist_timespan: Timespan,
    pub admin: AdminSettings,
    pub window_title_prefix: String,
    pub plugins: PluginSettings,
}

fn serialize_datasources<S>(sources: &[DataSource], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(sources.iter().map(|source| (&source.name, source)))
}

impl Settings {
    /// Look up a data source by name
    pub fn datasource(&self, name: &str) -> Option<&DataSource> {
        self.datasources.iter().find(|source| source.name == name)
    }

    pub fn datasource_names(&self) -> Vec<&str> {
        self.datasources.iter().map(|s| s.name.as_str()).collect()
    }

    /// The source marked `default`, or the first one when none is marked
    pub fn default_datasource(&self) -> Option<&DataSource> {
        self.datasources
            .iter()
            .find(|source| source.is_default)
            .or_else(|| self.datasources.first())
    }

    /// The source holding the host's own dashboards, if any
    pub fn metadata_store(&self) -> Option<&DataSource> {
        self.datasources.iter().find(|source| source.grafana_db)
    }

    /// Copy with every credential replaced by a placeholder
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.datasources = self.datasources.iter().map(DataSource::redacted).collect();
        copy.admin.password = Secret::new(self.admin.password.masked());
        copy
    }

    pub fn datasource_rows(&self, show_secrets: bool) -> Vec<DataSourceRow> {
        self.datasources
            .iter()
            .map(|source| DataSourceRow::from_datasource(source, show_secrets))
            .collect()
    }

    /// Scalar settings as label/value pairs for display
    pub fn summary(&self, show_secrets: bool) -> Vec<(&'static str, String)> {
        let admin_password = if show_secrets {
            self.admin.password.expose().to_string()
        } else {
            self.admin.password.masked().to_string()
        };

        vec![
            ("Default route", self.default_route.clone()),
            (
                "Default data source",
                self.default_datasource()
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
            ),
            ("Search max results", self.search.max_results.to_string()),
            (
                "Unsaved changes warning",
                self.unsaved_changes_warning.to_string(),
            ),
            ("Playlist timespan", self.playlist_timespan.to_string()),
            ("Window title prefix", format!("'{}'", self.window_title_prefix)),
            ("Admin password", admin_password),
            ("Panel plugins", self.plugins.panels.join(", ")),
            ("Plugin dependencies", self.plugins.dependencies.join(", ")),
        ]
    }
}
