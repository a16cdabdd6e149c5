//! Settings document loader
//!
//! `load` turns an already-parsed document into [`Settings`], enforcing the
//! schema and filling in defaults. It performs no I/O. The remaining
//! functions cover getting a document in the first place: parsing the
//! supported text forms, reading files, and environment overrides.

use crate::config::datasource::{DataSource, DataSourceType, SourceUrl};
use crate::config::secret::Secret;
use crate::config::settings::{
    AdminSettings, PluginSettings, SearchSettings, Settings, DEFAULT_ROUTE,
    DEFAULT_WINDOW_TITLE_PREFIX,
};
use crate::config::timespan::Timespan;
use crate::error::{DashconfError, Result};
use clap::ValueEnum;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};
use url::Url;

/// Prefix for environment variables that override document values
pub const ENV_PREFIX: &str = "DASHCONF_";

const TOP_LEVEL_KEYS: &[&str] = &[
    "datasources",
    "search",
    "default_route",
    "unsaved_changes_warning",
    "playlist_timespan",
    "admin",
    "window_title_prefix",
    "plugins",
];

const DATASOURCE_KEYS: &[&str] = &[
    "type",
    "url",
    "username",
    "password",
    "default",
    "grafanaDB",
    "index",
];

/// Validate a settings document and build the typed settings
pub fn load(document: &Value) -> Result<Settings> {
    let root = document
        .as_object()
        .ok_or_else(|| DashconfError::invalid_value("<root>", "expected an object"))?;

    for key in root.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            warn!("Ignoring unknown settings key '{}'", key);
        }
    }

    let datasources = load_datasources(root)?;
    let search = load_search(root)?;

    let default_route = match opt_str(root, "default_route", "default_route")? {
        Some(route) if route.starts_with('/') => route.to_string(),
        Some(route) => {
            return Err(DashconfError::invalid_value(
                "default_route",
                format!("'{}' must start with '/'", route),
            ))
        }
        None => DEFAULT_ROUTE.to_string(),
    };

    let unsaved_changes_warning =
        opt_bool(root, "unsaved_changes_warning", "unsaved_changes_warning")?.unwrap_or(true);

    let playlist_timespan = match opt_str(root, "playlist_timespan", "playlist_timespan")? {
        Some(raw) => Timespan::parse(raw)
            .map_err(|e| DashconfError::invalid_value("playlist_timespan", reason_of(e)))?,
        None => Timespan::default(),
    };

    let admin = match opt_object(root, "admin", "admin")? {
        Some(admin) => AdminSettings {
            password: opt_str(admin, "password", "admin.password")?
                .map(Secret::new)
                .unwrap_or_default(),
        },
        None => AdminSettings::default(),
    };

    let window_title_prefix = opt_str(root, "window_title_prefix", "window_title_prefix")?
        .unwrap_or(DEFAULT_WINDOW_TITLE_PREFIX)
        .to_string();

    let plugins = match opt_object(root, "plugins", "plugins")? {
        Some(plugins) => PluginSettings {
            panels: string_list(plugins, "panels", "plugins.panels")?,
            dependencies: string_list(plugins, "dependencies", "plugins.dependencies")?,
        },
        None => PluginSettings::default(),
    };

    let settings = Settings {
        datasources,
        search,
        default_route,
        unsaved_changes_warning,
        playlist_timespan,
        admin,
        window_title_prefix,
        plugins,
    };

    report_concerns(&settings);
    debug!(
        "Loaded settings with data sources: {}",
        settings.datasource_names().join(", ")
    );

    Ok(settings)
}

fn load_datasources(root: &Map<String, Value>) -> Result<Vec<DataSource>> {
    let entries = match optional(root, "datasources") {
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            return Err(DashconfError::invalid_value(
                "datasources",
                "expected a mapping of name to data source",
            ))
        }
        None => return Err(DashconfError::missing_field("datasources")),
    };

    if entries.is_empty() {
        return Err(DashconfError::invalid_value(
            "datasources",
            "at least one data source is required",
        ));
    }

    let datasources = entries
        .iter()
        .map(|(name, entry)| load_datasource(name, entry))
        .collect::<Result<Vec<_>>>()?;

    let defaults: Vec<String> = datasources
        .iter()
        .filter(|source| source.is_default)
        .map(|source| source.name.clone())
        .collect();
    if defaults.len() > 1 {
        return Err(DashconfError::MultipleDefaultDataSources { names: defaults });
    }

    Ok(datasources)
}

fn load_datasource(name: &str, entry: &Value) -> Result<DataSource> {
    let base = format!("datasources.{}", name);
    let fields = entry
        .as_object()
        .ok_or_else(|| DashconfError::invalid_value(&base, "expected an object"))?;

    for key in fields.keys() {
        if !DATASOURCE_KEYS.contains(&key.as_str()) {
            debug!("Ignoring unknown key '{}' on data source '{}'", key, name);
        }
    }

    let type_path = format!("{}.type", base);
    let tag = opt_str(fields, "type", &type_path)?
        .ok_or_else(|| DashconfError::missing_field(&type_path))?;
    let kind: DataSourceType = tag
        .parse()
        .map_err(|_| DashconfError::unknown_datasource_type(name, tag))?;

    let url_path = format!("{}.url", base);
    let raw_url = opt_str(fields, "url", &url_path)?
        .ok_or_else(|| DashconfError::missing_field(&url_path))?;
    let url = parse_url(raw_url, &url_path)?;

    let index = opt_str(fields, "index", &format!("{}.index", base))?.map(str::to_string);
    if kind == DataSourceType::Elasticsearch && index.is_none() {
        debug!("Data source '{}' has no index, the host default applies", name);
    }

    Ok(DataSource {
        name: name.to_string(),
        kind,
        url,
        username: opt_str(fields, "username", &format!("{}.username", base))?
            .map(str::to_string),
        password: opt_str(fields, "password", &format!("{}.password", base))?.map(Secret::new),
        is_default: opt_bool(fields, "default", &format!("{}.default", base))?.unwrap_or(false),
        grafana_db: opt_bool(fields, "grafanaDB", &format!("{}.grafanaDB", base))?
            .unwrap_or(false),
        index,
    })
}

fn parse_url(raw: &str, path: &str) -> Result<SourceUrl> {
    let url = Url::parse(raw).map_err(|e| DashconfError::invalid_url(path, raw, e.to_string()))?;

    if url.host().is_none() {
        return Err(DashconfError::invalid_url(path, raw, "missing host"));
    }

    Ok(SourceUrl::new(raw, url))
}

fn load_search(root: &Map<String, Value>) -> Result<SearchSettings> {
    let search = match opt_object(root, "search", "search")? {
        Some(search) => search,
        None => return Ok(SearchSettings::default()),
    };

    let max_results = match optional(search, "max_results") {
        Some(value) => positive_integer(value).ok_or_else(|| {
            DashconfError::invalid_value(
                "search.max_results",
                format!("expected a positive integer, got {}", value),
            )
        })?,
        None => SearchSettings::default().max_results,
    };

    Ok(SearchSettings { max_results })
}

/// Whole numbers written as floats (`20.0`) are accepted, since some
/// document parsers produce floats for every number
fn positive_integer(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return (n > 0).then_some(n);
    }

    let f = value.as_f64()?;
    if f >= 1.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

fn report_concerns(settings: &Settings) {
    let with_passwords: Vec<&str> = settings
        .datasources
        .iter()
        .filter(|source| source.has_credentials())
        .map(|source| source.name.as_str())
        .collect();
    if !with_passwords.is_empty() {
        warn!(
            "Data sources carry plain-text passwords: {}",
            with_passwords.join(", ")
        );
    }

    let metadata_stores = settings
        .datasources
        .iter()
        .filter(|source| source.grafana_db)
        .count();
    if metadata_stores > 1 {
        warn!(
            "{} data sources are marked grafanaDB, the host uses only the first",
            metadata_stores
        );
    }

    if !settings.datasources.iter().any(|source| source.is_default) {
        if let Some(first) = settings.datasources.first() {
            info!(
                "No data source is marked default, the host will use '{}'",
                first.name
            );
        }
    }
}

/// Absent and `null` values both count as unset
fn optional<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|value| !value.is_null())
}

fn opt_str<'a>(fields: &'a Map<String, Value>, key: &str, path: &str) -> Result<Option<&'a str>> {
    match optional(fields, key) {
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(type_mismatch(path, "a string", other)),
        None => Ok(None),
    }
}

fn opt_bool(fields: &Map<String, Value>, key: &str, path: &str) -> Result<Option<bool>> {
    match optional(fields, key) {
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(type_mismatch(path, "a boolean", other)),
        None => Ok(None),
    }
}

fn opt_object<'a>(
    fields: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<&'a Map<String, Value>>> {
    match optional(fields, key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(type_mismatch(path, "an object", other)),
        None => Ok(None),
    }
}

fn string_list(fields: &Map<String, Value>, key: &str, path: &str) -> Result<Vec<String>> {
    let items = match optional(fields, key) {
        Some(Value::Array(items)) => items,
        Some(other) => return Err(type_mismatch(path, "a list", other)),
        None => return Ok(Vec::new()),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(type_mismatch(&format!("{}[{}]", path, i), "a string", other)),
        })
        .collect()
}

fn type_mismatch(path: &str, expected: &str, found: &Value) -> DashconfError {
    DashconfError::invalid_value(path, format!("expected {}, got {}", expected, kind_of(found)))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn reason_of(error: DashconfError) -> String {
    match error {
        DashconfError::InvalidArgument(reason) => reason,
        other => other.to_string(),
    }
}

/// Text forms a settings document can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentFormat {
    Json,
    Json5,
    /// AMD module wrapping `new Settings({...})`, as loaded by the host
    Js,
    Yaml,
    Toml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "json5" => Some(Self::Json5),
            "js" => Some(Self::Js),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Json5 => "JSON5",
            Self::Js => "JavaScript module",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse document text in a known format
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value> {
    let parsed: std::result::Result<Value, String> = match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        DocumentFormat::Json5 => json5::from_str(text).map_err(|e| e.to_string()),
        DocumentFormat::Js => {
            let literal = extract_settings_literal(text)?;
            json5::from_str(literal).map_err(|e| e.to_string())
        }
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        DocumentFormat::Toml => toml::from_str::<toml::Value>(text)
            .map_err(|e| e.to_string())
            .and_then(|value| serde_json::to_value(value).map_err(|e| e.to_string())),
    };

    parsed.map_err(|details| DashconfError::document_parse(format.name(), details))
}

/// Parse document text whose format is not known up front
///
/// Tried as JSON, then JSON5, then as a host module when the text carries
/// a `Settings(` call, then TOML and YAML. A module that fails to
/// parse reports its own error rather than a generic one.
pub fn parse_document_auto(text: &str) -> Result<Value> {
    let looks_like_module = text.contains("Settings(");
    let mut module_error = None;

    for format in [
        DocumentFormat::Json,
        DocumentFormat::Json5,
        DocumentFormat::Js,
        DocumentFormat::Toml,
        DocumentFormat::Yaml,
    ] {
        if format == DocumentFormat::Js && !looks_like_module {
            continue;
        }

        match parse_document(text, format) {
            Ok(value) if value.is_object() => {
                debug!("Parsed document as {}", format);
                return Ok(value);
            }
            Ok(_) => continue,
            Err(e) => {
                debug!("Document is not {}: {}", format, e);
                if format == DocumentFormat::Js {
                    module_error = Some(e);
                }
            }
        }
    }

    Err(module_error.unwrap_or_else(|| {
        DashconfError::UnsupportedFormat(
            "document is not JSON, JSON5, TOML, YAML or a settings module".to_string(),
        )
    }))
}

/// Locate the object literal passed to `new Settings(...)`
pub fn extract_settings_literal(text: &str) -> Result<&str> {
    let module_error = |details: &str| DashconfError::document_parse("JavaScript module", details);

    let call = text
        .find("Settings(")
        .ok_or_else(|| module_error("no `new Settings(...)` call found"))?;
    let open = text[call..]
        .find('{')
        .map(|offset| call + offset)
        .ok_or_else(|| module_error("`Settings(` is not followed by an object literal"))?;

    let close = matching_brace(text, open)
        .ok_or_else(|| module_error("unbalanced braces in settings object"))?;

    Ok(&text[open..=close])
}

/// Index of the `}` closing the `{` at `open`, skipping strings and comments
///
/// Regex literals and `${}` interpolation inside template literals are not
/// recognised: braces or quotes inside a regex are counted, and a template
/// literal is skipped as a whole up to its closing backtick. Settings
/// modules contain neither.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Parse and load document text
pub fn load_str(text: &str, format: Option<DocumentFormat>) -> Result<Settings> {
    let document = match format {
        Some(format) => parse_document(text, format)?,
        None => parse_document_auto(text)?,
    };
    load(&document)
}

/// Read a document from disk, choosing the format from the extension
pub async fn read_document(path: &Path, format: Option<DocumentFormat>) -> Result<Value> {
    let contents = tokio::fs::read_to_string(path).await?;

    match format.or_else(|| DocumentFormat::from_path(path)) {
        Some(format) => {
            debug!("Reading {} as {}", path.display(), format);
            parse_document(&contents, format)
        }
        None => parse_document_auto(&contents),
    }
}

/// Read, parse and load a settings file
pub async fn load_file(path: &Path) -> Result<Settings> {
    let document = read_document(path, None).await?;
    load(&document)
}

/// Apply `DASHCONF_*` overrides to a document before it is loaded
///
/// Values are written into the document as-is (booleans and numbers are
/// converted when they parse), so `load` validates them like any other
/// value. Returns the names of the variables that were applied.
pub fn apply_env_overrides<I>(document: &mut Value, vars: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut applied = Vec::new();
    let root = match document.as_object_mut() {
        Some(root) => root,
        None => return applied,
    };

    for (name, value) in vars {
        let key = match name.strip_prefix(ENV_PREFIX) {
            Some(key) => key,
            None => continue,
        };

        match key {
            "DEFAULT_ROUTE" => {
                root.insert("default_route".to_string(), Value::String(value));
            }
            "WINDOW_TITLE_PREFIX" => {
                root.insert("window_title_prefix".to_string(), Value::String(value));
            }
            "PLAYLIST_TIMESPAN" => {
                root.insert("playlist_timespan".to_string(), Value::String(value));
            }
            "UNSAVED_CHANGES_WARNING" => {
                root.insert("unsaved_changes_warning".to_string(), env_bool(value));
            }
            "SEARCH_MAX_RESULTS" => {
                let parsed = match value.trim().parse::<u64>() {
                    Ok(n) => Value::from(n),
                    Err(_) => Value::String(value),
                };
                set_nested(root, "search", "max_results", parsed);
            }
            "ADMIN_PASSWORD" => {
                set_nested(root, "admin", "password", Value::String(value));
            }
            _ => continue,
        }

        debug!("Applied environment override {}", name);
        applied.push(name);
    }

    applied
}

fn env_bool(value: String) -> Value {
    match value.to_lowercase().as_str() {
        "true" | "1" => Value::Bool(true),
        "false" | "0" => Value::Bool(false),
        _ => Value::String(value),
    }
}

/// Set `root[key][field]`, replacing `root[key]` when it is not an object
fn set_nested(root: &mut Map<String, Value>, key: &str, field: &str, value: Value) {
    let mut nested = match root.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    nested.insert(field.to_string(), value);
    root.insert(key.to_string(), Value::Object(nested));
}
