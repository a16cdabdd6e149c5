use thiserror::Error;

/// Main error type for dashconf operations
#[derive(Debug, Error)]
pub enum DashconfError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Invalid URL in '{field}': '{url}' ({reason})")]
    InvalidUrl {
        field: String,
        url: String,
        reason: String,
    },

    #[error("Unknown data source type '{kind}' for data source '{name}'")]
    UnknownDataSourceType { name: String, kind: String },

    #[error("Multiple data sources marked as default: {}", .names.join(", "))]
    MultipleDefaultDataSources { names: Vec<String> },

    #[error("Failed to parse {format} document: {details}")]
    DocumentParse { format: String, details: String },

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration loading error: {0}")]
    ConfigLoadError(#[from] config::ConfigError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl DashconfError {
    pub fn missing_field<S: Into<String>>(field: S) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid_value<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::InvalidFieldValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_url<F, U, R>(field: F, url: U, reason: R) -> Self
    where
        F: Into<String>,
        U: Into<String>,
        R: Into<String>,
    {
        Self::InvalidUrl {
            field: field.into(),
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_datasource_type<N: Into<String>, K: Into<String>>(name: N, kind: K) -> Self {
        Self::UnknownDataSourceType {
            name: name.into(),
            kind: kind.into(),
        }
    }

    pub fn document_parse<F: Into<String>, D: Into<String>>(format: F, details: D) -> Self {
        Self::DocumentParse {
            format: format.into(),
            details: details.into(),
        }
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for the kinds raised by schema validation, as opposed to
    /// failures acquiring or parsing the document
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::InvalidFieldValue { .. }
                | Self::InvalidUrl { .. }
                | Self::UnknownDataSourceType { .. }
                | Self::MultipleDefaultDataSources { .. }
        )
    }

    /// Process exit status: 2 when the document was read but failed
    /// validation, 1 for everything else
    pub fn exit_code(&self) -> i32 {
        if self.is_validation_error() {
            2
        } else {
            1
        }
    }
}

/// Result type alias for dashconf operations
pub type Result<T> = std::result::Result<T, DashconfError>;
