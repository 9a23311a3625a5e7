//! Unified error handling for the translation subsystem
//!
//! Structured error types plus the severity/category metadata the loader uses to
//! decide which failures are logged and dropped and which reach the caller.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Errors raised while loading, caching, mapping or exporting translations
#[derive(Error, Debug, Clone)]
pub enum BabeleError {
    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Local file system failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Remote fetch failure
    #[error("network error: {0}")]
    Network(String),

    /// Malformed translation or pack file
    #[error("parse error: {0}")]
    Parse(String),

    /// Serialization failure while writing JSON
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Persistent cache failure
    #[error("cache error: {0}")]
    Cache(String),

    /// Corrupt or unreadable translation archive
    #[error("archive error: {0}")]
    Archive(String),

    /// The host refused a file listing
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// No compendium with this collection key
    #[error("unknown compendium pack: {0}")]
    UnknownPack(String),

    /// Pack document type outside the supported set
    #[error("unsupported document type: {0}")]
    UnsupportedDocumentType(String),

    /// Input validation failure
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl BabeleError {
    /// Whether the loader may drop the failing unit of work and keep going
    pub fn is_recoverable(&self) -> bool {
        match self {
            BabeleError::Io(_) => true,
            BabeleError::Network(_) => true,
            BabeleError::Parse(_) => true,
            BabeleError::Archive(_) => true,
            BabeleError::Cache(_) => true,
            BabeleError::PermissionDenied(_) => true,
            BabeleError::Config(_) => false,
            BabeleError::Serialization(_) => false,
            BabeleError::UnknownPack(_) => false,
            BabeleError::UnsupportedDocumentType(_) => false,
            BabeleError::InvalidInput(_) => false,
        }
    }

    /// Error severity
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BabeleError::Config(_) => ErrorSeverity::Critical,
            BabeleError::Io(_) => ErrorSeverity::Error,
            BabeleError::Network(_) => ErrorSeverity::Error,
            BabeleError::Parse(_) => ErrorSeverity::Error,
            BabeleError::Serialization(_) => ErrorSeverity::Error,
            BabeleError::Cache(_) => ErrorSeverity::Warning,
            BabeleError::Archive(_) => ErrorSeverity::Error,
            BabeleError::PermissionDenied(_) => ErrorSeverity::Warning,
            BabeleError::UnknownPack(_) => ErrorSeverity::Info,
            BabeleError::UnsupportedDocumentType(_) => ErrorSeverity::Info,
            BabeleError::InvalidInput(_) => ErrorSeverity::Info,
        }
    }

    /// Error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            BabeleError::Config(_) => ErrorCategory::Configuration,
            BabeleError::Io(_) => ErrorCategory::Io,
            BabeleError::Network(_) => ErrorCategory::Network,
            BabeleError::Parse(_) => ErrorCategory::Parsing,
            BabeleError::Serialization(_) => ErrorCategory::Serialization,
            BabeleError::Cache(_) => ErrorCategory::Cache,
            BabeleError::Archive(_) => ErrorCategory::Archive,
            BabeleError::PermissionDenied(_) => ErrorCategory::Permission,
            BabeleError::UnknownPack(_) => ErrorCategory::Input,
            BabeleError::UnsupportedDocumentType(_) => ErrorCategory::Input,
            BabeleError::InvalidInput(_) => ErrorCategory::Input,
        }
    }

    /// Appends context (usually a file path or provider id) to the message
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let msg = match &mut self {
            BabeleError::Config(msg)
            | BabeleError::Io(msg)
            | BabeleError::Network(msg)
            | BabeleError::Parse(msg)
            | BabeleError::Serialization(msg)
            | BabeleError::Cache(msg)
            | BabeleError::Archive(msg)
            | BabeleError::PermissionDenied(msg)
            | BabeleError::UnknownPack(msg)
            | BabeleError::UnsupportedDocumentType(msg)
            | BabeleError::InvalidInput(msg) => msg,
        };
        *msg = format!("{} (context: {})", msg, context);
        self
    }
}

/// Error severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Io,
    Network,
    Parsing,
    Serialization,
    Cache,
    Archive,
    Permission,
    Input,
}

impl From<std::io::Error> for BabeleError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => BabeleError::PermissionDenied(error.to_string()),
            _ => BabeleError::Io(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for BabeleError {
    fn from(error: serde_json::Error) -> Self {
        if error.is_io() {
            BabeleError::Io(error.to_string())
        } else if error.is_syntax() || error.is_eof() || error.is_data() {
            BabeleError::Parse(format!("JSON: {}", error))
        } else {
            BabeleError::Serialization(error.to_string())
        }
    }
}

impl From<toml::de::Error> for BabeleError {
    fn from(error: toml::de::Error) -> Self {
        BabeleError::Config(format!("TOML: {}", error))
    }
}

impl From<toml::ser::Error> for BabeleError {
    fn from(error: toml::ser::Error) -> Self {
        BabeleError::Serialization(format!("TOML: {}", error))
    }
}

impl From<zip::result::ZipError> for BabeleError {
    fn from(error: zip::result::ZipError) -> Self {
        BabeleError::Archive(error.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for BabeleError {
    fn from(error: reqwest::Error) -> Self {
        BabeleError::Network(error.to_string())
    }
}

#[cfg(feature = "http")]
impl From<url::ParseError> for BabeleError {
    fn from(error: url::ParseError) -> Self {
        BabeleError::Config(format!("invalid URL: {}", error))
    }
}

impl From<redb::Error> for BabeleError {
    fn from(error: redb::Error) -> Self {
        BabeleError::Cache(error.to_string())
    }
}

macro_rules! cache_error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for BabeleError {
                fn from(error: $source) -> Self {
                    BabeleError::Cache(error.to_string())
                }
            }
        )*
    };
}

cache_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Result alias
pub type BabeleResult<T> = Result<T, BabeleError>;

/// Error statistics gathered during a load
#[derive(Debug, Clone, Default)]
pub struct ErrorStats {
    pub total_errors: usize,
    pub by_category: HashMap<ErrorCategory, usize>,
    pub by_severity: HashMap<ErrorSeverity, usize>,
    pub recoverable_errors: usize,
    pub critical_errors: usize,
}

impl ErrorStats {
    /// Records an error
    pub fn record_error(&mut self, error: &BabeleError) {
        self.total_errors += 1;

        *self.by_category.entry(error.category()).or_insert(0) += 1;

        let severity = error.severity();
        *self.by_severity.entry(severity).or_insert(0) += 1;

        if error.is_recoverable() {
            self.recoverable_errors += 1;
        }

        if severity == ErrorSeverity::Critical {
            self.critical_errors += 1;
        }
    }

    /// Folds another set of statistics into this one
    pub fn absorb(&mut self, other: ErrorStats) {
        self.total_errors += other.total_errors;
        self.recoverable_errors += other.recoverable_errors;
        self.critical_errors += other.critical_errors;
        for (category, count) in other.by_category {
            *self.by_category.entry(category).or_insert(0) += count;
        }
        for (severity, count) in other.by_severity {
            *self.by_severity.entry(severity).or_insert(0) += count;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_errors == 0
    }
}

/// Error handling helpers
pub mod helpers {
    use super::*;

    /// Logs an error at the level matching its severity
    pub fn log_error(error: &BabeleError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("{}", error),
            ErrorSeverity::Warning => tracing::warn!("{}", error),
            ErrorSeverity::Error => tracing::error!("{}", error),
            ErrorSeverity::Critical => tracing::error!(critical = true, "{}", error),
        }
    }

    pub fn config_error<T: fmt::Display>(msg: T) -> BabeleError {
        BabeleError::Config(msg.to_string())
    }

    pub fn parse_error<T: fmt::Display>(msg: T) -> BabeleError {
        BabeleError::Parse(msg.to_string())
    }

    pub fn cache_error<T: fmt::Display>(msg: T) -> BabeleError {
        BabeleError::Cache(msg.to_string())
    }

    pub fn validation_error<T: fmt::Display>(msg: T) -> BabeleError {
        BabeleError::InvalidInput(msg.to_string())
    }
}
