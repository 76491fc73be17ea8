/// SimQLe Error Module
///
/// This module defines the error type shared by every layer of the crate.
/// Configuration and resolution errors are raised eagerly and never retried;
/// driver errors pass through unchanged after the executor has rolled back.
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// Comprehensive error type for SimQLe.
///
/// This enum covers all error scenarios that can occur within SimQLe:
/// - Configuration loading and validation
/// - Connection name resolution
/// - Statement execution (driver errors, verbatim)
/// - Result container access
#[derive(Error, Debug)]
pub enum SimqleError {
    /// No configuration file was found in any of the default locations
    #[error("No source was given and no connections file was found in the default locations: {}", display_paths(.searched))]
    NoConfigFile { searched: Vec<PathBuf> },

    /// An explicitly named configuration file does not exist
    #[error("Cannot find the specified connections file [{}]", .path.display())]
    FileNotFound { path: PathBuf },

    /// The configuration source is neither a path nor a YAML mapping
    #[error("Unknown configuration source type: {0}")]
    UnknownSourceType(String),

    /// A connection entry is missing one of `name`, `driver` or `connection`
    #[error("Missing field '{field}' in connection {index} of section '{section}': {context}")]
    MissingField {
        field: &'static str,
        section: String,
        index: usize,
        context: String,
    },

    /// The connection names of a dev or test section differ from production
    #[error("Connection names in '{section}' {found:?} do not match '{reference}' {expected:?}")]
    EnvironSync {
        section: String,
        reference: String,
        expected: BTreeSet<String>,
        found: BTreeSet<String>,
    },

    /// The mode string is not one of production, development or testing
    #[error("Unknown SimQLe mode '{0}', expected one of: production, development, testing")]
    UnknownMode(String),

    /// The section for the active mode is absent from the configuration
    #[error("Configuration has no '{section}' section for mode '{mode}'")]
    MissingSection { section: &'static str, mode: String },

    /// The configuration document has the wrong shape
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No connection name was given and no default is configured
    #[error("No connection name was specified but no default connection exists")]
    NoDefaultConnection,

    /// The requested connection name is not in the active section
    #[error("Unknown connection {0}")]
    UnknownConnection(String),

    /// The driver URL names a backend that no driver handles
    #[error("Unsupported driver URL '{0}'")]
    UnsupportedDriver(String),

    /// Database-related errors from SQLite operations, passed through verbatim
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Errors raised by drivers other than the built-in SQLite one
    #[error("Driver error: {0}")]
    Driver(String),

    /// A heading was requested that the query did not return
    #[error("Unknown heading: [{0}]")]
    UnknownHeading(String),

    /// A scalar datum was requested but the query returned no rows
    #[error("No datum was returned")]
    NoScalarData,
}

/// Closed set of error kinds, for matching by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoConfigFile,
    FileNotFound,
    UnknownSourceType,
    MissingField,
    EnvironSync,
    UnknownMode,
    MissingSection,
    InvalidConfig,
    Yaml,
    Io,
    NoDefaultConnection,
    UnknownConnection,
    UnsupportedDriver,
    Database,
    Driver,
    UnknownHeading,
    NoScalarData,
}

/// Error families, grouped by when they surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Raised while loading, before any query runs
    Configuration,
    /// Raised when a connection name cannot be resolved
    Resolution,
    /// Raised by the driver while running a statement
    Execution,
    /// Raised when a result container is read the wrong way
    ResultShape,
}

impl ErrorKind {
    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorKind::NoConfigFile
            | ErrorKind::FileNotFound
            | ErrorKind::UnknownSourceType
            | ErrorKind::MissingField
            | ErrorKind::EnvironSync
            | ErrorKind::UnknownMode
            | ErrorKind::MissingSection
            | ErrorKind::InvalidConfig
            | ErrorKind::Yaml
            | ErrorKind::Io => ErrorCategory::Configuration,
            ErrorKind::NoDefaultConnection
            | ErrorKind::UnknownConnection
            | ErrorKind::UnsupportedDriver => ErrorCategory::Resolution,
            ErrorKind::Database | ErrorKind::Driver => ErrorCategory::Execution,
            ErrorKind::UnknownHeading | ErrorKind::NoScalarData => ErrorCategory::ResultShape,
        }
    }
}

impl SimqleError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimqleError::NoConfigFile { .. } => ErrorKind::NoConfigFile,
            SimqleError::FileNotFound { .. } => ErrorKind::FileNotFound,
            SimqleError::UnknownSourceType(_) => ErrorKind::UnknownSourceType,
            SimqleError::MissingField { .. } => ErrorKind::MissingField,
            SimqleError::EnvironSync { .. } => ErrorKind::EnvironSync,
            SimqleError::UnknownMode(_) => ErrorKind::UnknownMode,
            SimqleError::MissingSection { .. } => ErrorKind::MissingSection,
            SimqleError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            SimqleError::Yaml(_) => ErrorKind::Yaml,
            SimqleError::Io(_) => ErrorKind::Io,
            SimqleError::NoDefaultConnection => ErrorKind::NoDefaultConnection,
            SimqleError::UnknownConnection(_) => ErrorKind::UnknownConnection,
            SimqleError::UnsupportedDriver(_) => ErrorKind::UnsupportedDriver,
            SimqleError::Database(_) => ErrorKind::Database,
            SimqleError::Driver(_) => ErrorKind::Driver,
            SimqleError::UnknownHeading(_) => ErrorKind::UnknownHeading,
            SimqleError::NoScalarData => ErrorKind::NoScalarData,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Type alias for Result to use SimqleError as the error type.
pub type Result<T> = std::result::Result<T, SimqleError>;
