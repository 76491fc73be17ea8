//! Loading and validating the connections file.
//!
//! A connections file is YAML with up to three parallel sections, one per
//! [`Mode`], plus an optional `default` connection name:
//!
//! ```yaml
//! default: my-database
//! connections:
//!   - name: my-database
//!     driver: "sqlite:///"
//!     connection: /var/data/app.db
//! dev-connections:
//!   - name: my-database
//!     driver: "sqlite:///"
//!     connection: dev.db
//! test-connections:
//!   - name: my-database
//!     driver: "sqlite://"
//!     connection: ""
//! ```
//!
//! The whole document is validated before the section for the active mode is
//! selected, so a broken dev or test section fails a production load too.

use crate::core::db::ConnectionDescriptor;
use crate::core::{Result, SimqleError};
use crate::mode::Mode;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name searched for in the default locations.
pub const DEFAULT_FILE_NAME: &str = ".connections.yaml";

/// Fields every connection entry must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["name", "driver", "connection"];

const DEFAULT_KEY: &str = "default";

/// The default search list: the working directory, then the home directory.
pub fn default_file_locations() -> Vec<PathBuf> {
    let mut locations = vec![Path::new(".").join(DEFAULT_FILE_NAME)];
    if let Some(home) = dirs::home_dir() {
        locations.push(home.join(DEFAULT_FILE_NAME));
    }
    locations
}

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfigSource {
    /// Search the default locations.
    #[default]
    Default,
    /// Parse this file.
    Path(PathBuf),
    /// Use an in-memory document; it must be a YAML mapping.
    Mapping(Value),
}

impl From<&str> for ConfigSource {
    fn from(path: &str) -> Self {
        ConfigSource::Path(PathBuf::from(path))
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        ConfigSource::Path(path)
    }
}

impl From<&Path> for ConfigSource {
    fn from(path: &Path) -> Self {
        ConfigSource::Path(path.to_path_buf())
    }
}

impl From<Value> for ConfigSource {
    fn from(value: Value) -> Self {
        ConfigSource::Mapping(value)
    }
}

impl<T: Into<ConfigSource>> From<Option<T>> for ConfigSource {
    fn from(source: Option<T>) -> Self {
        source.map(Into::into).unwrap_or_default()
    }
}

/// Where a loaded configuration was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    DefaultLocation(PathBuf),
    Mapping,
}

/// Optional validations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Require the `default` connection to exist in every present section.
    pub strict_default: bool,
}

/// The active section of a validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub mode: Mode,
    pub connections: Vec<ConnectionDescriptor>,
    pub default_name: Option<String>,
    pub origin: ConfigOrigin,
}

#[derive(Debug, Deserialize)]
struct ConnectionsFile {
    default: Option<String>,
    #[serde(default)]
    connections: Option<Vec<ConnectionDescriptor>>,
    #[serde(default, rename = "dev-connections")]
    dev_connections: Option<Vec<ConnectionDescriptor>>,
    #[serde(default, rename = "test-connections")]
    test_connections: Option<Vec<ConnectionDescriptor>>,
}

impl ConnectionsFile {
    fn take_section(self, mode: Mode) -> Option<Vec<ConnectionDescriptor>> {
        match mode {
            Mode::Production => self.connections,
            Mode::Development => self.dev_connections,
            Mode::Testing => self.test_connections,
        }
    }
}

/// Resolves a [`ConfigSource`] into the validated section for one mode.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
    options: LoadOptions,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        ConfigLoader {
            search_paths: default_file_locations(),
            options: LoadOptions::default(),
        }
    }

    /// Replaces the default search list.
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Loads, validates and selects the section for `mode`.
    ///
    /// # Errors
    ///
    /// Any configuration error; nothing is returned from a document that
    /// fails validation.
    pub fn load(&self, source: &ConfigSource, mode: Mode) -> Result<LoadedConfig> {
        let (document, origin) = self.read_document(source)?;
        let mapping = validate(&document, self.options)?;

        let section = mode.section();
        if !mapping.contains_key(section) {
            return Err(SimqleError::MissingSection {
                section,
                mode: mode.to_string(),
            });
        }

        let file: ConnectionsFile = serde_yaml::from_value(Value::Mapping(mapping.clone()))?;
        let default_name = file.default.clone();
        let connections = file.take_section(mode).unwrap_or_default();

        debug!(
            "Selected section '{}' with {} connection(s) [mode={}]",
            section,
            connections.len(),
            mode
        );

        Ok(LoadedConfig {
            mode,
            connections,
            default_name,
            origin,
        })
    }

    /// Returns the raw document for a source, without validating it.
    pub fn read_document(&self, source: &ConfigSource) -> Result<(Value, ConfigOrigin)> {
        match source {
            ConfigSource::Default => self.load_from_default_location(),
            ConfigSource::Mapping(value) => {
                if !value.is_mapping() {
                    return Err(SimqleError::UnknownSourceType(format!(
                        "expected a mapping, got {}",
                        value_kind(value)
                    )));
                }
                info!("Configuration loaded from a given mapping, rather than a filename");
                Ok((value.clone(), ConfigOrigin::Mapping))
            }
            ConfigSource::Path(path) => {
                let document = load_file(path)?;
                info!("Configuration loaded from file [filename={}]", path.display());
                Ok((document, ConfigOrigin::File(path.clone())))
            }
        }
    }

    fn load_from_default_location(&self) -> Result<(Value, ConfigOrigin)> {
        for location in &self.search_paths {
            match load_file(location) {
                Ok(document) => {
                    info!(
                        "Configuration loaded from default location [location={}]",
                        location.display()
                    );
                    return Ok((document, ConfigOrigin::DefaultLocation(location.clone())));
                }
                Err(SimqleError::FileNotFound { .. }) => {
                    debug!("No connections file at {}", location.display());
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(SimqleError::NoConfigFile {
            searched: self.search_paths.clone(),
        })
    }
}

/// Parses one YAML file.
pub fn load_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SimqleError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => SimqleError::Io(e),
    })?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Runs the validation pipeline over a whole document.
///
/// Order: shape, required fields, matching names across sections, and the
/// strict default check when enabled.
pub fn validate(document: &Value, options: LoadOptions) -> Result<&Mapping> {
    let mapping = validate_shape(document)?;
    validate_required_fields(mapping)?;
    validate_names_match(mapping)?;
    if options.strict_default {
        validate_default(mapping)?;
    }
    Ok(mapping)
}

/// Checks the document is a mapping of sequences of mappings, with only
/// known top-level keys and unique names within each section.
pub fn validate_shape(document: &Value) -> Result<&Mapping> {
    let mapping = document.as_mapping().ok_or_else(|| {
        SimqleError::InvalidConfig(format!(
            "the top level must be a mapping, got {}",
            value_kind(document)
        ))
    })?;

    for key in mapping.keys() {
        let known = key
            .as_str()
            .is_some_and(|k| k == DEFAULT_KEY || Mode::ALL.iter().any(|m| m.section() == k));
        if !known {
            return Err(SimqleError::InvalidConfig(format!(
                "unknown key {:?}, expected '{}' or one of {}",
                key.as_str().unwrap_or(value_kind(key)),
                DEFAULT_KEY,
                Mode::ALL.map(|m| m.section()).join(", ")
            )));
        }
    }

    if let Some(default) = mapping.get(DEFAULT_KEY) {
        if !default.is_string() {
            return Err(SimqleError::InvalidConfig(format!(
                "'{}' must be a connection name, got {}",
                DEFAULT_KEY,
                value_kind(default)
            )));
        }
    }

    let mut any_section = false;
    for (section, entries) in sections(mapping) {
        any_section = true;
        let entries = entries.as_sequence().ok_or_else(|| {
            SimqleError::InvalidConfig(format!(
                "'{}' must be a list of connections, got {}",
                section,
                value_kind(entries)
            ))
        })?;

        let mut seen = BTreeSet::new();
        for (index, entry) in entries.iter().enumerate() {
            let entry = entry.as_mapping().ok_or_else(|| {
                SimqleError::InvalidConfig(format!(
                    "connection {} of '{}' must be a mapping, got {}",
                    index,
                    section,
                    value_kind(entry)
                ))
            })?;

            for field in REQUIRED_FIELDS {
                match entry.get(field) {
                    Some(v) if !v.is_null() && !v.is_string() => {
                        return Err(SimqleError::InvalidConfig(format!(
                            "'{}' of connection {} in '{}' must be a string, got {}",
                            field,
                            index,
                            section,
                            value_kind(v)
                        )));
                    }
                    _ => {}
                }
            }

            if let Some(name) = entry.get("name").and_then(Value::as_str) {
                if !seen.insert(name) {
                    return Err(SimqleError::InvalidConfig(format!(
                        "connection name '{}' appears more than once in '{}'",
                        name, section
                    )));
                }
            }

            if let Some(v) = entry.get("url_escape") {
                if !v.is_bool() {
                    return Err(SimqleError::InvalidConfig(format!(
                        "'url_escape' of connection {} in '{}' must be a boolean, got {}",
                        index,
                        section,
                        value_kind(v)
                    )));
                }
            }
        }
    }

    if !any_section {
        return Err(SimqleError::InvalidConfig(format!(
            "at least one of {} is required",
            Mode::ALL.map(|m| m.section()).join(", ")
        )));
    }

    Ok(mapping)
}

/// Checks every connection entry has `name`, `driver` and `connection`.
pub fn validate_required_fields(mapping: &Mapping) -> Result<()> {
    for (section, entries) in sections(mapping) {
        for (index, entry) in entries.as_sequence().into_iter().flatten().enumerate() {
            for field in REQUIRED_FIELDS {
                let present = entry.get(field).is_some_and(|v| !v.is_null());
                if !present {
                    return Err(SimqleError::MissingField {
                        field,
                        section: section.to_string(),
                        index,
                        context: describe_entry(entry),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Checks the dev and test sections name the same connections as the reference section.
///
/// The reference is `connections` when present, otherwise the first present section.
pub fn validate_names_match(mapping: &Mapping) -> Result<()> {
    let mut present = sections(mapping).map(|(section, entries)| (section, name_set(entries)));

    let Some((reference, expected)) = present.next() else {
        return Ok(());
    };

    for (section, found) in present {
        if found != expected {
            return Err(SimqleError::EnvironSync {
                section: section.to_string(),
                reference: reference.to_string(),
                expected,
                found,
            });
        }
    }
    Ok(())
}

/// Checks the configured default names a connection in every present section.
pub fn validate_default(mapping: &Mapping) -> Result<()> {
    let Some(default) = mapping.get(DEFAULT_KEY).and_then(Value::as_str) else {
        return Ok(());
    };

    for (section, entries) in sections(mapping) {
        let names = name_set(entries);
        if !names.contains(default) {
            return Err(SimqleError::EnvironSync {
                section: section.to_string(),
                reference: DEFAULT_KEY.to_string(),
                expected: BTreeSet::from([default.to_string()]),
                found: names,
            });
        }
    }
    Ok(())
}

/// Present sections, in mode order.
fn sections(mapping: &Mapping) -> impl Iterator<Item = (&'static str, &Value)> {
    Mode::ALL
        .into_iter()
        .filter_map(move |mode| mapping.get(mode.section()).map(|v| (mode.section(), v)))
}

fn name_set(entries: &Value) -> BTreeSet<String> {
    entries
        .as_sequence()
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.get("name").and_then(Value::as_str))
        .map(String::from)
        .collect()
}

fn describe_entry(entry: &Value) -> String {
    match entry.get("name").and_then(Value::as_str) {
        Some(name) => format!("connection named '{}'", name),
        None => {
            let keys: Vec<&str> = entry
                .as_mapping()
                .into_iter()
                .flat_map(|m| m.keys())
                .filter_map(Value::as_str)
                .collect();
            format!("unnamed connection with keys {:?}", keys)
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
