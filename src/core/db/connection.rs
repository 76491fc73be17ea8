/// Connection Management Module
///
/// This module provides named connections and the registry that resolves and
/// caches them.
///
/// A [`ConnectionDescriptor`] is the static definition parsed from
/// configuration. A [`Connection`] is the runtime object built from it; its
/// engine is created by the driver on the first call to [`Connection::engine`]
/// and reused afterwards.

use crate::core::db::engine::{Driver, Engine, EngineConnection};
use crate::core::{Result, SimqleError};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Static definition of one named database target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionDescriptor {
    pub name: String,
    pub driver: String,
    pub connection: String,
    /// Percent-encode `connection` before appending it to `driver`.
    #[serde(default)]
    pub url_escape: bool,
}

impl ConnectionDescriptor {
    pub fn new(name: &str, driver: &str, connection: &str) -> Self {
        ConnectionDescriptor {
            name: name.to_string(),
            driver: driver.to_string(),
            connection: connection.to_string(),
            url_escape: false,
        }
    }

    pub fn with_url_escape(mut self, url_escape: bool) -> Self {
        self.url_escape = url_escape;
        self
    }

    /// The driver URL: `driver` followed by the (optionally escaped) connection string.
    ///
    /// # Examples
    ///
    /// ```
    /// use simqle::core::db::ConnectionDescriptor;
    ///
    /// let d = ConnectionDescriptor::new("odbc", "mssql+pyodbc:///?odbc_connect=", "DSN=a;UID=b")
    ///     .with_url_escape(true);
    /// assert_eq!(d.url(), "mssql+pyodbc:///?odbc_connect=DSN%3Da%3BUID%3Db");
    /// ```
    pub fn url(&self) -> String {
        if self.url_escape {
            let escaped: String =
                url::form_urlencoded::byte_serialize(self.connection.as_bytes()).collect();
            format!("{}{}", self.driver, escaped)
        } else {
            format!("{}{}", self.driver, self.connection)
        }
    }
}

/// A named connection owning one lazily created engine.
pub struct Connection {
    descriptor: ConnectionDescriptor,
    url: String,
    driver: Arc<dyn Driver>,
    engine: OnceCell<Arc<dyn Engine>>,
}

impl Connection {
    pub fn new(descriptor: ConnectionDescriptor, driver: Arc<dyn Driver>) -> Self {
        let url = descriptor.url();
        Connection {
            descriptor,
            url,
            driver,
            engine: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// Whether the engine has been created yet.
    pub fn has_engine(&self) -> bool {
        self.engine.get().is_some()
    }

    /// Returns the engine, creating it through the driver on first use.
    pub fn engine(&self) -> Result<Arc<dyn Engine>> {
        let engine = self.engine.get_or_try_init(|| {
            info!("Creating engine [connection='{}']", self.name());
            self.driver.create_engine(&self.url)
        })?;
        Ok(Arc::clone(engine))
    }

    /// Checks out a live connection from the engine.
    pub fn connect(&self) -> Result<Box<dyn EngineConnection>> {
        self.engine()?.connect()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.descriptor.name)
            .field("driver", &self.descriptor.driver)
            .field("has_engine", &self.has_engine())
            .finish()
    }
}

/// Maps connection names to materialized connections.
///
/// Connections are built the first time their name is resolved and cached
/// until [`ConnectionRegistry::reset`].
pub struct ConnectionRegistry {
    descriptors: Vec<ConnectionDescriptor>,
    default_name: Option<String>,
    connections: HashMap<String, Arc<Connection>>,
    driver: Arc<dyn Driver>,
}

impl ConnectionRegistry {
    pub fn new(
        descriptors: Vec<ConnectionDescriptor>,
        default_name: Option<String>,
        driver: Arc<dyn Driver>,
    ) -> Self {
        info!(
            "ConnectionRegistry initialised [default_name = {:?}, connections = {}]",
            default_name,
            descriptors.len()
        );
        ConnectionRegistry {
            descriptors,
            default_name,
            connections: HashMap::new(),
            driver,
        }
    }

    /// The configured default connection name.
    pub fn default_connection_name(&self) -> Result<&str> {
        self.default_name
            .as_deref()
            .ok_or(SimqleError::NoDefaultConnection)
    }

    /// Returns the connection for `name`, or for the default name when `name` is `None`.
    ///
    /// # Errors
    ///
    /// - `NoDefaultConnection` when no name is given and no default is configured
    /// - `UnknownConnection` when no descriptor has the requested name
    pub fn get_connection(&mut self, name: Option<&str>) -> Result<Arc<Connection>> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.default_connection_name()?.to_string(),
        };

        if let Some(connection) = self.connections.get(&name) {
            return Ok(Arc::clone(connection));
        }

        let descriptor = self
            .descriptors
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| SimqleError::UnknownConnection(name.clone()))?;

        debug!("Materializing connection [name='{}']", name);
        let connection = Arc::new(Connection::new(descriptor, Arc::clone(&self.driver)));
        self.connections.insert(name, Arc::clone(&connection));
        Ok(connection)
    }

    /// Returns the engine of a connection, for callers that want the raw driver handle.
    pub fn get_engine(&mut self, name: Option<&str>) -> Result<Arc<dyn Engine>> {
        self.get_connection(name)?.engine()
    }

    /// Forgets every materialized connection.
    ///
    /// Connections handed out earlier stay usable but are no longer cached here.
    pub fn reset(&mut self) {
        debug!("Resetting {} connection(s)", self.connections.len());
        self.connections.clear();
    }

    /// Number of materialized connections.
    pub fn materialized(&self) -> usize {
        self.connections.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("descriptors", &self.descriptors)
            .field("default_name", &self.default_name)
            .field("materialized", &self.connections.keys().collect::<Vec<_>>())
            .finish()
    }
}
