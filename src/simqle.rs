//! The public entry point.
//!
//! `Simqle` resolves the mode, loads and validates the configuration, and
//! then answers queries against named connections:
//!
//! ```no_run
//! use simqle::{Params, Simqle};
//!
//! let mut db = Simqle::new("./.connections.yaml", None)?;
//! db.execute_sql("INSERT INTO people (name) VALUES (:name)", None, Some(&Params::new().with("name", "Ada")), None)?;
//! let count = db.record_scalar("SELECT COUNT(*) FROM people", None, None, None)?;
//! println!("{}", count.datum()?);
//! # Ok::<(), simqle::SimqleError>(())
//! ```

use crate::config::{ConfigLoader, ConfigSource, LoadOptions};
use crate::container::{Record, RecordScalar, RecordSet};
use crate::core::db::{
    Connection, ConnectionRegistry, Driver, Engine, Params, QueryExecutor, SqliteDriver,
};
use crate::core::Result;
use crate::mode::{resolve_mode, Mode};
use std::sync::Arc;
use tracing::info;

/// Named database connections with transactional query helpers.
///
/// Connection lookups cache into the registry, so query methods take
/// `&mut self`.
#[derive(Debug)]
pub struct Simqle {
    mode: Mode,
    registry: ConnectionRegistry,
    executor: QueryExecutor,
}

impl Simqle {
    /// Loads from `source` with the built-in SQLite driver.
    ///
    /// `source` is a path, a YAML mapping, or [`ConfigSource::Default`] to
    /// search the default locations. `mode_override` beats the environment.
    pub fn new(source: impl Into<ConfigSource>, mode_override: Option<&str>) -> Result<Self> {
        Self::with_driver(
            source,
            mode_override,
            Arc::new(SqliteDriver),
            ConfigLoader::new(),
        )
    }

    /// Loads with a caller-supplied driver and loader.
    pub fn with_driver(
        source: impl Into<ConfigSource>,
        mode_override: Option<&str>,
        driver: Arc<dyn Driver>,
        loader: ConfigLoader,
    ) -> Result<Self> {
        let mode = resolve_mode(mode_override)?;
        info!("Simqle mode set [mode={}]", mode);

        let loaded = loader.load(&source.into(), mode)?;
        info!(
            "SimQLe default connection set to {:?}",
            loaded.default_name.as_deref()
        );

        Ok(Simqle {
            mode,
            registry: ConnectionRegistry::new(loaded.connections, loaded.default_name, driver),
            executor: QueryExecutor::new(),
        })
    }

    /// Loads with the strict default check enabled.
    pub fn strict(source: impl Into<ConfigSource>, mode_override: Option<&str>) -> Result<Self> {
        Self::with_driver(
            source,
            mode_override,
            Arc::new(SqliteDriver),
            ConfigLoader::new().with_options(LoadOptions {
                strict_default: true,
            }),
        )
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn default_connection_name(&self) -> Option<&str> {
        self.registry.default_connection_name().ok()
    }

    pub fn get_connection(&mut self, con_name: Option<&str>) -> Result<Arc<Connection>> {
        self.registry.get_connection(con_name)
    }

    /// The raw engine behind a connection.
    pub fn get_engine(&mut self, con_name: Option<&str>) -> Result<Arc<dyn Engine>> {
        self.registry.get_engine(con_name)
    }

    /// Forgets every cached connection; they are rebuilt on next use.
    pub fn reset_connections(&mut self) {
        self.registry.reset();
    }

    /// Runs `sql` for effect.
    pub fn execute_sql(
        &mut self,
        sql: &str,
        con_name: Option<&str>,
        params: Option<&Params>,
        reference: Option<&str>,
    ) -> Result<()> {
        let connection = self.registry.get_connection(con_name)?;
        self.executor.execute(&connection, sql, params, reference)
    }

    pub fn recordset(
        &mut self,
        sql: &str,
        con_name: Option<&str>,
        params: Option<&Params>,
        reference: Option<&str>,
    ) -> Result<RecordSet> {
        let connection = self.registry.get_connection(con_name)?;
        let output = self.executor.fetch(&connection, sql, params, reference)?;
        Ok(RecordSet::new(output.headings, output.rows))
    }

    pub fn record(
        &mut self,
        sql: &str,
        con_name: Option<&str>,
        params: Option<&Params>,
        reference: Option<&str>,
    ) -> Result<Record> {
        let connection = self.registry.get_connection(con_name)?;
        let output = self.executor.fetch(&connection, sql, params, reference)?;
        Ok(Record::new(output.headings, output.rows))
    }

    pub fn record_scalar(
        &mut self,
        sql: &str,
        con_name: Option<&str>,
        params: Option<&Params>,
        reference: Option<&str>,
    ) -> Result<RecordScalar> {
        let connection = self.registry.get_connection(con_name)?;
        let output = self.executor.fetch(&connection, sql, params, reference)?;
        Ok(RecordScalar::new(output.headings, output.rows))
    }
}
