/// Query Execution Module
///
/// This module runs SQL against a named connection inside a single
/// transaction. Every call checks out a fresh connection from the engine,
/// begins a transaction, runs the bound statement, then commits on success or
/// rolls back on failure. The checked-out connection is closed on every exit
/// path, including when commit or rollback fails.

use crate::core::db::connection::Connection;
use crate::core::db::engine::{EngineConnection, QueryOutput};
use crate::core::db::value::Params;
use crate::core::Result;
use std::time::Instant;
use tracing::{error, info, warn};

/// Maximum length of a reference derived from SQL text.
pub const REFERENCE_LENGTH: usize = 20;

/// Returns the label used to trace a query in log lines.
///
/// An explicit reference always wins. Otherwise the SQL lines are trimmed,
/// joined with single spaces, and the first 20 characters are kept.
pub fn derive_reference(sql: &str, reference: Option<&str>) -> String {
    if let Some(reference) = reference.filter(|r| !r.is_empty()) {
        return reference.to_string();
    }

    sql.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .chars()
        .take(REFERENCE_LENGTH)
        .collect()
}

/// A connection checked out for one transaction.
///
/// The checkout is closed exactly once: by `finalise`, or on drop if
/// `finalise` was never reached.
struct Transaction {
    conn: Box<dyn EngineConnection>,
    closed: bool,
}

impl Transaction {
    fn begin(connection: &Connection) -> Result<Self> {
        let mut transaction = Transaction {
            conn: connection.connect()?,
            closed: false,
        };
        transaction.handle().begin()?;
        Ok(transaction)
    }

    fn handle(&mut self) -> &mut dyn EngineConnection {
        self.conn.as_mut()
    }

    fn finalise(mut self) -> Result<()> {
        self.closed = true;
        self.conn.close()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.conn.close() {
                warn!("Failed to close connection: {}", e);
            }
        }
    }
}

/// Runs statements against connections, one transaction per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryExecutor;

impl QueryExecutor {
    pub fn new() -> Self {
        QueryExecutor
    }

    /// Executes `sql` for effect only.
    ///
    /// # Errors
    ///
    /// Driver errors are returned unchanged after the transaction is rolled back.
    pub fn execute(
        &self,
        connection: &Connection,
        sql: &str,
        params: Option<&Params>,
        reference: Option<&str>,
    ) -> Result<()> {
        self.run(connection, sql, params, reference, "Execution query", |conn, sql, params| {
            conn.execute(sql, params)
        })
    }

    /// Executes `sql` and returns its headings and rows.
    ///
    /// # Errors
    ///
    /// Driver errors are returned unchanged after the transaction is rolled back.
    pub fn fetch(
        &self,
        connection: &Connection,
        sql: &str,
        params: Option<&Params>,
        reference: Option<&str>,
    ) -> Result<QueryOutput> {
        self.run(connection, sql, params, reference, "Query", |conn, sql, params| {
            conn.query(sql, params)
        })
    }

    fn run<T>(
        &self,
        connection: &Connection,
        sql: &str,
        params: Option<&Params>,
        reference: Option<&str>,
        label: &str,
        statement: impl FnOnce(&mut dyn EngineConnection, &str, &Params) -> Result<T>,
    ) -> Result<T> {
        let reference = derive_reference(sql, reference);
        let empty = Params::new();
        let params = params.unwrap_or(&empty);

        info!(
            "{} called [connection='{}', reference='{}', params={:?}]",
            label,
            connection.name(),
            reference,
            params.names()
        );

        let started = Instant::now();
        let mut transaction = Transaction::begin(connection)?;

        let outcome = statement(transaction.handle(), sql, params)
            .and_then(|value| transaction.handle().commit().map(|_| value));

        let outcome = match outcome {
            Ok(value) => Ok(value),
            Err(e) => {
                error!(
                    "{} error [connection='{}', reference='{}', params={:?}]: {}",
                    label,
                    connection.name(),
                    reference,
                    params.names(),
                    e
                );
                if let Err(rollback_err) = transaction.handle().rollback() {
                    warn!(
                        "Rollback failed [connection='{}', reference='{}']: {}",
                        connection.name(),
                        reference,
                        rollback_err
                    );
                }
                Err(e)
            }
        };

        let closed = transaction.finalise();
        let value = outcome?;
        closed?;

        info!(
            "{} complete [connection='{}', reference='{}', params={:?}, execution time={:.4} seconds]",
            label,
            connection.name(),
            reference,
            params.names(),
            started.elapsed().as_secs_f64()
        );

        Ok(value)
    }
}
