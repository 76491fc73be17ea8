/// # Test Utilities Module
///
/// Testing infrastructure for SimQLe.
///
/// This module provides:
/// - A recording driver that logs every transactional call
/// - Scripted failures for the execute/query, commit and rollback steps
/// - Sample configuration documents
/// - Log capture for asserting on emitted events

use crate::core::db::{Driver, Engine, EngineConnection, Params, QueryOutput};
use crate::core::{Result, SimqleError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::io;
use std::sync::{Arc, Mutex};

/// One call made against a recording connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Begin,
    Execute(String),
    Query(String),
    Commit,
    Rollback,
    Close,
}

/// Which step of the protocol should fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Script {
    pub fail_statement: bool,
    pub fail_commit: bool,
    pub fail_rollback: bool,
}

/// Driver whose engines record every call into a shared log.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    calls: Arc<Mutex<Vec<Call>>>,
    script: Script,
    output: QueryOutput,
    engines: AtomicUsize,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(script: Script) -> Self {
        RecordingDriver {
            script,
            ..Self::default()
        }
    }

    /// Rows returned from every `query` call.
    pub fn with_output(mut self, output: QueryOutput) -> Self {
        self.output = output;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn engines_created(&self) -> usize {
        self.engines.load(Ordering::SeqCst)
    }
}

impl Driver for RecordingDriver {
    fn create_engine(&self, url: &str) -> Result<Arc<dyn Engine>> {
        self.engines.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(RecordingEngine {
            url: url.to_string(),
            calls: Arc::clone(&self.calls),
            script: self.script,
            output: self.output.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct RecordingEngine {
    url: String,
    calls: Arc<Mutex<Vec<Call>>>,
    script: Script,
    output: QueryOutput,
}

impl Engine for RecordingEngine {
    fn url(&self) -> &str {
        &self.url
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }

    fn connect(&self) -> Result<Box<dyn EngineConnection>> {
        self.calls.lock().unwrap().push(Call::Connect);
        Ok(Box::new(RecordingConnection {
            calls: Arc::clone(&self.calls),
            script: self.script,
            output: self.output.clone(),
        }))
    }
}

pub struct RecordingConnection {
    calls: Arc<Mutex<Vec<Call>>>,
    script: Script,
    output: QueryOutput,
}

impl RecordingConnection {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl EngineConnection for RecordingConnection {
    fn begin(&mut self) -> Result<()> {
        self.record(Call::Begin);
        Ok(())
    }

    fn execute(&mut self, sql: &str, _params: &Params) -> Result<()> {
        self.record(Call::Execute(sql.to_string()));
        if self.script.fail_statement {
            return Err(SimqleError::Database(rusqlite::Error::InvalidQuery));
        }
        Ok(())
    }

    fn query(&mut self, sql: &str, _params: &Params) -> Result<QueryOutput> {
        self.record(Call::Query(sql.to_string()));
        if self.script.fail_statement {
            return Err(SimqleError::Database(rusqlite::Error::InvalidQuery));
        }
        Ok(self.output.clone())
    }

    fn commit(&mut self) -> Result<()> {
        self.record(Call::Commit);
        if self.script.fail_commit {
            return Err(SimqleError::Driver("commit failed".to_string()));
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.record(Call::Rollback);
        if self.script.fail_rollback {
            return Err(SimqleError::Driver("rollback failed".to_string()));
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.record(Call::Close);
        Ok(())
    }
}

/// A configuration with all three sections and a default.
pub const SAMPLE_CONFIG: &str = r#"
default: main
connections:
  - name: main
    driver: "sqlite:///"
    connection: prod.db
  - name: reporting
    driver: "sqlite:///"
    connection: reporting.db
dev-connections:
  - name: main
    driver: "sqlite:///"
    connection: dev.db
  - name: reporting
    driver: "sqlite:///"
    connection: dev-reporting.db
test-connections:
  - name: main
    driver: "sqlite://"
    connection: ""
  - name: reporting
    driver: "sqlite://"
    connection: ""
"#;

pub fn sample_config() -> serde_yaml::Value {
    serde_yaml::from_str(SAMPLE_CONFIG).unwrap()
}

/// Shared buffer that a test subscriber writes formatted events into.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a thread-local subscriber and returns its value and the captured log text.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, buffer.contents())
}
