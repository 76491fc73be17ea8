/// Database Module
///
/// This module provides the database layer of SimQLe, organized into focused
/// submodules.
///
/// ## Architecture
///
/// - **Values** (`value.rs`): Column values and named statement parameters
/// - **Engines** (`engine.rs`): The driver seam and the built-in SQLite driver
/// - **Connections** (`connection.rs`): Named connections and the registry that caches them
/// - **Query Execution** (`query.rs`): Transaction-scoped execution with commit or rollback
///
/// ## Error Handling
///
/// All database operations use the standardized `SimqleError` type. Driver errors are
/// never wrapped a second time, so callers see exactly what the driver raised.
pub mod connection;
pub mod engine;
pub mod query;
pub mod value;

pub use connection::*;
pub use engine::*;
pub use query::*;
pub use value::*;
