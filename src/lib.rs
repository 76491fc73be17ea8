//! SimQLe: named database connections, selected by mode, with transactional
//! query helpers and lightweight result containers.

// Core infrastructure modules
pub mod core;

// Feature-specific modules
pub mod config;
pub mod container;
pub mod mode;
pub mod simqle;

#[cfg(test)]
pub mod test_utils;

pub use crate::config::{ConfigLoader, ConfigSource, LoadOptions};
pub use crate::container::{Fields, Record, RecordScalar, RecordSet};
pub use crate::core::db::{Params, Value};
pub use crate::core::{ErrorKind, Result, SimqleError};
pub use crate::mode::Mode;
pub use crate::simqle::Simqle;
