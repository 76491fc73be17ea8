/// Core Module for SimQLe
///
/// This module contains the fundamental components that form the backbone of
/// SimQLe: the value model, driver seam, named connections, the transactional
/// query executor, and the shared error type.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{ErrorCategory, ErrorKind, Result, SimqleError};
