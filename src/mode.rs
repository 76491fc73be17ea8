//! Mode resolution.
//!
//! The mode picks which section of the connections file is active:
//! `production` uses `connections`, `development` uses `dev-connections` and
//! `testing` uses `test-connections`.

use crate::core::{Result, SimqleError};
use std::fmt;
use std::str::FromStr;

/// Mode selector environment variable.
pub const MODE_ENV_VAR: &str = "SIMQLE_MODE";

/// Legacy boolean test flag. Deprecated, kept for older deployments.
pub const LEGACY_TEST_ENV_VAR: &str = "SIMQLE_TEST";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Production,
    Development,
    Testing,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Production, Mode::Development, Mode::Testing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Production => "production",
            Mode::Development => "development",
            Mode::Testing => "testing",
        }
    }

    /// The configuration section holding this mode's connections.
    pub fn section(&self) -> &'static str {
        match self {
            Mode::Production => "connections",
            Mode::Development => "dev-connections",
            Mode::Testing => "test-connections",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = SimqleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "production" => Ok(Mode::Production),
            "development" => Ok(Mode::Development),
            "testing" => Ok(Mode::Testing),
            other => Err(SimqleError::UnknownMode(other.to_string())),
        }
    }
}

/// Resolves the mode from an override or the process environment.
pub fn resolve_mode(mode_override: Option<&str>) -> Result<Mode> {
    resolve_mode_with(mode_override, |key| std::env::var(key).ok())
}

/// Resolves the mode, reading variables through `lookup`.
///
/// Precedence: the override, then `SIMQLE_TEST=true` (any case), then
/// `SIMQLE_MODE`, then `production`.
pub fn resolve_mode_with<F>(mode_override: Option<&str>, lookup: F) -> Result<Mode>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(mode) = mode_override {
        return mode.parse();
    }

    if lookup(LEGACY_TEST_ENV_VAR).is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        tracing::warn!(
            "{} is deprecated, use {}=testing instead",
            LEGACY_TEST_ENV_VAR,
            MODE_ENV_VAR
        );
        return Ok(Mode::Testing);
    }

    match lookup(MODE_ENV_VAR) {
        Some(mode) => mode.parse(),
        None => Ok(Mode::Production),
    }
}
