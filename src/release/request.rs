//! Inputs of one release invocation.

use crate::config::{parse_define, ConfigError};
use crate::history::BumpLevel;

/// What the caller asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// Bump level to use instead of inspecting commits.
    pub forced_level: Option<BumpLevel>,
    /// Repeat the publish steps of the current version without bumping.
    pub retry: bool,
    /// Report what would happen without changing anything.
    pub noop: bool,
    /// Post the changelog to the hosting service.
    pub post: bool,
    /// Configuration overrides, in the order given.
    pub overrides: Vec<(String, String)>,
}

impl ReleaseRequest {
    /// Forces a bump level.
    pub fn forced(mut self, level: BumpLevel) -> Self {
        self.forced_level = Some(level);
        self
    }

    /// Enables retry mode.
    pub fn retry(mut self) -> Self {
        self.retry = true;
        self
    }

    /// Enables no-op mode.
    pub fn noop(mut self) -> Self {
        self.noop = true;
        self
    }

    /// Parses and appends `key=value` overrides.
    pub fn with_defines<I, S>(mut self, defines: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for define in defines {
            self.overrides.push(parse_define(define.as_ref())?);
        }
        Ok(self)
    }
}
