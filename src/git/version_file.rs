//! Reading and writing a version assignment inside a tracked file.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use regex::{Captures, Regex};
use semver::Version;

/// A `path:VARIABLE` reference, e.g. `src/pkg/__init__.py:__version__`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionVariable {
    /// File path relative to the repository root.
    pub path: PathBuf,
    /// Variable name assigned the version.
    pub name: String,
}

impl FromStr for VersionVariable {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (path, name) = s
            .rsplit_once(':')
            .filter(|(p, n)| !p.trim().is_empty() && !n.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("Invalid version_variable '{s}'. Expected path:VARIABLE")
            })?;
        Ok(Self {
            path: PathBuf::from(path.trim()),
            name: name.trim().to_string(),
        })
    }
}

impl VersionVariable {
    /// Matches `NAME = "x.y.z"` or `NAME: 'x.y.z'` at the start of a line.
    fn pattern(&self) -> Result<Regex> {
        let name = regex::escape(&self.name);
        Regex::new(&format!(
            r#"(?m)^(?P<head>\s*{name}\s*[=:]\s*["'])(?P<value>[^"'\n]+)(?P<tail>["'])"#
        ))
        .context("Failed to build version pattern")
    }

    /// Reads the version assigned in the file under `root`.
    pub fn read(&self, root: &Path) -> Result<Version> {
        let path = root.join(&self.path);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read version file: {}", path.display()))?;

        let pattern = self.pattern()?;
        let captures = pattern.captures(&content).with_context(|| {
            format!("No {} assignment found in {}", self.name, path.display())
        })?;

        let value = captures["value"].trim();
        Version::parse(value)
            .with_context(|| format!("Invalid version '{value}' in {}", path.display()))
    }

    /// Rewrites every assignment in the file under `root` to `version`.
    pub fn write(&self, root: &Path, version: &Version) -> Result<()> {
        let path = root.join(&self.path);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read version file: {}", path.display()))?;

        let pattern = self.pattern()?;
        if !pattern.is_match(&content) {
            bail!("No {} assignment found in {}", self.name, path.display());
        }

        let updated = pattern.replace_all(&content, |caps: &Captures| {
            format!("{}{version}{}", &caps["head"], &caps["tail"])
        });

        fs::write(&path, updated.as_bytes())
            .with_context(|| format!("Failed to write version file: {}", path.display()))
    }
}
