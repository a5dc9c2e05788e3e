//! Secret lookup with a settings-file fallback.
//!
//! Secrets are read from the environment first and then from
//! `$HOME/.semrel/settings.json`:
//!
//! ```json
//! { "env": { "GH_TOKEN": "..." } }
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::redact::{Redactor, SECRET_NAMES};

/// Settings loaded from `$HOME/.semrel/settings.json`.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Environment variable fallbacks.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Settings>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

        Ok(home_dir.join(".semrel").join("settings.json"))
    }

    /// Returns an environment variable with fallback to settings.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) => Some(value),
            Err(_) => self.env.get(key).cloned(),
        }
    }
}

/// Credentials consumed by a release, never logged unredacted.
#[derive(Clone, Default)]
pub struct Secrets {
    /// Package index username.
    pub pypi_username: Option<String>,
    /// Package index password.
    pub pypi_password: Option<String>,
    /// GitHub token.
    pub gh_token: Option<String>,
    /// GitLab token.
    pub gl_token: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("Secrets")
            .field("pypi_username", &mask(&self.pypi_username))
            .field("pypi_password", &mask(&self.pypi_password))
            .field("gh_token", &mask(&self.gh_token))
            .field("gl_token", &mask(&self.gl_token))
            .finish()
    }
}

impl Secrets {
    /// Reads secrets from the environment, falling back to the settings file.
    ///
    /// An unreadable settings file leaves only the environment; its error is
    /// handed back so it can be logged once logging is set up.
    pub fn load() -> (Self, Option<anyhow::Error>) {
        match Settings::get_settings_path() {
            Ok(path) => Self::load_from_path(path),
            Err(e) => (Self::from_settings(&Settings::default()), Some(e)),
        }
    }

    /// Like [`load`](Self::load), with the settings file at `path`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> (Self, Option<anyhow::Error>) {
        match Settings::load_from_path(path) {
            Ok(settings) => (Self::from_settings(&settings), None),
            Err(e) => (Self::from_settings(&Settings::default()), Some(e)),
        }
    }

    /// Reads secrets through an already loaded [`Settings`].
    pub fn from_settings(settings: &Settings) -> Self {
        let [pypi_username, pypi_password, gh_token, gl_token] =
            SECRET_NAMES.map(|name| settings.get_env_var(name).filter(|v| !v.is_empty()));
        Self {
            pypi_username,
            pypi_password,
            gh_token,
            gl_token,
        }
    }

    /// Pairs each secret with its environment name.
    pub fn named(&self) -> [(&'static str, Option<String>); 4] {
        [
            (SECRET_NAMES[0], self.pypi_username.clone()),
            (SECRET_NAMES[1], self.pypi_password.clone()),
            (SECRET_NAMES[2], self.gh_token.clone()),
            (SECRET_NAMES[3], self.gl_token.clone()),
        ]
    }

    /// Builds the redactor for these secrets.
    pub fn redactor(&self) -> Redactor {
        Redactor::new(self.named())
    }

    /// Renders `NAME="value",...` for a debug dump; redact before printing.
    pub fn describe(&self) -> String {
        self.named()
            .iter()
            .map(|(name, value)| format!("{name}=\"{}\",", value.as_deref().unwrap_or("")))
            .collect()
    }
}
