//! Release configuration.
//!
//! Configuration is read once from `.semrel.yaml` at the repository root,
//! merged with `-D key=value` overrides and then frozen into a
//! [`ReleaseConfig`] that is passed explicitly to everything that needs it.

use std::path::{Path, PathBuf};

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the configuration file looked up in the repository root.
pub const CONFIG_FILE_NAME: &str = ".semrel.yaml";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration could not be deserialised.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A `-D` override was not of the form `key=value`.
    #[error("Invalid override '{0}'. Expected key=value")]
    InvalidOverride(String),

    /// `version_source: commit` needs to know where the version lives.
    #[error(
        "Unable to locate the version. Set version_variable to \"path:VARIABLE\" \
         or use version_source: tag"
    )]
    MissingVersionVariable,
}

/// Where the authoritative current version lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSource {
    /// A tracked file; releases commit the updated file.
    #[default]
    Commit,
    /// The highest release tag.
    Tag,
}

/// Commit message convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// `type(scope)!: subject`.
    #[default]
    Angular,
    /// Emoji markers such as `:sparkles:`.
    Tag,
}

/// Hosting provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HvcsKind {
    /// GitHub or GitHub Enterprise.
    #[default]
    Github,
    /// GitLab or self-hosted GitLab.
    Gitlab,
}

/// Immutable release configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Branch releases are made from.
    pub branch: String,
    /// Whether to gate releases on the hosting service's build status.
    pub check_build_status: bool,
    /// Directory built artifacts are written to.
    pub dist_path: PathBuf,
    /// Whether to remove built artifacts before building and after upload.
    pub remove_dist: bool,
    /// Whether to upload artifacts to the package index.
    pub upload_to_pypi: bool,
    /// Whether to upload artifacts as hosting-service release assets.
    pub upload_to_release: bool,
    /// Whether to commit the version bump; unset follows `version_source`.
    pub commit_version_number: Option<bool>,
    /// Authoritative version source.
    pub version_source: VersionSource,
    /// `path:VARIABLE` locating the version in a tracked file.
    pub version_variable: Option<String>,
    /// Whether commits that are not classified still produce a patch release.
    pub patch_without_tag: bool,
    /// Commit message convention.
    pub commit_parser: ParserKind,
    /// Hosting provider.
    pub hvcs: HvcsKind,
    /// Hosting domain override, e.g. `github.example.com`.
    pub hvcs_domain: Option<String>,
    /// Shell command building distributions.
    pub build_command: String,
    /// Tag naming, `{version}` is substituted.
    pub tag_format: String,
    /// Subject of the version commit, `{version}` is substituted.
    pub commit_subject: String,
    /// Body of the version commit.
    pub commit_message: String,
    /// Author of the version commit, `Name <email>`.
    pub commit_author: String,
    /// Package index URL passed to the uploader.
    pub repository_url: Option<String>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            branch: "master".to_string(),
            check_build_status: false,
            dist_path: PathBuf::from("dist"),
            remove_dist: true,
            upload_to_pypi: true,
            upload_to_release: true,
            commit_version_number: None,
            version_source: VersionSource::Commit,
            version_variable: None,
            patch_without_tag: false,
            commit_parser: ParserKind::Angular,
            hvcs: HvcsKind::Github,
            hvcs_domain: None,
            build_command: "python setup.py sdist bdist_wheel".to_string(),
            tag_format: "v{version}".to_string(),
            commit_subject: "{version}".to_string(),
            commit_message: "Automatically generated by semrel".to_string(),
            commit_author: "semrel <semrel@users.noreply.github.com>".to_string(),
            repository_url: None,
        }
    }
}

impl ReleaseConfig {
    /// Loads `.semrel.yaml` from `repo_root`, applying `overrides` on top.
    ///
    /// A missing file yields the defaults.
    pub fn load(repo_root: &Path, overrides: &[(String, String)]) -> Result<Self, ConfigError> {
        let path = repo_root.join(CONFIG_FILE_NAME);
        let content = if path.exists() {
            std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?
        } else {
            String::new()
        };

        Self::from_yaml_str(&content, overrides)
    }

    /// Parses configuration from YAML text, applying `overrides` on top.
    pub fn from_yaml_str(content: &str, overrides: &[(String, String)]) -> Result<Self, ConfigError> {
        let mut mapping = match serde_yaml::from_str::<serde_yaml::Value>(content)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?
        {
            serde_yaml::Value::Null => serde_yaml::Mapping::new(),
            serde_yaml::Value::Mapping(mapping) => mapping,
            _ => {
                return Err(ConfigError::Invalid(
                    "top level must be a mapping".to_string(),
                ))
            }
        };

        for (key, value) in overrides {
            mapping.insert(
                serde_yaml::Value::String(key.clone()),
                override_value(value),
            );
        }

        let config: Self = serde_yaml::from_value(serde_yaml::Value::Mapping(mapping))
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.version_source == VersionSource::Commit && self.version_variable.is_none() {
            return Err(ConfigError::MissingVersionVariable);
        }
        Ok(())
    }

    /// Whether the version bump should be committed.
    pub fn should_commit_version(&self) -> bool {
        self.commit_version_number
            .unwrap_or(self.version_source == VersionSource::Commit)
    }

    /// Formats the tag name for a version.
    pub fn tag_name(&self, version: &Version) -> String {
        self.tag_format.replace("{version}", &version.to_string())
    }

    /// Parses a tag name back into a version, if it follows `tag_format`.
    pub fn parse_tag(&self, tag: &str) -> Option<Version> {
        let (prefix, suffix) = self.tag_format.split_once("{version}")?;
        let inner = tag.strip_prefix(prefix)?.strip_suffix(suffix)?;
        Version::parse(inner).ok()
    }

    /// Formats the version commit message.
    pub fn version_commit_message(&self, version: &Version) -> String {
        format!(
            "{}\n\n{}",
            self.version_commit_subject(version),
            self.commit_message
        )
    }

    /// First line of the version commit for `version`.
    pub fn version_commit_subject(&self, version: &Version) -> String {
        self.commit_subject.replace("{version}", &version.to_string())
    }
}

/// Parses a `-D key=value` argument.
pub fn parse_define(s: &str) -> Result<(String, String), ConfigError> {
    let (k, v) = s
        .split_once('=')
        .filter(|(k, _)| !k.trim().is_empty())
        .ok_or_else(|| ConfigError::InvalidOverride(s.to_string()))?;
    Ok((k.trim().to_string(), v.trim().trim_matches('"').to_string()))
}

/// Converts an override string to YAML: booleans and empty values are typed,
/// everything else stays a string.
fn override_value(value: &str) -> serde_yaml::Value {
    match value {
        "" => serde_yaml::Value::Null,
        "true" | "True" => serde_yaml::Value::Bool(true),
        "false" | "False" => serde_yaml::Value::Bool(false),
        other => serde_yaml::Value::String(other.to_string()),
    }
}
