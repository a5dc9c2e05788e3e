//! Package-index upload through `twine`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

use super::dist_files;

/// Package-index upload errors.
#[derive(Error, Debug)]
pub enum UploadError {
    /// Username or password is missing.
    #[error("Missing credentials for package upload: {0} is not set")]
    MissingCredentials(&'static str),

    /// Nothing to upload.
    #[error("No distributions found in {}", .0.display())]
    NoDistributions(PathBuf),

    /// The distribution directory could not be read.
    #[error("Failed to read distributions: {0}")]
    Read(String),

    /// The uploader could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The uploader exited unsuccessfully.
    #[error("Upload failed ({status}): {stderr}")]
    Failed {
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },
}

/// Uploads built distributions to a package index.
pub trait PackageUploader {
    /// Uploads every distribution in `path`.
    ///
    /// With `skip_existing`, files the index already has are not an error.
    fn upload(
        &self,
        path: &Path,
        username: Option<&str>,
        password: Option<&str>,
        skip_existing: bool,
    ) -> Result<(), UploadError>;
}

/// Invokes the `twine` command-line uploader.
#[derive(Debug, Clone)]
pub struct TwineUploader {
    program: OsString,
    repository_url: Option<String>,
}

impl TwineUploader {
    /// Uploads with `twine`, to `repository_url` if set.
    pub fn new(repository_url: Option<String>) -> Self {
        Self::with_program("twine", repository_url)
    }

    /// Uses a specific uploader executable.
    pub fn with_program(program: impl Into<OsString>, repository_url: Option<String>) -> Self {
        Self {
            program: program.into(),
            repository_url,
        }
    }

    fn args(&self, files: &[PathBuf], skip_existing: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["upload".into(), "--non-interactive".into()];
        if skip_existing {
            args.push("--skip-existing".into());
        }
        if let Some(url) = &self.repository_url {
            args.push("--repository-url".into());
            args.push(url.into());
        }
        args.extend(files.iter().map(|f| f.as_os_str().to_owned()));
        args
    }
}

impl PackageUploader for TwineUploader {
    fn upload(
        &self,
        path: &Path,
        username: Option<&str>,
        password: Option<&str>,
        skip_existing: bool,
    ) -> Result<(), UploadError> {
        let username = username
            .filter(|u| !u.is_empty())
            .ok_or(UploadError::MissingCredentials("PYPI_USERNAME"))?;
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or(UploadError::MissingCredentials("PYPI_PASSWORD"))?;

        let files = dist_files(path).map_err(|e| UploadError::Read(format!("{e:#}")))?;
        if files.is_empty() {
            return Err(UploadError::NoDistributions(path.to_path_buf()));
        }

        info!(files = files.len(), skip_existing, "Uploading distributions");
        // Credentials travel through the environment so they never show up in argv.
        let output = Command::new(&self.program)
            .args(self.args(&files, skip_existing))
            .env("TWINE_USERNAME", username)
            .env("TWINE_PASSWORD", password)
            .output()
            .map_err(|source| UploadError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;

        if !output.status.success() {
            return Err(UploadError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dist_with_files() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pkg-1.0.0.tar.gz"), b"sdist").unwrap();
        dir
    }

    #[test]
    fn args_include_skip_existing_and_repository() {
        let uploader = TwineUploader::new(Some("https://test.pypi.org/legacy/".to_string()));
        let args = uploader.args(&[PathBuf::from("dist/a.whl")], true);
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "upload",
                "--non-interactive",
                "--skip-existing",
                "--repository-url",
                "https://test.pypi.org/legacy/",
                "dist/a.whl",
            ]
        );
    }

    #[test]
    fn missing_credentials() {
        let dist = dist_with_files();
        let err = TwineUploader::new(None)
            .upload(dist.path(), Some("user"), Some(""), false)
            .unwrap_err();
        assert!(matches!(err, UploadError::MissingCredentials("PYPI_PASSWORD")));
    }

    #[test]
    fn empty_dist_dir() {
        let dist = TempDir::new().unwrap();
        let err = TwineUploader::new(None)
            .upload(dist.path(), Some("user"), Some("pass"), false)
            .unwrap_err();
        assert!(matches!(err, UploadError::NoDistributions(_)));
    }

    #[test]
    fn uploader_failure_is_reported() {
        let dist = dist_with_files();
        let err = TwineUploader::with_program("false", None)
            .upload(dist.path(), Some("user"), Some("pass"), false)
            .unwrap_err();
        assert!(matches!(err, UploadError::Failed { .. }));
    }

    #[test]
    fn missing_program() {
        let dist = dist_with_files();
        let err = TwineUploader::with_program("semrel-no-such-twine", None)
            .upload(dist.path(), Some("user"), Some("pass"), false)
            .unwrap_err();
        assert!(matches!(err, UploadError::Spawn { .. }));
    }
}
