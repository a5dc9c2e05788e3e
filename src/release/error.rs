//! Fatal release errors.

use thiserror::Error;

use crate::artifacts::UploadError;
use crate::ci::CiError;
use crate::config::ConfigError;

/// Errors that abort a release command.
///
/// Graceful non-events (nothing to release, failing build, no-op mode) are
/// reported as a [`ReleaseOutcome`](super::ReleaseOutcome) instead.
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Required configuration is missing or invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// The current version could not be read where it is required.
    #[error(
        "Unable to get the current version. Make sure version_variable is set up correctly: {0:#}"
    )]
    CurrentVersion(anyhow::Error),

    /// A repository operation failed.
    #[error("Version control operation failed: {0:#}")]
    VersionControl(anyhow::Error),

    /// Uploading to the package index failed.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// A hosting-service operation failed.
    #[error("Hosting service operation failed: {0:#}")]
    Hosting(anyhow::Error),

    /// Building or removing distributions failed.
    #[error("Distribution build failed: {0:#}")]
    Build(anyhow::Error),

    /// The CI environment does not permit publishing.
    #[error("CI verification failed: {0}")]
    CiVerification(#[from] CiError),
}
