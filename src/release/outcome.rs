//! Results of a release attempt.

use std::fmt;

use semver::Version;

use crate::history::BumpLevel;

/// Why a release attempt ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeReason {
    /// A new version was written and tagged.
    Released,
    /// The existing version is being published again.
    Retried,
    /// No commit since the last release warrants a new version.
    NoChange,
    /// No-op mode; nothing was changed.
    NoopMode,
    /// CI reported a failing build.
    BuildFailed,
    /// The build status could not be determined.
    BuildStatusUnknown,
    /// The current version could not be read.
    VersionUnavailable,
    /// Release tags or commits since the last release could not be read.
    HistoryUnavailable,
}

impl fmt::Display for OutcomeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Released => "released",
            Self::Retried => "retried",
            Self::NoChange => "no release needed",
            Self::NoopMode => "no-operation mode",
            Self::BuildFailed => "build failed",
            Self::BuildStatusUnknown => "build status unknown",
            Self::VersionUnavailable => "current version unavailable",
            Self::HistoryUnavailable => "commit history unavailable",
        };
        f.write_str(text)
    }
}

/// Result of the version step.
///
/// `performed == false` is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// Whether the pipeline should go on to publish.
    pub performed: bool,
    /// Version before the release. On retry, the version before the retried one.
    pub current_version: Option<Version>,
    /// Version being released, or the one that would have been.
    pub new_version: Option<Version>,
    /// Bump level applied.
    pub level: BumpLevel,
    /// Why the attempt ended here.
    pub reason: OutcomeReason,
}

impl ReleaseOutcome {
    pub(crate) fn performed(
        reason: OutcomeReason,
        current_version: Option<Version>,
        new_version: Version,
        level: BumpLevel,
    ) -> Self {
        Self {
            performed: true,
            current_version,
            new_version: Some(new_version),
            level,
            reason,
        }
    }

    pub(crate) fn skipped(
        reason: OutcomeReason,
        current_version: Option<Version>,
        new_version: Option<Version>,
        level: BumpLevel,
    ) -> Self {
        Self {
            performed: false,
            current_version,
            new_version,
            level,
            reason,
        }
    }
}

/// Result of the publish pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// The version step.
    pub outcome: ReleaseOutcome,
    /// Whether the publish steps ran.
    pub published: bool,
    /// Best-effort steps that were skipped or failed.
    pub warnings: Vec<String>,
}
