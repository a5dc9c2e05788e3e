//! Bump level evaluation and version arithmetic.

use std::fmt;

use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};

use super::{CommitEntry, CommitKind, CommitParser};

/// Magnitude of a version change, ordered `None < Patch < Minor < Major`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    /// No release.
    None,
    /// Increment patch.
    Patch,
    /// Increment minor, reset patch.
    Minor,
    /// Increment major, reset minor and patch.
    Major,
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BumpLevel::None => "none",
            BumpLevel::Patch => "patch",
            BumpLevel::Minor => "minor",
            BumpLevel::Major => "major",
        };
        f.write_str(name)
    }
}

/// Evaluates the bump level for a set of commits.
///
/// When `forced` is set it is returned verbatim. Otherwise the result is the
/// most severe classification among `commits`, so the order of commits does
/// not matter. With `patch_without_tag`, a commit the parser does not
/// classify as a release-worthy change counts as a patch.
pub fn evaluate(
    forced: Option<BumpLevel>,
    commits: &[CommitEntry],
    parser: &dyn CommitParser,
    patch_without_tag: bool,
) -> BumpLevel {
    if let Some(level) = forced {
        return level;
    }

    commits
        .iter()
        .map(|commit| {
            let kind = parser
                .parse(&commit.message)
                .map(|parsed| parsed.kind)
                .unwrap_or(CommitKind::None);
            match kind {
                CommitKind::None if patch_without_tag => BumpLevel::Patch,
                other => other.bump_level(),
            }
        })
        .max()
        .unwrap_or(BumpLevel::None)
}

/// Applies a bump level to a version, returning a new version.
///
/// Any bump other than [`BumpLevel::None`] drops prerelease and build
/// metadata; `None` returns the input unchanged.
pub fn apply(current: &Version, level: BumpLevel) -> Version {
    let mut next = current.clone();
    match level {
        BumpLevel::None => return next,
        BumpLevel::Major => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
        }
        BumpLevel::Minor => {
            next.minor += 1;
            next.patch = 0;
        }
        BumpLevel::Patch => {
            next.patch += 1;
        }
    }
    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;
    next
}
