//! Verifies that a CI job is allowed to publish.
//!
//! When a known CI service is detected, publishing is only allowed from a
//! build of the release branch that is not a pull or merge request.

use thiserror::Error;
use tracing::debug;

/// The CI environment does not permit a release.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CiError {
    /// The job is building another branch.
    #[error("{ci}: building branch `{actual}`, releases are made from `{expected}`")]
    WrongBranch {
        /// CI service name.
        ci: &'static str,
        /// Branch being built.
        actual: String,
        /// Configured release branch.
        expected: String,
    },

    /// The job is building a pull or merge request.
    #[error("{ci}: pull or merge request builds cannot release")]
    PullRequest {
        /// CI service name.
        ci: &'static str,
    },
}

/// A detected CI service and what it reports about the build.
#[derive(Debug, PartialEq, Eq)]
struct CiBuild {
    name: &'static str,
    branch: Option<String>,
    pull_request: bool,
}

fn detect(env: &dyn Fn(&str) -> Option<String>) -> Option<CiBuild> {
    let is_true = |name: &str| env(name).is_some_and(|v| v == "true");
    let non_empty = |name: &str| env(name).filter(|v| !v.is_empty());

    if is_true("GITHUB_ACTIONS") {
        return Some(CiBuild {
            name: "GitHub Actions",
            branch: env("GITHUB_REF")
                .map(|r| r.strip_prefix("refs/heads/").map(str::to_string).unwrap_or(r)),
            pull_request: env("GITHUB_EVENT_NAME")
                .is_some_and(|e| e == "pull_request" || e == "pull_request_target"),
        });
    }
    if is_true("GITLAB_CI") {
        return Some(CiBuild {
            name: "GitLab CI",
            branch: env("CI_COMMIT_REF_NAME"),
            pull_request: non_empty("CI_MERGE_REQUEST_ID").is_some(),
        });
    }
    if is_true("TRAVIS") {
        return Some(CiBuild {
            name: "Travis CI",
            branch: env("TRAVIS_BRANCH"),
            pull_request: env("TRAVIS_PULL_REQUEST").is_some_and(|v| v != "false"),
        });
    }
    if is_true("CIRCLECI") {
        return Some(CiBuild {
            name: "CircleCI",
            branch: env("CIRCLE_BRANCH"),
            pull_request: non_empty("CI_PULL_REQUEST").is_some(),
        });
    }
    None
}

/// Checks the CI environment described by `env` against `branch`.
pub fn check_with(branch: &str, env: impl Fn(&str) -> Option<String>) -> Result<(), CiError> {
    let Some(build) = detect(&env) else {
        debug!("No CI environment detected");
        return Ok(());
    };
    debug!(ci = build.name, branch = ?build.branch, "Verifying CI environment");

    if build.pull_request {
        return Err(CiError::PullRequest { ci: build.name });
    }
    match build.branch {
        Some(actual) if actual == branch => Ok(()),
        actual => Err(CiError::WrongBranch {
            ci: build.name,
            actual: actual.unwrap_or_default(),
            expected: branch.to_string(),
        }),
    }
}

/// Checks the process environment against `branch`.
pub fn check(branch: &str) -> Result<(), CiError> {
    check_with(branch, |name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn no_ci_passes() {
        assert_eq!(check_with("master", env(&[])), Ok(()));
    }

    #[test]
    fn github_actions() {
        let ok = env(&[
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_REF", "refs/heads/master"),
            ("GITHUB_EVENT_NAME", "push"),
        ]);
        assert_eq!(check_with("master", ok), Ok(()));

        let pr = env(&[
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_REF", "refs/pull/3/merge"),
            ("GITHUB_EVENT_NAME", "pull_request"),
        ]);
        assert_eq!(
            check_with("master", pr),
            Err(CiError::PullRequest {
                ci: "GitHub Actions"
            })
        );
    }

    #[test]
    fn gitlab_wrong_branch() {
        let vars = env(&[("GITLAB_CI", "true"), ("CI_COMMIT_REF_NAME", "develop")]);
        assert_eq!(
            check_with("main", vars),
            Err(CiError::WrongBranch {
                ci: "GitLab CI",
                actual: "develop".to_string(),
                expected: "main".to_string(),
            })
        );
    }

    #[test]
    fn gitlab_merge_request() {
        let vars = env(&[
            ("GITLAB_CI", "true"),
            ("CI_COMMIT_REF_NAME", "main"),
            ("CI_MERGE_REQUEST_ID", "17"),
        ]);
        assert!(matches!(
            check_with("main", vars),
            Err(CiError::PullRequest { .. })
        ));
    }

    #[test]
    fn travis() {
        let push = env(&[
            ("TRAVIS", "true"),
            ("TRAVIS_BRANCH", "master"),
            ("TRAVIS_PULL_REQUEST", "false"),
        ]);
        assert_eq!(check_with("master", push), Ok(()));

        let pr = env(&[
            ("TRAVIS", "true"),
            ("TRAVIS_BRANCH", "master"),
            ("TRAVIS_PULL_REQUEST", "12"),
        ]);
        assert!(check_with("master", pr).is_err());
    }

    #[test]
    fn circleci() {
        let push = env(&[("CIRCLECI", "true"), ("CIRCLE_BRANCH", "master")]);
        assert_eq!(check_with("master", push), Ok(()));

        let pr = env(&[
            ("CIRCLECI", "true"),
            ("CIRCLE_BRANCH", "master"),
            ("CI_PULL_REQUEST", "https://github.com/o/r/pull/1"),
        ]);
        assert!(check_with("master", pr).is_err());

        let missing_branch = env(&[("CIRCLECI", "true")]);
        assert!(matches!(
            check_with("master", missing_branch),
            Err(CiError::WrongBranch { .. })
        ));
    }
}
