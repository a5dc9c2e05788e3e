//! Changelog generation and markdown rendering.

use std::collections::BTreeMap;

use semver::Version;

use super::{CommitEntry, CommitParser, Section};

/// A single changelog line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogLine {
    /// Abbreviated commit hash.
    pub hash: String,
    /// Optional scope.
    pub scope: Option<String>,
    /// Description shown to readers.
    pub description: String,
}

/// Commits grouped by section, each section in history order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changelog {
    sections: BTreeMap<Section, Vec<ChangelogLine>>,
}

impl Changelog {
    /// Returns the lines in a section.
    pub fn section(&self, section: Section) -> &[ChangelogLine] {
        self.sections.get(&section).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns whether no section has any lines.
    pub fn is_empty(&self) -> bool {
        self.sections.values().all(Vec::is_empty)
    }

    fn push(&mut self, section: Section, line: ChangelogLine) {
        self.sections.entry(section).or_default().push(line);
    }
}

/// Groups `commits` (oldest first) into changelog sections.
///
/// Unparseable commits and commits without a section are left out.
pub fn generate_changelog(commits: &[CommitEntry], parser: &dyn CommitParser) -> Changelog {
    let mut changelog = Changelog::default();

    for commit in commits {
        let Some(parsed) = parser.parse(&commit.message) else {
            continue;
        };

        if let Some(section) = parsed.section {
            changelog.push(
                section,
                ChangelogLine {
                    hash: commit.short_hash().to_string(),
                    scope: parsed.scope.clone(),
                    description: parsed.description.clone(),
                },
            );
        }

        for description in parsed.breaking_descriptions {
            changelog.push(
                Section::Breaking,
                ChangelogLine {
                    hash: commit.short_hash().to_string(),
                    scope: parsed.scope.clone(),
                    description,
                },
            );
        }
    }

    changelog
}

/// Renders a changelog as markdown, optionally under a `## v{version}` header.
pub fn markdown_changelog(version: &Version, changelog: &Changelog, header: bool) -> String {
    let mut output = String::new();
    if header {
        output.push_str(&format!("## v{version}\n"));
    }

    for section in Section::ALL {
        let lines = changelog.section(section);
        if lines.is_empty() {
            continue;
        }

        output.push_str(&format!("\n### {}\n", section.title()));
        for line in lines {
            match &line.scope {
                Some(scope) => output.push_str(&format!(
                    "* **{scope}:** {} ({})\n",
                    line.description, line.hash
                )),
                None => output.push_str(&format!("* {} ({})\n", line.description, line.hash)),
            }
        }
    }

    output
}
