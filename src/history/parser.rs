//! Commit message parsers.
//!
//! A parser turns a raw commit message into a [`ParsedCommit`], or `None`
//! when the message does not follow the parser's convention. Callers treat
//! `None` as [`CommitKind::None`]; a malformed message never aborts a release.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::BumpLevel;

/// Severity classification of a single commit.
///
/// Ordered so that the maximum over a history is the most severe change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommitKind {
    /// Nothing that warrants a release on its own.
    None,
    /// A bug fix.
    Fix,
    /// A new feature.
    Feature,
    /// An incompatible change.
    Breaking,
}

impl CommitKind {
    /// Maps the classification to the bump level it calls for.
    pub fn bump_level(self) -> BumpLevel {
        match self {
            CommitKind::None => BumpLevel::None,
            CommitKind::Fix => BumpLevel::Patch,
            CommitKind::Feature => BumpLevel::Minor,
            CommitKind::Breaking => BumpLevel::Major,
        }
    }
}

/// Changelog section a commit is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Breaking changes, listed from the commit body or footer.
    Breaking,
    /// New features.
    Feature,
    /// Bug fixes.
    Fix,
    /// Performance improvements.
    Performance,
    /// Documentation changes.
    Documentation,
    /// Code restructuring.
    Refactor,
}

impl Section {
    /// All sections in rendering order.
    pub const ALL: [Section; 6] = [
        Section::Breaking,
        Section::Feature,
        Section::Fix,
        Section::Performance,
        Section::Documentation,
        Section::Refactor,
    ];

    /// Heading used in rendered markdown.
    pub fn title(self) -> &'static str {
        match self {
            Section::Breaking => "Breaking",
            Section::Feature => "Feature",
            Section::Fix => "Fix",
            Section::Performance => "Performance",
            Section::Documentation => "Documentation",
            Section::Refactor => "Refactor",
        }
    }
}

/// Result of parsing one commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    /// Severity of the change.
    pub kind: CommitKind,
    /// Section for changelog listing, if the commit is listed at all.
    pub section: Option<Section>,
    /// Optional scope, e.g. `cli` in `feat(cli): ...`.
    pub scope: Option<String>,
    /// One-line description.
    pub description: String,
    /// Descriptions of breaking changes announced by this commit.
    pub breaking_descriptions: Vec<String>,
}

/// Classifies commit messages.
pub trait CommitParser: Send + Sync {
    /// Parses a message, returning `None` when it does not match the convention.
    fn parse(&self, message: &str) -> Option<ParsedCommit>;

    /// Name used in configuration and logs.
    fn name(&self) -> &'static str;
}

/// Returns the parser selected by configuration.
pub fn parser_for(kind: crate::config::ParserKind) -> Box<dyn CommitParser> {
    match kind {
        crate::config::ParserKind::Angular => Box::new(AngularParser),
        crate::config::ParserKind::Tag => Box::new(TagParser::default()),
    }
}

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static ANGULAR_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>[a-z]+)(?:\((?P<scope>[^()\n]+)\))?(?P<bang>!)?: (?P<subject>\S.*)$")
        .unwrap()
});

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static BREAKING_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^BREAKING[ -]CHANGE: ?(?P<desc>.+)$").unwrap());

/// Conventional-commit (`type(scope)!: subject`) parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct AngularParser;

impl AngularParser {
    fn classify_type(commit_type: &str) -> Option<(CommitKind, Option<Section>)> {
        let classified = match commit_type {
            "feat" => (CommitKind::Feature, Some(Section::Feature)),
            "fix" => (CommitKind::Fix, Some(Section::Fix)),
            "perf" => (CommitKind::Fix, Some(Section::Performance)),
            "docs" => (CommitKind::None, Some(Section::Documentation)),
            "refactor" => (CommitKind::None, Some(Section::Refactor)),
            "build" | "chore" | "ci" | "style" | "test" => (CommitKind::None, None),
            _ => return None,
        };
        Some(classified)
    }
}

impl CommitParser for AngularParser {
    fn parse(&self, message: &str) -> Option<ParsedCommit> {
        let header = message.lines().next()?.trim_end();
        let captures = ANGULAR_HEADER.captures(header)?;

        let (mut kind, section) = Self::classify_type(&captures["type"])?;
        let description = captures["subject"].trim().to_string();

        let body = message.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        let mut breaking_descriptions: Vec<String> = BREAKING_FOOTER
            .captures_iter(body)
            .map(|c| c["desc"].trim().to_string())
            .collect();

        if captures.name("bang").is_some() && breaking_descriptions.is_empty() {
            breaking_descriptions.push(description.clone());
        }
        if !breaking_descriptions.is_empty() {
            kind = CommitKind::Breaking;
        }

        Some(ParsedCommit {
            kind,
            section,
            scope: captures.name("scope").map(|m| m.as_str().to_string()),
            description,
            breaking_descriptions,
        })
    }

    fn name(&self) -> &'static str {
        "angular"
    }
}

/// Emoji tag parser (`:sparkles: Add thing`).
#[derive(Debug, Clone)]
pub struct TagParser {
    /// Marker for breaking changes.
    pub major_tag: String,
    /// Marker for features.
    pub minor_tag: String,
    /// Marker for fixes.
    pub patch_tag: String,
}

impl Default for TagParser {
    fn default() -> Self {
        Self {
            major_tag: ":boom:".to_string(),
            minor_tag: ":sparkles:".to_string(),
            patch_tag: ":nut_and_bolt:".to_string(),
        }
    }
}

impl CommitParser for TagParser {
    fn parse(&self, message: &str) -> Option<ParsedCommit> {
        let header = message.lines().next()?.trim();
        let strip = |tag: &str| header.replace(tag, "").trim().to_string();

        let breaking_in_body = message.contains("BREAKING CHANGE");
        let (kind, section, description) = if header.contains(&self.major_tag) {
            (CommitKind::Breaking, Some(Section::Feature), strip(&self.major_tag))
        } else if header.contains(&self.minor_tag) {
            (CommitKind::Feature, Some(Section::Feature), strip(&self.minor_tag))
        } else if header.contains(&self.patch_tag) {
            (CommitKind::Fix, Some(Section::Fix), strip(&self.patch_tag))
        } else if breaking_in_body {
            (CommitKind::Breaking, None, header.to_string())
        } else {
            return None;
        };

        let kind = if breaking_in_body {
            CommitKind::Breaking
        } else {
            kind
        };
        let breaking_descriptions = if kind == CommitKind::Breaking {
            vec![description.clone()]
        } else {
            Vec::new()
        };

        Some(ParsedCommit {
            kind,
            section,
            scope: None,
            description,
            breaking_descriptions,
        })
    }

    fn name(&self) -> &'static str {
        "tag"
    }
}
