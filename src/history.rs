//! Commit history interpretation: parsing, bump evaluation and changelogs.

pub mod bump;
pub mod changelog;
pub mod parser;

pub use bump::{apply, evaluate, BumpLevel};
pub use changelog::{generate_changelog, markdown_changelog, Changelog};
pub use parser::{parser_for, AngularParser, CommitKind, CommitParser, ParsedCommit, Section, TagParser};

/// A commit as seen by history consumers: hash plus full message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    /// Full SHA-1 hash of the commit.
    pub hash: String,
    /// Full commit message including body.
    pub message: String,
}

impl CommitEntry {
    /// Creates a new entry.
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
        }
    }

    /// Returns the abbreviated hash used in changelog lines.
    pub fn short_hash(&self) -> &str {
        let len = self.hash.len().min(crate::git::SHORT_HASH_LEN);
        &self.hash[..len]
    }
}
