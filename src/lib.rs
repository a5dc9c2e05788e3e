//! # semrel
//!
//! Automatic semantic versioning and publishing driven by commit messages.
//!
//! ## Features
//!
//! - Bump level evaluation from conventional or emoji-tagged commits
//! - Version file or tag based versioning
//! - Publishing to a package index and GitHub or GitLab releases
//! - Secret redaction on every log line and error message
//!
//! ## Quick Start
//!
//! ```rust
//! use semrel::history::{apply, BumpLevel};
//! use semver::Version;
//!
//! let next = apply(&Version::new(1, 2, 3), BumpLevel::Minor);
//! assert_eq!(next, Version::new(1, 3, 0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod artifacts;
pub mod ci;
pub mod cli;
pub mod config;
pub mod git;
pub mod history;
pub mod hvcs;
pub mod release;
pub mod utils;

pub use crate::cli::{run, Cli};

/// The current version of semrel.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
