//! CLI interface for semrel.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::history::BumpLevel;
use crate::release::ReleaseRequest;
use crate::utils::{Redactor, Secrets};

pub mod changelog;
mod context;
pub mod publish;
pub mod version;

/// semrel: automatic semantic versioning and publishing.
#[derive(Parser)]
#[command(name = "semrel")]
#[command(
    about = "Automatic semantic versioning and publishing driven by commit messages",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Options shared by every command.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted before or after any command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Forces a major release.
    #[arg(long, global = true, conflicts_with_all = ["minor", "patch"])]
    pub major: bool,

    /// Forces a minor release.
    #[arg(long, global = true, conflicts_with = "patch")]
    pub minor: bool,

    /// Forces a patch release.
    #[arg(long, global = true)]
    pub patch: bool,

    /// Finds the new version without changing anything.
    #[arg(long, global = true)]
    pub noop: bool,

    /// Retries publishing the current version without bumping.
    #[arg(long, global = true)]
    pub retry: bool,

    /// Posts the changelog to the hosting service.
    #[arg(long, global = true)]
    pub post: bool,

    /// Overrides a configuration value (repeatable).
    #[arg(short = 'D', long = "define", global = true, value_name = "KEY=VALUE")]
    pub define: Vec<String>,

    /// Log level used when RUST_LOG is not set.
    #[arg(
        short = 'v',
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "info"
    )]
    pub verbosity: String,
}

impl GlobalArgs {
    /// Bump level forced by `--major`, `--minor` or `--patch`.
    pub fn forced_level(&self) -> Option<BumpLevel> {
        if self.major {
            Some(BumpLevel::Major)
        } else if self.minor {
            Some(BumpLevel::Minor)
        } else if self.patch {
            Some(BumpLevel::Patch)
        } else {
            None
        }
    }

    /// Builds the request shared by all commands, validating `-D` overrides.
    pub fn request(&self) -> Result<ReleaseRequest> {
        let request = ReleaseRequest {
            forced_level: self.forced_level(),
            retry: self.retry,
            noop: self.noop,
            post: self.post,
            overrides: Vec::new(),
        };
        Ok(request.with_defines(&self.define)?)
    }
}

/// Release commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Detects the new version from the git log and writes, commits and tags it.
    Version(version::VersionCommand),
    /// Generates the changelog since the last release.
    Changelog(changelog::ChangelogCommand),
    /// Runs version, then pushes and uploads the release.
    Publish(publish::PublishCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub fn execute(self, secrets: &Secrets) -> Result<()> {
        let request = self.global.request()?;
        match self.command {
            Commands::Version(cmd) => cmd.execute(&request, secrets),
            Commands::Changelog(cmd) => cmd.execute(&request, secrets),
            Commands::Publish(cmd) => cmd.execute(&request, secrets),
        }
    }
}

/// Runs `cli` and returns the process exit status.
///
/// A failing command is reported on `err` as `Error:` plus one `Caused by:`
/// line per source, with every secret redacted.
pub fn run(cli: Cli, secrets: &Secrets, err: &mut impl Write) -> i32 {
    match cli.execute(secrets) {
        Ok(()) => 0,
        Err(e) => {
            report_error(&e, &secrets.redactor(), err);
            1
        }
    }
}

fn report_error(e: &anyhow::Error, redactor: &Redactor, err: &mut impl Write) {
    // Nowhere left to report a failing stderr.
    let _ = writeln!(err, "{}", redactor.redact(&format!("Error: {e}")));
    for cause in e.chain().skip(1) {
        let _ = writeln!(err, "{}", redactor.redact(&format!("  Caused by: {cause}")));
    }
}
