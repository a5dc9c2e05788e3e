//! Building and removing distributions.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

/// Produces and cleans the release artifacts.
pub trait Distributions {
    /// Directory the artifacts are written to.
    fn dist_dir(&self) -> &Path;

    /// Removes the artifact directory. A missing directory is not an error.
    fn remove(&self) -> Result<()>;

    /// Builds fresh artifacts.
    fn build(&self) -> Result<()>;
}

/// Runs a shell build command from the repository root.
#[derive(Debug, Clone)]
pub struct ShellDistributions {
    root: PathBuf,
    dist_dir: PathBuf,
    command: String,
}

impl ShellDistributions {
    /// `dist_path` is resolved against `root`.
    pub fn new(root: &Path, dist_path: impl AsRef<Path>, command: impl Into<String>) -> Self {
        Self {
            root: root.to_path_buf(),
            dist_dir: root.join(dist_path.as_ref()),
            command: command.into(),
        }
    }
}

impl Distributions for ShellDistributions {
    fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    fn remove(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.dist_dir) {
            Ok(()) => {
                debug!(path = %self.dist_dir.display(), "Removed distributions");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove {}", self.dist_dir.display())),
        }
    }

    fn build(&self) -> Result<()> {
        info!(command = %self.command, "Building distributions");
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.root)
            .output()
            .context("Failed to run build command")?;

        if !output.status.success() {
            bail!(
                "Build command `{}` failed ({}): {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}
