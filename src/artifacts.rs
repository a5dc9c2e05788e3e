//! Built distributions and package-index upload.

pub mod dist;
pub mod pypi;

pub use dist::{Distributions, ShellDistributions};
pub use pypi::{PackageUploader, TwineUploader, UploadError};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Regular files directly inside `dist_path`, sorted by name.
pub fn dist_files(dist_path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dist_path)
        .with_context(|| format!("Failed to read {}", dist_path.display()))?
    {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dist_files_skips_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.whl"), b"").unwrap();
        std::fs::write(dir.path().join("a.tar.gz"), b"").unwrap();
        std::fs::create_dir(dir.path().join("build")).unwrap();

        let names: Vec<_> = dist_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.tar.gz", "b.whl"]);
    }

    #[test]
    fn dist_files_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(dist_files(&dir.path().join("dist")).is_err());
    }
}
