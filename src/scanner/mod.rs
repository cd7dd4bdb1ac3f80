//! Artifact scanner for enumerating the corpus directory.
//!
//! Lists the top level of the corpus directory and returns the regular
//! files in it, sorted by name so that every run processes the same
//! artifacts in the same order.

use crate::models::Artifact;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

/// Scanner over a single corpus directory.
pub struct ArtifactScanner {
    corpus_dir: PathBuf,
}

impl ArtifactScanner {
    /// Create a new scanner for the given corpus directory.
    pub fn new(corpus_dir: PathBuf) -> Self {
        Self { corpus_dir }
    }

    /// Enumerate all regular files in the corpus directory, sorted by name.
    ///
    /// Directories, dangling symlinks and special files are skipped. Failing
    /// to list the directory itself is an error.
    pub fn scan(&self) -> Result<Vec<Artifact>> {
        let metadata = fs::metadata(&self.corpus_dir).with_context(|| {
            format!("Cannot access corpus directory: {}", self.corpus_dir.display())
        })?;

        if !metadata.is_dir() {
            anyhow::bail!("Not a directory: {}", self.corpus_dir.display());
        }

        let walker = WalkDir::new(&self.corpus_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        let mut artifacts = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // Depth 0 is the corpus directory itself: listing it failed.
                Err(e) if e.depth() == 0 => {
                    return Err(e).with_context(|| {
                        format!("Failed to list corpus directory: {}", self.corpus_dir.display())
                    });
                }
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let path = entry.path().to_path_buf();
            let filename = entry.file_name().to_string_lossy().to_string();

            // fs::metadata follows symlinks: dangling links fail here and
            // links to regular files are kept.
            match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => artifacts.push(Artifact {
                    filename,
                    path,
                    size: meta.len(),
                }),
                Ok(_) => debug!("Skipping non-regular entry: {}", filename),
                Err(e) => debug!("Skipping {}: {}", filename, e),
            }
        }

        Ok(artifacts)
    }
}
