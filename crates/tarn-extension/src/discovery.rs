//! Locating project command sources.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{ExtensionError, Result};

/// Conventional directory of command sources.
pub const DEFAULT_DIR: &str = "tarnfiles";

/// Conventional single command file.
pub const DEFAULT_FILE: &str = "tarnfile.rs";

/// The command sources found for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionSource {
    /// Every `*.rs` file under a directory, sorted by path.
    Dir { root: PathBuf, files: Vec<PathBuf> },
    /// A single file.
    File(PathBuf),
}

impl ExtensionSource {
    /// Source files in a stable order.
    pub fn files(&self) -> Vec<PathBuf> {
        match self {
            Self::Dir { files, .. } => files.clone(),
            Self::File(path) => vec![path.clone()],
        }
    }

    /// Directory or file the sources were found at.
    pub fn location(&self) -> &Path {
        match self {
            Self::Dir { root, .. } => root,
            Self::File(path) => path,
        }
    }
}

/// Finds project command sources under a root directory.
#[derive(Debug, Clone)]
pub struct Discovery {
    dir_name: String,
    file_name: String,
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new(DEFAULT_DIR, DEFAULT_FILE)
    }
}

impl Discovery {
    pub fn new(dir_name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            dir_name: dir_name.into(),
            file_name: file_name.into(),
        }
    }

    pub fn dir_path(&self, root: &Path) -> PathBuf {
        root.join(&self.dir_name)
    }

    pub fn file_path(&self, root: &Path) -> PathBuf {
        root.join(&self.file_name)
    }

    /// Locate sources. The directory wins over the single file.
    pub fn discover(&self, root: &Path) -> Result<Option<ExtensionSource>> {
        let dir = self.dir_path(root);
        let file = self.file_path(root);

        if dir.is_dir() {
            if file.is_file() {
                info!(
                    dir = %dir.display(),
                    ignored = %file.display(),
                    "both command directory and command file exist; using the directory"
                );
            }
            let files = collect_sources(&dir)?;
            debug!(dir = %dir.display(), files = files.len(), "discovered command directory");
            return Ok(Some(ExtensionSource::Dir { root: dir, files }));
        }

        if file.is_file() {
            debug!(file = %file.display(), "discovered command file");
            return Ok(Some(ExtensionSource::File(file)));
        }

        Ok(None)
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name == "target")
}

fn collect_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            ExtensionError::Io {
                path,
                source: e.into(),
            }
        })?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "rs") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
