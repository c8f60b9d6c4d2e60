//! Discovery of native extension sources.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions recognised as C/C++ extension sources.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("source path {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("scanning {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Whether a path carries one of the recognised source extensions.
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Recursively collect source files under `root`, sorted by path.
///
/// A missing or unreadable root is an error rather than an empty result.
pub fn collect_sources(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.depth() == 0 && !entry.file_type().is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }
        if entry.file_type().is_file() && is_source_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
