//! On-disk cache for generated stubs and arginfo headers.
//!
//! Entries live in `<cache-root>/stub/<extension>/`, keyed by module name
//! (the source file name without its extension):
//!
//! - `<module>.stub.php`: stub generator output
//! - `<module>_arginfo.h`: header written by the reference generator
//!
//! Entries never expire. They are bypassed when the cache is disabled
//! (`--clear-cache`) and otherwise only go away when deleted by hand.
//! No locking is done: two runs sharing a cache root race on these files
//! and the last writer wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::console;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("make stub dir failed: {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("writing cache entry {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Stub cache for a single extension.
#[derive(Debug, Clone)]
pub struct StubCache {
    dir: PathBuf,
    enabled: bool,
}

impl StubCache {
    /// Open (creating if needed) the cache directory for `extension` under `root`.
    pub fn open(root: &Path, extension: &str, enabled: bool) -> Result<Self, CacheError> {
        let dir = root.join("stub").join(extension);
        fs::create_dir_all(&dir).map_err(|source| CacheError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        let dir = dir.canonicalize().unwrap_or(dir);

        Ok(Self { dir, enabled })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn stub_path(&self, module: &str) -> PathBuf {
        self.dir.join(format!("{}.stub.php", module))
    }

    /// Where the reference generator writes the header for `module`.
    pub fn arginfo_path(&self, module: &str) -> PathBuf {
        self.dir.join(format!("{}_arginfo.h", module))
    }

    /// The cached stub for `module`, if caching is enabled and one exists.
    pub fn lookup(&self, module: &str) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        let path = self.stub_path(module);
        if path.is_file() {
            console::debug(format!("stub cache hit for {}", module));
            Some(path)
        } else {
            None
        }
    }

    /// Persist freshly generated stub content for `module`.
    pub fn store(&self, module: &str, content: &str) -> Result<PathBuf, CacheError> {
        let path = self.stub_path(module);
        fs::write(&path, content).map_err(|source| CacheError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Read a generated header, expanding tabs to four spaces.
    pub fn read_arginfo(&self, module: &str) -> io::Result<Vec<u8>> {
        let content = fs::read(self.arginfo_path(module))?;
        let mut expanded = Vec::with_capacity(content.len());
        for byte in content {
            if byte == b'\t' {
                expanded.extend_from_slice(b"    ");
            } else {
                expanded.push(byte);
            }
        }
        Ok(expanded)
    }
}

/// Module name of a source file: its file name without the extension.
pub fn module_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
