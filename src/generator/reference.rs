//! php-src's `build/gen_stub.php`, fetched once per build directory and
//! patched for use against extension stubs.
//!
//! The patched copy (`gen_stub_x.php`) is reused unconditionally once it
//! exists: upstream changes are only picked up after deleting it.

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::console;

/// Upstream location of the reference generator.
pub const GEN_STUB_URL: &str =
    "https://raw.githubusercontent.com/php/php-src/master/build/gen_stub.php";

/// File name of the fetched, unmodified generator.
pub const GEN_STUB_FILE: &str = "gen_stub.php";

/// File name of the patched generator.
pub const GEN_STUB_PATCHED_FILE: &str = "gen_stub_x.php";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to create dir for build scripts ({path}): {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("download of {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("download of {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("building HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("starting async runtime: {0}")]
    Runtime(io::Error),
}

/// Something that can place the contents of a URL at a local path.
pub trait Download {
    fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Blocking HTTPS downloader backed by reqwest.
pub struct HttpDownloader {
    http: Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(concat!("php-arginfo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { http })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let network = |source: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            source,
        };
        let response = self.http.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(network)?;
        Ok(body.to_vec())
    }
}

impl Download for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let runtime = tokio::runtime::Runtime::new().map_err(FetchError::Runtime)?;
        let body = runtime.block_on(self.fetch(url))?;
        fs::write(dest, body).map_err(|source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        })
    }
}

/// One textual fix applied to the fetched generator.
pub struct PatchRule {
    pub pattern: &'static str,
    /// Regex replacement template; `$0` is the whole match, `$$` a literal `$`.
    pub replacement: &'static str,
    pub reason: &'static str,
}

/// Fixes applied, in order, to `gen_stub.php`.
pub static PATCH_RULES: &[PatchRule] = &[
    PatchRule {
        pattern: r#"throw new Exception\("Not implemented \{\$classStmt->getType\(\)\}"\);"#,
        replacement: r"if (!($$classStmt instanceof Stmt\ClassConst)) { ${0} }",
        reason: "extension stubs declare class constants the generator does not implement",
    },
    PatchRule {
        pattern: r"error_reporting\(E_ALL\);",
        replacement: "error_reporting(E_ALL ^ E_DEPRECATED);",
        reason: "deprecations raised by the loaded extension abort the generator",
    },
    PatchRule {
        pattern: r#""\|ZEND_ACC_"#,
        replacement: r#"" | ZEND_ACC_"#,
        reason: "a quote directly before `|ZEND_ACC_` is mis-tokenized",
    },
];

lazy_static! {
    static ref COMPILED_RULES: Vec<(Regex, &'static PatchRule)> = PATCH_RULES
        .iter()
        .map(|rule| (Regex::new(rule.pattern).unwrap(), rule))
        .collect();
}

/// Apply every patch rule to `source`.
pub fn patch_source(source: &str) -> String {
    let mut patched = source.to_string();
    for (regex, rule) in COMPILED_RULES.iter() {
        let matches = regex.find_iter(&patched).count();
        if matches == 0 {
            console::notice(format!("gen_stub.php patch did not apply: {}", rule.reason));
            continue;
        }
        console::debug(format!("patched {} occurrence(s): {}", matches, rule.reason));
        patched = regex.replace_all(&patched, rule.replacement).into_owned();
    }
    patched
}

/// The patched reference generator belonging to one build directory.
pub struct ReferenceGenerator {
    build_dir: PathBuf,
}

impl ReferenceGenerator {
    pub fn new<P: AsRef<Path>>(build_dir: P) -> Self {
        Self {
            build_dir: build_dir.as_ref().to_path_buf(),
        }
    }

    pub fn original_path(&self) -> PathBuf {
        self.build_dir.join(GEN_STUB_FILE)
    }

    pub fn patched_path(&self) -> PathBuf {
        self.build_dir.join(GEN_STUB_PATCHED_FILE)
    }

    /// Make sure the patched generator exists, fetching and patching it if needed.
    pub fn ensure(&self, downloader: &dyn Download) -> Result<PathBuf, FetchError> {
        let patched_path = self.patched_path();
        if patched_path.is_file() {
            return Ok(patched_path);
        }

        let original_path = self.original_path();
        if !original_path.is_file() {
            fs::create_dir_all(&self.build_dir).map_err(|source| FetchError::CreateDir {
                path: self.build_dir.clone(),
                source,
            })?;
            console::info(format!("Downloading {}", GEN_STUB_URL));
            downloader.download(GEN_STUB_URL, &original_path)?;
        }

        let source = fs::read_to_string(&original_path).map_err(|source| FetchError::Io {
            path: original_path.clone(),
            source,
        })?;
        fs::write(&patched_path, patch_source(&source)).map_err(|source| FetchError::Io {
            path: patched_path.clone(),
            source,
        })?;

        Ok(patched_path)
    }
}
