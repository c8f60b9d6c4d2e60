//! External generators driven by the updater.
//!
//! Two PHP programs do the actual code generation:
//!
//! 1. the extension's own `gen-stub.php`, run with the extension loaded, which
//!    introspects it and prints a stub for the requested functions and classes;
//! 2. php-src's `gen_stub.php` (see [`reference`]), which turns that stub into
//!    an `_arginfo.h` header next to it.
//!
//! Both sit behind the [`Generator`] trait so the update pipeline can be
//! exercised without a PHP installation.

pub mod reference;

use once_cell::unsync::OnceCell;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

use crate::console;

pub use reference::{Download, FetchError, HttpDownloader, ReferenceGenerator};

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Parameters for one stub generation run.
#[derive(Debug, Clone)]
pub struct StubRequest<'a> {
    pub extension: &'a str,
    pub functions: &'a [String],
    pub classes: &'a [String],
    /// Hand-written stub passed through to the stub generator.
    pub stub_template: Option<&'a Path>,
}

impl StubRequest<'_> {
    pub fn function_filter(&self) -> String {
        self.functions.join("|")
    }

    pub fn class_filter(&self) -> String {
        self.classes.join("|")
    }
}

/// Exit status and output of a finished generator process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub output: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Exit code for display, `-1` when there is none.
    pub fn exit_code(&self) -> i32 {
        self.status.unwrap_or(-1)
    }
}

pub trait Generator {
    /// Produce stub source for the requested declarations (stdout of the run).
    fn generate_stub(&self, request: &StubRequest<'_>) -> Result<String, GeneratorError>;

    /// Run the reference generator on `stub`, which writes `<module>_arginfo.h`
    /// beside it.
    ///
    /// A [`GeneratorError::Fetch`] means the reference generator itself is
    /// unavailable and no module can be processed.
    fn generate_arginfo(&self, stub: &Path) -> Result<ProcessOutput, GeneratorError>;
}

/// [`Generator`] running the PHP interpreter as a subprocess.
pub struct PhpGenerator {
    php: PathBuf,
    stub_generator: PathBuf,
    reference: ReferenceGenerator,
    downloader: Box<dyn Download>,
    script: OnceCell<PathBuf>,
}

impl PhpGenerator {
    pub fn new(
        php: impl Into<PathBuf>,
        stub_generator: impl Into<PathBuf>,
        build_dir: &Path,
        downloader: Box<dyn Download>,
    ) -> Self {
        Self {
            php: php.into(),
            stub_generator: stub_generator.into(),
            reference: ReferenceGenerator::new(build_dir),
            downloader,
            script: OnceCell::new(),
        }
    }

    /// Arguments passed to the interpreter for a stub run.
    pub fn stub_args(&self, request: &StubRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "-d".to_string(),
            format!("extension={}", request.extension),
            self.stub_generator.to_string_lossy().to_string(),
            "--gen-arginfo-mode".to_string(),
            format!("--function-filter={}", request.function_filter()),
            format!("--class-filter={}", request.class_filter()),
        ];
        if let Some(template) = request.stub_template {
            args.push(format!("--stub-file={}", template.display()));
        }
        args.push(request.extension.to_string());
        args
    }

    fn reference_script(&self) -> Result<&PathBuf, FetchError> {
        self.script
            .get_or_try_init(|| self.reference.ensure(self.downloader.as_ref()))
    }

    fn run(&self, args: &[String]) -> Result<std::process::Output, GeneratorError> {
        console::debug(format!("{} {}", self.php.display(), args.join(" ")));
        Command::new(&self.php)
            .args(args)
            .output()
            .map_err(|source| GeneratorError::Spawn {
                program: self.php.display().to_string(),
                source,
            })
    }
}

impl Generator for PhpGenerator {
    fn generate_stub(&self, request: &StubRequest<'_>) -> Result<String, GeneratorError> {
        let output = self.run(&self.stub_args(request))?;
        if !output.status.success() {
            console::debug(format!(
                "stub generator exited with {}: {}",
                output.status,
                console::flatten(&String::from_utf8_lossy(&output.stderr))
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn generate_arginfo(&self, stub: &Path) -> Result<ProcessOutput, GeneratorError> {
        let script = self.reference_script()?;
        let args = vec![
            script.to_string_lossy().to_string(),
            stub.to_string_lossy().to_string(),
        ];
        let output = self.run(&args)?;

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ProcessOutput {
            status: output.status.code(),
            output: combined,
        })
    }
}
