//! Per-file arginfo update pipeline.
//!
//! For every source file: extract declarations, obtain a stub (cached per
//! module), run the reference generator on it, and splice each regenerated
//! arginfo declaration back into the source. Problems with one file are
//! logged and recorded in its [`FileReport`]; only an unavailable reference
//! generator aborts the run.

use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::arginfo::{refresh_block, BlockChange};
use crate::cache::{module_name, StubCache};
use crate::console;
use crate::extract::{extract_declarations, report_non_standard, Declarations};
use crate::generator::{Generator, GeneratorError, StubRequest};

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// No function or method markers; the file was not touched.
    NoDeclarations,
    Unreadable { reason: String },
    /// The stub generator printed nothing for this module.
    EmptyStub,
    StubFailed { reason: String },
    GeneratorFailed { exit_code: i32, output: String },
    /// Every declaration already matched the generated header.
    UpToDate,
    Updated,
    WriteFailed { reason: String },
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            FileOutcome::Unreadable { .. }
                | FileOutcome::EmptyStub
                | FileOutcome::StubFailed { .. }
                | FileOutcome::GeneratorFailed { .. }
                | FileOutcome::WriteFailed { .. }
        )
    }
}

/// Result of processing one source file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub functions: usize,
    pub methods: usize,
    pub non_standard: usize,
    pub replaced: usize,
    /// Arginfo names that could not be located in the source or the header.
    pub missing: Vec<String>,
    pub outcome: FileOutcome,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            functions: 0,
            methods: 0,
            non_standard: 0,
            replaced: 0,
            missing: Vec::new(),
            outcome: FileOutcome::NoDeclarations,
        }
    }

    fn finish(mut self, outcome: FileOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Whether anything about this file deserves attention.
    pub fn has_problems(&self) -> bool {
        self.outcome.is_failure() || !self.missing.is_empty()
    }
}

/// Totals over a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateSummary {
    pub files: Vec<FileReport>,
}

impl UpdateSummary {
    pub fn functions(&self) -> usize {
        self.files.iter().map(|f| f.functions).sum()
    }

    pub fn methods(&self) -> usize {
        self.files.iter().map(|f| f.methods).sum()
    }

    pub fn replaced(&self) -> usize {
        self.files.iter().map(|f| f.replaced).sum()
    }

    pub fn problem_count(&self) -> usize {
        self.files.iter().filter(|f| f.has_problems()).count()
    }

    pub fn has_problems(&self) -> bool {
        self.problem_count() > 0
    }
}

/// Updates arginfo declarations of one extension's sources.
pub struct Updater<'g> {
    extension: String,
    cache: StubCache,
    generator: &'g dyn Generator,
    stub_template: Option<PathBuf>,
}

impl<'g> Updater<'g> {
    pub fn new(extension: impl Into<String>, cache: StubCache, generator: &'g dyn Generator) -> Self {
        Self {
            extension: extension.into(),
            cache,
            generator,
            stub_template: None,
        }
    }

    /// Stub file handed to the stub generator as a template.
    pub fn stub_template(mut self, template: Option<PathBuf>) -> Self {
        self.stub_template = template;
        self
    }

    /// Process `files` in order.
    pub fn run(&self, files: &[PathBuf]) -> anyhow::Result<UpdateSummary> {
        let mut summary = UpdateSummary::default();
        for file in files {
            summary.files.push(self.update_file(file)?);
        }
        Ok(summary)
    }

    /// Process a single source file.
    ///
    /// Only a failure to obtain the reference generator is returned as an
    /// error; everything else ends up in the report.
    pub fn update_file(&self, path: &Path) -> anyhow::Result<FileReport> {
        let report = FileReport::new(path);

        let mut source = match fs::read(path) {
            Ok(source) => source,
            Err(e) => {
                console::warn(format!("Unable to read {}: {}", path.display(), e));
                return Ok(report.finish(FileOutcome::Unreadable {
                    reason: e.to_string(),
                }));
            }
        };

        // Markers are ASCII; stray non-UTF-8 bytes only matter when splicing.
        let declarations = extract_declarations(&String::from_utf8_lossy(&source));
        let mut report = FileReport {
            functions: declarations.functions.len(),
            methods: declarations.methods.len(),
            non_standard: report_non_standard(&declarations),
            ..report
        };

        if declarations.is_empty() {
            console::info(format!("There is no arginfo in {}", path.display()));
            return Ok(report.finish(FileOutcome::NoDeclarations));
        }
        console::info(format!("Start updating arginfo for {}", path.display()));

        let module = module_name(path);
        let stub_path = match self.stub_for(&module, &declarations, path)? {
            Ok(stub_path) => stub_path,
            Err(outcome) => return Ok(report.finish(outcome)),
        };

        let generated = match self.generate_arginfo(&module, &stub_path)? {
            Ok(generated) => generated,
            Err(outcome) => return Ok(report.finish(outcome)),
        };

        let non_standard = declarations.non_standard_arginfo();
        for name in declarations.arginfo_names() {
            match refresh_block(&mut source, &generated, &name) {
                BlockChange::Unchanged => {}
                BlockChange::Replaced => report.replaced += 1,
                BlockChange::MissingInSource => {
                    // Non-standard names were already reported by the extractor.
                    if !non_standard.contains(&name) {
                        console::warn(format!(
                            "Unable to find target function/method of '{}'",
                            name
                        ));
                        report.missing.push(name);
                    }
                }
                BlockChange::MissingInGenerated => {
                    console::warn(format!("Unable to find '{}' in new arginfo source", name));
                    report.missing.push(name);
                }
            }
        }

        if report.replaced == 0 {
            console::info(format!("Arginfo is up to date for {}", path.display()));
            return Ok(report.finish(FileOutcome::UpToDate));
        }

        match fs::write(path, &source) {
            Ok(()) => {
                console::ok(format!(
                    "Arginfo updated with {} changes for {}",
                    report.replaced,
                    path.display()
                ));
                Ok(report.finish(FileOutcome::Updated))
            }
            Err(e) => {
                console::warn(format!(
                    "Unable to update source file for {}: {}",
                    path.display(),
                    e
                ));
                Ok(report.finish(FileOutcome::WriteFailed {
                    reason: e.to_string(),
                }))
            }
        }
    }

    /// Cached stub for `module`, generating and storing it when needed.
    fn stub_for(
        &self,
        module: &str,
        declarations: &Declarations,
        path: &Path,
    ) -> anyhow::Result<Result<PathBuf, FileOutcome>> {
        if let Some(cached) = self.cache.lookup(module) {
            return Ok(Ok(cached));
        }

        let classes = declarations.class_names();
        let request = StubRequest {
            extension: &self.extension,
            functions: &declarations.functions,
            classes: &classes,
            stub_template: self.stub_template.as_deref(),
        };

        let stub = match self.generator.generate_stub(&request) {
            Ok(stub) => stub,
            Err(GeneratorError::Fetch(e)) => {
                return Err(e).context("reference generator is unavailable");
            }
            Err(e) => {
                console::warn(format!("Stub generation for {} failed: {}", module, e));
                return Ok(Err(FileOutcome::StubFailed {
                    reason: e.to_string(),
                }));
            }
        };
        if stub.trim().is_empty() {
            console::notice(format!("No stub info generated by {}", path.display()));
            return Ok(Err(FileOutcome::EmptyStub));
        }

        match self.cache.store(module, &stub) {
            Ok(stub_path) => {
                console::info(format!("Put stub file to {}", stub_path.display()));
                Ok(Ok(stub_path))
            }
            Err(e) => {
                console::warn(e.to_string());
                Ok(Err(FileOutcome::StubFailed {
                    reason: e.to_string(),
                }))
            }
        }
    }

    /// Run the reference generator and read back the header it wrote.
    fn generate_arginfo(
        &self,
        module: &str,
        stub_path: &Path,
    ) -> anyhow::Result<Result<Vec<u8>, FileOutcome>> {
        let run = match self.generator.generate_arginfo(stub_path) {
            Ok(run) => run,
            Err(GeneratorError::Fetch(e)) => {
                return Err(e).context("reference generator is unavailable");
            }
            Err(e) => {
                console::warn(format!(
                    "Generate arginfo header file for {} failed: {}",
                    module, e
                ));
                return Ok(Err(FileOutcome::GeneratorFailed {
                    exit_code: -1,
                    output: e.to_string(),
                }));
            }
        };

        let output = console::flatten(&run.output);
        if !self.cache.arginfo_path(module).is_file() || !run.success() {
            console::warn(format!(
                "Generate arginfo header file for {} failed with exit code {} and output: {}",
                module,
                run.exit_code(),
                output
            ));
            return Ok(Err(FileOutcome::GeneratorFailed {
                exit_code: run.exit_code(),
                output,
            }));
        }

        match self.cache.read_arginfo(module) {
            Ok(generated) => Ok(Ok(generated)),
            Err(e) => {
                console::warn(format!(
                    "Unable to read arginfo header for {}: {}",
                    module, e
                ));
                Ok(Err(FileOutcome::GeneratorFailed {
                    exit_code: run.exit_code(),
                    output: e.to_string(),
                }))
            }
        }
    }
}
