//! Integration tests for the update pipeline.
//!
//! The extension sources in `testdata/ext` are copied to a scratch
//! directory and updated with a generator that serves the headers in
//! `testdata/arginfo` instead of running PHP.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use php_arginfo::cache::StubCache;
use php_arginfo::generator::{Generator, GeneratorError, ProcessOutput, StubRequest};
use php_arginfo::scan;
use php_arginfo::update::{FileOutcome, UpdateSummary, Updater};
use tempfile::TempDir;
use walkdir::WalkDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Generator serving pre-built headers from testdata.
struct FixtureGenerator {
    stub_runs: Cell<usize>,
    arginfo_runs: Cell<usize>,
}

impl FixtureGenerator {
    fn new() -> Self {
        Self {
            stub_runs: Cell::new(0),
            arginfo_runs: Cell::new(0),
        }
    }
}

impl Generator for FixtureGenerator {
    fn generate_stub(&self, request: &StubRequest<'_>) -> Result<String, GeneratorError> {
        self.stub_runs.set(self.stub_runs.get() + 1);
        Ok(format!(
            "<?php\n/* functions: {} classes: {} */\n",
            request.function_filter(),
            request.class_filter()
        ))
    }

    fn generate_arginfo(&self, stub: &Path) -> Result<ProcessOutput, GeneratorError> {
        self.arginfo_runs.set(self.arginfo_runs.get() + 1);
        let file_name = stub.file_name().unwrap().to_string_lossy().to_string();
        let header_name = file_name.replace(".stub.php", "_arginfo.h");
        let fixture = testdata_path().join("arginfo").join(&header_name);
        if !fixture.is_file() {
            return Ok(ProcessOutput {
                status: Some(1),
                output: format!("no fixture for {}\n", header_name),
            });
        }
        fs::copy(&fixture, stub.with_file_name(&header_name)).unwrap();
        Ok(ProcessOutput {
            status: Some(0),
            output: String::new(),
        })
    }
}

/// Copy `testdata/ext` into a fresh directory.
fn setup() -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("should create temp dir");
    let src = testdata_path().join("ext");
    for entry in WalkDir::new(&src) {
        let entry = entry.expect("should walk testdata");
        let dest = temp.path().join(entry.path().strip_prefix(&src).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).unwrap();
        } else {
            fs::copy(entry.path(), &dest).unwrap();
        }
    }
    let src = temp_src(&temp);
    (temp, src)
}

fn temp_src(temp: &TempDir) -> PathBuf {
    temp.path().join("src")
}

fn run_update(
    temp: &TempDir,
    generator: &FixtureGenerator,
    use_cache: bool,
) -> UpdateSummary {
    let cache = StubCache::open(&temp.path().join("cache"), "swow", use_cache)
        .expect("should open cache");
    let files = scan::collect_sources(&temp_src(temp)).expect("should scan sources");
    Updater::new("swow", cache, generator)
        .run(&files)
        .expect("update should succeed")
}

#[test]
fn test_update_end_to_end() {
    let (temp, src) = setup();
    let generator = FixtureGenerator::new();

    let summary = run_update(&temp, &generator, true);

    assert_eq!(summary.files.len(), 3);
    assert_eq!(summary.functions(), 1);
    assert_eq!(summary.methods(), 4);
    assert_eq!(summary.replaced(), 1);
    assert!(!summary.has_problems());

    let foo = fs::read_to_string(src.join("swow_foo.c")).unwrap();
    assert!(foo.contains(
        "ZEND_BEGIN_ARG_WITH_RETURN_TYPE_INFO_EX(arginfo_swow_foo, 0, 1, IS_LONG, 0)\n    ZEND_ARG_TYPE_INFO_WITH_DEFAULT_VALUE(0, flags, IS_LONG, 0, \"0\")\nZEND_END_ARG_INFO()"
    ));
    assert!(foo.contains("PHP_FE(swow_foo, arginfo_swow_foo)"));
}

#[test]
fn test_function_only_file_summary() {
    let (temp, src) = setup();
    fs::remove_file(src.join("swow_buffer.c")).unwrap();
    let generator = FixtureGenerator::new();

    let summary = run_update(&temp, &generator, true);

    assert_eq!(summary.functions(), 1);
    assert_eq!(summary.methods(), 0);
    assert_eq!(summary.replaced(), 1);
}

#[test]
fn test_untouched_files_are_byte_identical() {
    let (temp, src) = setup();
    let generator = FixtureGenerator::new();

    let summary = run_update(&temp, &generator, true);

    for name in ["sub/swow_plain.c", "swow_buffer.c"] {
        let original = fs::read(testdata_path().join("ext/src").join(name)).unwrap();
        let current = fs::read(src.join(name)).unwrap();
        assert_eq!(original, current, "{} should not change", name);
    }

    let outcomes: Vec<_> = summary.files.iter().map(|f| f.outcome.clone()).collect();
    assert_eq!(
        outcomes,
        vec![
            FileOutcome::NoDeclarations,
            FileOutcome::UpToDate,
            FileOutcome::Updated
        ]
    );
}

#[test]
fn test_non_standard_method_is_flagged() {
    let (temp, _src) = setup();
    let generator = FixtureGenerator::new();

    let summary = run_update(&temp, &generator, true);

    let buffer = summary
        .files
        .iter()
        .find(|f| f.path.ends_with("swow_buffer.c"))
        .unwrap();
    assert_eq!(buffer.non_standard, 1);
    assert!(buffer.missing.is_empty());
}

#[test]
fn test_second_cached_run_is_stable() {
    let (temp, _src) = setup();
    let generator = FixtureGenerator::new();

    run_update(&temp, &generator, true);
    assert_eq!(generator.stub_runs.get(), 2);

    let summary = run_update(&temp, &generator, true);
    assert_eq!(summary.replaced(), 0);
    assert_eq!(generator.stub_runs.get(), 2, "cached stubs should be reused");
    assert_eq!(generator.arginfo_runs.get(), 4);
}

#[test]
fn test_clear_cache_regenerates_stubs() {
    let (temp, _src) = setup();
    let generator = FixtureGenerator::new();

    run_update(&temp, &generator, true);
    run_update(&temp, &generator, false);
    run_update(&temp, &generator, false);

    assert_eq!(generator.stub_runs.get(), 6);
}

#[test]
fn test_stub_is_stored_in_cache() {
    let (temp, _src) = setup();
    let generator = FixtureGenerator::new();

    run_update(&temp, &generator, true);

    let stub = temp
        .path()
        .join("cache/stub/swow/swow_buffer.stub.php");
    let content = fs::read_to_string(stub).expect("stub should be cached");
    assert!(content.contains("classes: Swow_Buffer"));
}

#[test]
fn test_non_utf8_source_is_updated() {
    let (temp, src) = setup();
    let path = src.join("swow_foo.c");
    let mut content = b"/* Author: Jos\xe9 */\n".to_vec();
    content.extend(fs::read(&path).unwrap());
    fs::write(&path, &content).unwrap();
    let generator = FixtureGenerator::new();

    let summary = run_update(&temp, &generator, true);

    assert_eq!(summary.functions(), 1);
    assert_eq!(summary.replaced(), 1);
    assert!(!summary.has_problems());
    let updated = fs::read(&path).unwrap();
    assert!(updated.starts_with(b"/* Author: Jos\xe9 */\n"));
    assert!(String::from_utf8_lossy(&updated).contains("ZEND_ARG_TYPE_INFO_WITH_DEFAULT_VALUE(0, flags, IS_LONG, 0, \"0\")"));
}
