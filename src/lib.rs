//! php-arginfo - keep PHP extension arginfo in sync with its stubs.
//!
//! C sources of a PHP extension declare functions with `PHP_FUNCTION` and
//! methods with `PHP_ME`, and carry hand-maintained `ZEND_BEGIN_ARG...`
//! tables describing their signatures. This crate regenerates those tables
//! with php-src's `gen_stub.php` and writes them back into the sources.
//!
//! # Architecture
//!
//! - `scan`: discovery of `.c`, `.cc` and `.cpp` sources
//! - `extract`: function and method declarations found by regex
//! - `cache`: per-extension stub and header cache
//! - `generator`: PHP subprocesses and the patched reference generator
//! - `arginfo`: locating, normalizing and replacing declarations
//! - `update`: the per-file pipeline tying these together
//! - `report`: output formatting (pretty, JSON)
//!
//! Everything runs sequentially on one thread.

pub mod arginfo;
pub mod cache;
pub mod cli;
pub mod console;
pub mod extract;
pub mod generator;
pub mod report;
pub mod scan;
pub mod update;

pub use cache::StubCache;
pub use extract::{extract_declarations, Declarations, MethodDeclaration};
pub use generator::{Generator, GeneratorError, PhpGenerator, ProcessOutput, StubRequest};
pub use update::{FileOutcome, FileReport, UpdateSummary, Updater};
