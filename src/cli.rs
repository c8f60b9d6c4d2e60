//! Command-line interface for update-arginfo.

use clap::Parser;
use std::path::PathBuf;

use crate::cache::StubCache;
use crate::console;
use crate::generator::{HttpDownloader, PhpGenerator};
use crate::report;
use crate::scan;
use crate::update::Updater;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default name of the extension's stub generator, looked up next to the executable.
const DEFAULT_STUB_GENERATOR: &str = "gen-stub.php";

/// Regenerate arginfo declarations of a PHP extension from its stubs.
///
/// Every C source under the extension source path is scanned for
/// PHP_FUNCTION and PHP_ME declarations. A stub is generated for them with
/// the extension loaded, php-src's gen_stub.php turns it into arginfo, and
/// the declarations in the source are replaced by the regenerated ones.
#[derive(Parser, Debug)]
#[command(name = "update-arginfo")]
#[command(author, version, about, long_about = None)]
#[command(
    override_usage = "update-arginfo [--clear-cache] [--cache-path=/path/to/cache] [--stub-file=/path/to/ext.stub.php] \\\n         <extension-name> <extension-source-path> <extension-build-dir>"
)]
pub struct Cli {
    /// Extension name, loaded with `-d extension=<name>`
    #[arg(value_name = "extension-name")]
    pub extension_name: String,

    /// Directory containing the extension's C sources
    #[arg(value_name = "extension-source-path")]
    pub source_dir: PathBuf,

    /// Directory holding gen_stub.php and its patched copy
    #[arg(value_name = "extension-build-dir")]
    pub build_dir: PathBuf,

    /// Regenerate stubs even when cached ones exist
    #[arg(long)]
    pub clear_cache: bool,

    /// Cache root (default: system temp dir)
    #[arg(long, value_name = "DIR")]
    pub cache_path: Option<PathBuf>,

    /// Stub file passed through to the stub generator
    #[arg(long, value_name = "PATH")]
    pub stub_file: Option<PathBuf>,

    /// PHP interpreter
    #[arg(long, env = "PHP_BINARY", default_value = "php")]
    pub php: PathBuf,

    /// Extension stub generator script (default: gen-stub.php beside this executable)
    #[arg(long, env = "PHP_ARGINFO_STUB_GENERATOR", value_name = "PATH")]
    pub stub_generator: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Exit non-zero when any file could not be fully updated
    #[arg(long)]
    pub strict: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

fn default_stub_generator() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_STUB_GENERATOR)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STUB_GENERATOR))
}

/// Run an update with parsed arguments.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Validate format
    if cli.format != "pretty" && cli.format != "json" {
        console::error(format!(
            "invalid format {:?}, must be 'pretty' or 'json'",
            cli.format
        ));
        return Ok(EXIT_ERROR);
    }

    if cli.clear_cache {
        console::info("Run without cache");
    }

    let cache_root = cli.cache_path.clone().unwrap_or_else(std::env::temp_dir);
    let cache = match StubCache::open(&cache_root, &cli.extension_name, !cli.clear_cache) {
        Ok(cache) => cache,
        Err(e) => {
            console::error(e.to_string());
            return Ok(EXIT_ERROR);
        }
    };
    console::info(format!("Stub cache path is {}", cache.dir().display()));

    let files = match scan::collect_sources(&cli.source_dir) {
        Ok(files) => files,
        Err(e) => {
            console::error(e.to_string());
            return Ok(EXIT_ERROR);
        }
    };
    console::debug(format!("{} source files found", files.len()));

    let stub_generator = cli
        .stub_generator
        .clone()
        .unwrap_or_else(default_stub_generator);
    if !stub_generator.is_file() {
        console::warn(format!(
            "Stub generator {} does not exist",
            stub_generator.display()
        ));
    }

    let generator = PhpGenerator::new(
        &cli.php,
        stub_generator,
        &cli.build_dir,
        Box::new(HttpDownloader::new()?),
    );
    let updater =
        Updater::new(&cli.extension_name, cache, &generator).stub_template(cli.stub_file.clone());
    let summary = updater.run(&files)?;

    match cli.format.as_str() {
        "json" => report::write_json(&cli.extension_name, &summary)?,
        _ => report::write_pretty(&summary),
    }

    if cli.strict && summary.has_problems() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}
