//! update-arginfo CLI entry point.

use clap::error::ErrorKind;
use clap::Parser;
use php_arginfo::cli::{self, Cli, EXIT_ERROR};
use php_arginfo::console;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayVersion => e.exit(),
        Err(e) => {
            // Usage and help both end the run unsuccessfully.
            let _ = e.print();
            std::process::exit(EXIT_ERROR);
        }
    };

    let exit_code = match cli::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            console::error(format!("{:#}", e));
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
