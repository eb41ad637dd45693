//! envkey - secrets without servers.

use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use envkey::cli::{self, Cli};

/// Usage errors exit with 64 per the documented exit-code contract.
const EXIT_USAGE: i32 = 64;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => EXIT_USAGE,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    if let Err(err) = cli::execute(cli) {
        eprintln!("{} {}", "error:".red().bold(), err);
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "envkey=debug" } else { "envkey=warn" };
    let filter = EnvFilter::try_from_env("ENVKEY_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
