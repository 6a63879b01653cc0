//! Sanador CLI: locator-table maintenance for UI test suites
//!
//! ## Usage
//!
//! ```bash
//! sanador show object_repository/Login_Elements.csv
//! sanador fmt --check object_repository/Login_Elements.csv
//! sanador check Login_Elements.csv --url https://app.example.test/login
//! sanador heal Login_Elements.csv --url https://app.example.test/login \
//!     --endpoint http://localhost:8081
//! ```

use clap::Parser;
use sanador::{Cli, CliResult, Commands, Reporter};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let reporter = Reporter::new(cli.quiet);

    match cli.command {
        Commands::Show(args) => sanador::run_show(&reporter, &args),
        Commands::Fmt(args) => sanador::run_fmt(&reporter, &args),
        #[cfg(feature = "browser")]
        Commands::Check(args) => sanador::run_check(&reporter, &args),
        #[cfg(feature = "browser")]
        Commands::Heal(args) => sanador::run_heal(&reporter, &args),
        #[cfg(not(feature = "browser"))]
        Commands::Check(_) | Commands::Heal(_) => Err(sanador::CliError::config(
            "live commands require the 'browser' feature; rebuild with --features browser",
        )),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sanar={default},sanador={default}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
