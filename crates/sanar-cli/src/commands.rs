//! CLI command definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sanador: CLI for Sanar - self-healing locator tables for UI tests
#[derive(Parser, Debug)]
#[command(name = "sanador")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the entries of a locator table
    Show(ShowArgs),

    /// Rewrite a locator table through the canonical codec
    Fmt(FmtArgs),

    /// Verify every entry of a table against a live page
    Check(CheckArgs),

    /// Heal stale entries of a table against a live page
    Heal(HealArgs),
}

/// Arguments for the show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Locator CSV file
    pub file: PathBuf,
}

/// Arguments for the fmt command
#[derive(Parser, Debug)]
pub struct FmtArgs {
    /// Locator CSV file
    pub file: PathBuf,

    /// Only verify the file is canonically formatted; do not rewrite
    #[arg(long)]
    pub check: bool,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Locator CSV file
    pub file: PathBuf,

    /// Page URL to verify against
    #[arg(long)]
    pub url: String,

    /// Properties file with session settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verification timeout per entry, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Run the browser with a visible window
    #[arg(long)]
    pub headed: bool,

    /// Disable the browser sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,
}

/// Arguments for the heal command
#[derive(Parser, Debug)]
pub struct HealArgs {
    /// Locator CSV file
    pub file: PathBuf,

    /// Page URL to verify against
    #[arg(long)]
    pub url: String,

    /// Properties file with session settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Suggestion endpoint base URL (overrides the properties file)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Suggestion model name (overrides the properties file)
    #[arg(long)]
    pub model: Option<String>,

    /// Verification timeout per entry, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Run the browser with a visible window
    #[arg(long)]
    pub headed: bool,

    /// Disable the browser sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,
}
