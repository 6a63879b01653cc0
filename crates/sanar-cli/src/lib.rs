//! Sanador CLI library
//!
//! Command-line interface for Sanar locator tables: inspect, format,
//! live-check, and heal.

#![warn(missing_docs)]

mod commands;
mod error;
mod handlers;
mod output;

pub use commands::{CheckArgs, Cli, Commands, FmtArgs, HealArgs, ShowArgs};
pub use error::{CliError, CliResult};
pub use handlers::{run_fmt, run_show};
pub use output::Reporter;

#[cfg(feature = "browser")]
pub use handlers::{run_check, run_heal};
