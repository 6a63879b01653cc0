//! Output formatting for command results

use console::style;

/// Line-oriented reporter for command output.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    /// Quiet mode suppresses non-error output
    pub quiet: bool,
}

impl Reporter {
    /// Create a reporter
    #[must_use]
    pub const fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Print an informational line
    pub fn line(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", message.as_ref());
        }
    }

    /// Print a table entry
    pub fn entry(&self, name: &str, selector: &str) {
        if !self.quiet {
            println!("  {}  {}", style(name).cyan(), selector);
        }
    }

    /// Print a passing verification
    pub fn ok(&self, name: &str, selector: &str) {
        if !self.quiet {
            println!("  {} {}  {}", style("ok").green(), style(name).cyan(), selector);
        }
    }

    /// Print a stale entry
    pub fn stale(&self, name: &str, selector: &str) {
        if !self.quiet {
            println!(
                "  {} {}  {}",
                style("stale").red().bold(),
                style(name).cyan(),
                selector
            );
        }
    }

    /// Print a healed entry
    pub fn healed(&self, name: &str, old: &str, new: &str) {
        if !self.quiet {
            println!(
                "  {} {}  {} -> {}",
                style("healed").yellow().bold(),
                style(name).cyan(),
                old,
                new
            );
        }
    }

    /// Print a summary line
    pub fn summary(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", style(message.as_ref()).bold());
        }
    }
}
