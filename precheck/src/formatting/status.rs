//! Status symbols and one-line messages.

use owo_colors::{AnsiColors, OwoColorize};
use precheck_core::{CheckStatus, PackageStatus};

/// Display category shared by check, package and run outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

impl Status {
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Success => "✓",
            Status::Error => "✗",
            Status::Warning => "⚠",
            Status::Info => "→",
        }
    }

    fn color(&self) -> AnsiColors {
        match self {
            Status::Success => AnsiColors::Green,
            Status::Error => AnsiColors::Red,
            Status::Warning => AnsiColors::Yellow,
            Status::Info => AnsiColors::Cyan,
        }
    }

    /// Symbol and message, both in the status color.
    pub fn format(&self, message: &str) -> String {
        format!(
            "{} {}",
            self.symbol().color(self.color()),
            message.color(self.color()).bold()
        )
    }
}

impl From<CheckStatus> for Status {
    fn from(status: CheckStatus) -> Self {
        match status {
            CheckStatus::Passed => Status::Success,
            CheckStatus::Failed | CheckStatus::Error => Status::Error,
            CheckStatus::Cancelled | CheckStatus::NotRun => Status::Warning,
            CheckStatus::Skipped => Status::Info,
        }
    }
}

impl From<PackageStatus> for Status {
    fn from(status: PackageStatus) -> Self {
        match status {
            PackageStatus::Passed => Status::Success,
            PackageStatus::Failed | PackageStatus::Error => Status::Error,
            PackageStatus::Cancelled | PackageStatus::NotRun => Status::Warning,
        }
    }
}

pub fn print_success(message: &str) {
    println!("  {}", Status::Success.format(message));
}

pub fn print_error(message: &str) {
    println!("  {}", Status::Error.format(message));
}

pub fn print_warning(message: &str) {
    println!("  {}", Status::Warning.format(message));
}
