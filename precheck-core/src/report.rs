//! Check results and their aggregation into a run report.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::affected::AffectedPackage;

/// Exit code when every check passed or nothing was affected.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code when checks ran and at least one failed, errored or was cancelled.
pub const EXIT_CHECKS_FAILED: i32 = 1;
/// Exit code when the run scope could not be established.
pub const EXIT_ORCHESTRATION_ERROR: i32 = 2;

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Ran and exited successfully.
    Passed,
    /// Ran and reported problems.
    Failed,
    /// Could not run at all.
    Error,
    /// No files matched the check's filter.
    Skipped,
    /// Interrupted by run cancellation.
    Cancelled,
    /// Never started.
    NotRun,
}

impl CheckStatus {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Passed => "passed",
            CheckStatus::Failed => "failed",
            CheckStatus::Error => "error",
            CheckStatus::Skipped => "skipped",
            CheckStatus::Cancelled => "cancelled",
            CheckStatus::NotRun => "not_run",
        }
    }

    /// Whether this status makes the run fail.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CheckStatus::Failed | CheckStatus::Error | CheckStatus::Cancelled
        )
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one check command for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub package: String,
    pub check: String,
    pub status: CheckStatus,
    /// Process exit code, when the process exited normally.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Why the check errored, was skipped or was cancelled.
    pub message: Option<String>,
    /// File arguments, relative to the package root.
    pub files: Vec<PathBuf>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl CheckResult {
    fn bare(package: &str, check: &str, status: CheckStatus) -> Self {
        Self {
            package: package.to_string(),
            check: check.to_string(),
            status,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            message: None,
            files: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn error(package: &str, check: &str, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::bare(package, check, CheckStatus::Error)
        }
    }

    pub fn skipped(package: &str, check: &str, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::bare(package, check, CheckStatus::Skipped)
        }
    }

    pub fn cancelled(package: &str, check: &str) -> Self {
        Self {
            message: Some("run was cancelled".to_string()),
            ..Self::bare(package, check, CheckStatus::Cancelled)
        }
    }

    pub fn not_run(package: &str, check: &str) -> Self {
        Self::bare(package, check, CheckStatus::NotRun)
    }

    /// Combined output, stdout first.
    pub fn output(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Per-status tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub passed: usize,
    pub failed: usize,
    pub error: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub not_run: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: CheckStatus) {
        match status {
            CheckStatus::Passed => self.passed += 1,
            CheckStatus::Failed => self.failed += 1,
            CheckStatus::Error => self.error += 1,
            CheckStatus::Skipped => self.skipped += 1,
            CheckStatus::Cancelled => self.cancelled += 1,
            CheckStatus::NotRun => self.not_run += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.error + self.skipped + self.cancelled + self.not_run
    }
}

/// Overall state of one package in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    Passed,
    Failed,
    Error,
    Cancelled,
    NotRun,
}

impl PackageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Passed => "passed",
            PackageStatus::Failed => "failed",
            PackageStatus::Error => "error",
            PackageStatus::Cancelled => "cancelled",
            PackageStatus::NotRun => "not_run",
        }
    }

    fn from_results(results: &[CheckResult]) -> Self {
        let any = |status: CheckStatus| results.iter().any(|r| r.status == status);
        if any(CheckStatus::Cancelled) {
            PackageStatus::Cancelled
        } else if !results.is_empty() && results.iter().all(|r| r.status == CheckStatus::NotRun) {
            PackageStatus::NotRun
        } else if any(CheckStatus::Error) {
            PackageStatus::Error
        } else if any(CheckStatus::Failed) {
            PackageStatus::Failed
        } else {
            PackageStatus::Passed
        }
    }
}

/// Everything one package worker produced.
#[derive(Debug, Clone)]
pub struct PackageOutcome {
    /// Position of the package in the affected sequence.
    pub index: usize,
    pub environment: Option<String>,
    pub results: Vec<CheckResult>,
    /// The run was cancelled before or while this package ran.
    pub cancelled: bool,
}

/// Results of one affected package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    pub name: String,
    pub root: PathBuf,
    /// Changed files, relative to the package root.
    pub files: Vec<PathBuf>,
    pub environment: Option<String>,
    pub status: PackageStatus,
    pub results: Vec<CheckResult>,
}

impl PackageReport {
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for result in &self.results {
            counts.add(result.status);
        }
        counts
    }
}

/// Overall state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Passed,
    Failed,
    Cancelled,
}

/// Final report of a run, packages in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub packages: Vec<PackageReport>,
    /// Changed files that belong to no package.
    pub ignored: Vec<PathBuf>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Passed
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_CHECKS_FAILED
        }
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for result in self.packages.iter().flat_map(|p| p.results.iter()) {
            counts.add(result.status);
        }
        counts
    }

    pub fn get_package(&self, name: &str) -> Option<&PackageReport> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for package in &self.packages {
            let c = package.counts();
            writeln!(
                f,
                "{} [{}]: {} passed, {} failed, {} error, {} skipped",
                package.name,
                package.status.as_str(),
                c.passed,
                c.failed,
                c.error,
                c.skipped
            )?;
            for result in &package.results {
                match &result.message {
                    Some(message) => writeln!(f, "  {} {}: {}", result.status, result.check, message)?,
                    None => writeln!(f, "  {} {}", result.status, result.check)?,
                }
            }
        }
        let c = self.counts();
        write!(
            f,
            "{} packages, {} checks: {} passed, {} failed, {} error, {} cancelled, {} not run",
            self.packages.len(),
            c.total(),
            c.passed,
            c.failed,
            c.error,
            c.cancelled,
            c.not_run
        )
    }
}

/// Builds the run report from worker outcomes received in any order.
///
/// Packages are reported in the order of `affected`. A package without an
/// outcome is reported with every check `not_run`, so none is ever omitted.
pub fn aggregate(
    affected: &[AffectedPackage],
    outcomes: Vec<PackageOutcome>,
    ignored: Vec<PathBuf>,
) -> RunReport {
    let cancelled = outcomes.iter().any(|o| o.cancelled);
    let mut slots: Vec<Option<PackageOutcome>> = vec![None; affected.len()];
    for outcome in outcomes {
        if let Some(slot) = slots.get_mut(outcome.index) {
            *slot = Some(outcome);
        }
    }

    let packages: Vec<PackageReport> = affected
        .iter()
        .zip(slots)
        .map(|(entry, outcome)| {
            let (environment, results, status) = match outcome {
                Some(outcome) => {
                    let never_started = outcome
                        .results
                        .iter()
                        .all(|r| r.status == CheckStatus::NotRun);
                    let status = if outcome.cancelled && never_started {
                        PackageStatus::NotRun
                    } else {
                        PackageStatus::from_results(&outcome.results)
                    };
                    (outcome.environment, outcome.results, status)
                }
                None => (
                    None,
                    entry
                        .package
                        .checks
                        .iter()
                        .map(|c| CheckResult::not_run(&entry.package.name, &c.name))
                        .collect(),
                    PackageStatus::NotRun,
                ),
            };
            PackageReport {
                name: entry.package.name.clone(),
                root: entry.package.root.clone(),
                files: entry.relative_files(),
                environment,
                status,
                results,
            }
        })
        .collect();

    let failed = packages
        .iter()
        .flat_map(|p| p.results.iter())
        .any(|r| r.status.is_failure());

    let status = if cancelled {
        RunStatus::Cancelled
    } else if failed {
        RunStatus::Failed
    } else {
        RunStatus::Passed
    };

    RunReport {
        status,
        packages,
        ignored,
    }
}
