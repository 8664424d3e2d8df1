//! Running one package's checks against its changed files.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::{debug, warn};

use crate::adapter::EnvironmentHandle;
use crate::affected::AffectedPackage;
use crate::cancel::CancellationToken;
use crate::command_validator::CommandValidator;
use crate::package::CheckSpec;
use crate::report::{CheckResult, CheckStatus};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What to do with a package's remaining checks after one fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Run every check to surface all problems in one pass.
    #[default]
    RunAll,
    /// Record the remaining checks as not run.
    StopOnFailure,
}

/// Runs checks sequentially, in declaration order, within one package.
#[derive(Debug, Clone, Default)]
pub struct CheckDispatcher {
    validator: CommandValidator,
    policy: FailurePolicy,
}

impl CheckDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dispatch(
        &self,
        affected: &AffectedPackage,
        environment: &EnvironmentHandle,
        cancel: &CancellationToken,
    ) -> Vec<CheckResult> {
        self.dispatch_with(affected, environment, cancel, &mut |_| {})
    }

    /// Like [`dispatch`](Self::dispatch), reporting each result as it is produced.
    pub fn dispatch_with(
        &self,
        affected: &AffectedPackage,
        environment: &EnvironmentHandle,
        cancel: &CancellationToken,
        on_result: &mut dyn FnMut(&CheckResult),
    ) -> Vec<CheckResult> {
        let package = &affected.package;
        let mut results = Vec::with_capacity(package.checks.len());
        let mut halted = false;

        for check in &package.checks {
            let result = if halted {
                CheckResult::not_run(&package.name, &check.name)
            } else if cancel.is_cancelled() {
                CheckResult::cancelled(&package.name, &check.name)
            } else {
                let result = self.run_check(affected, check, environment, cancel);
                if self.policy == FailurePolicy::StopOnFailure && result.status.is_failure() {
                    halted = true;
                }
                result
            };
            on_result(&result);
            results.push(result);
        }

        results
    }

    /// One error result per declared check, for a package that cannot run.
    pub fn error_results(affected: &AffectedPackage, message: &str) -> Vec<CheckResult> {
        affected
            .package
            .checks
            .iter()
            .map(|c| CheckResult::error(&affected.package.name, &c.name, message))
            .collect()
    }

    fn select_files(affected: &AffectedPackage, check: &CheckSpec) -> Result<Vec<PathBuf>, String> {
        let files = affected.relative_files();
        let Some(pattern) = &check.include else {
            return Ok(files);
        };
        let re = Regex::new(pattern).map_err(|e| format!("invalid include pattern: {}", e))?;
        Ok(files
            .into_iter()
            .filter(|f| re.is_match(&f.to_string_lossy().replace('\\', "/")))
            .collect())
    }

    fn run_check(
        &self,
        affected: &AffectedPackage,
        check: &CheckSpec,
        environment: &EnvironmentHandle,
        cancel: &CancellationToken,
    ) -> CheckResult {
        let package = &affected.package;

        if let Err(message) = self.validator.validate(&check.command) {
            return CheckResult::error(&package.name, &check.name, message);
        }

        let files = match Self::select_files(affected, check) {
            Ok(files) => files,
            Err(message) => return CheckResult::error(&package.name, &check.name, message),
        };
        if !affected.whole_package && files.is_empty() {
            return CheckResult::skipped(&package.name, &check.name, "no files to check");
        }
        let args: &[PathBuf] = if check.pass_filenames { &files } else { &[] };

        debug!(
            package = %package.name,
            check = %check.name,
            files = args.len(),
            environment = %environment.id,
            "dispatching check"
        );

        let start = Instant::now();
        let mut command = environment.command("sh", &package.root);
        command
            .arg("-c")
            .arg(format!("{} \"$@\"", check.command))
            .arg(&check.name)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so cancellation reaches everything the check forks.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let spawned = command.spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                return CheckResult::error(
                    &package.name,
                    &check.name,
                    format!("failed to start: {}", e),
                )
            }
        };

        let stdout = Capture::stdout(&mut child);
        let stderr = Capture::stderr(&mut child);

        let mut result = CheckResult {
            files,
            ..CheckResult::not_run(&package.name, &check.name)
        };

        match wait_or_cancel(&mut child, cancel) {
            Ok(Some(status)) => {
                result.stdout = stdout.finish();
                result.stderr = stderr.finish();
                result.exit_code = status.code();
                result.status = match status.code() {
                    Some(0) => CheckStatus::Passed,
                    Some(126) | Some(127) => {
                        result.message = Some("command not found or not executable".to_string());
                        CheckStatus::Error
                    }
                    Some(_) => CheckStatus::Failed,
                    None => {
                        result.message = Some("terminated by signal".to_string());
                        CheckStatus::Failed
                    }
                };
            }
            Ok(None) => {
                result.stdout = stdout.snapshot();
                result.stderr = stderr.snapshot();
                result.status = CheckStatus::Cancelled;
                result.message = Some("run was cancelled".to_string());
            }
            Err(e) => {
                result.stdout = stdout.snapshot();
                result.stderr = stderr.snapshot();
                result.status = CheckStatus::Error;
                result.message = Some(format!("failed to wait for process: {}", e));
            }
        }
        result.duration = start.elapsed();
        result
    }
}

/// Waits for `child`, killing it if `cancel` fires first.
///
/// Returns `Ok(None)` when the child was killed.
fn wait_or_cancel(
    child: &mut Child,
    cancel: &CancellationToken,
) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if cancel.is_cancelled() {
            terminate(child);
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kills the check's process group, falling back to the direct child.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    if let Ok(pid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: plain syscall on a group we created; the leader is not yet
        // reaped, so the id cannot have been reused.
        if unsafe { libc::kill(-pid, libc::SIGKILL) } == 0 {
            return;
        }
        warn!(
            error = %std::io::Error::last_os_error(),
            "failed to kill process group of cancelled check"
        );
    }
    kill_child(child);
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    kill_child(child);
}

fn kill_child(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!(error = %e, "failed to kill cancelled check");
    }
}

/// Drains one output stream on a background thread.
struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
}

impl Capture {
    fn stdout(child: &mut Child) -> Self {
        Self::spawn(child.stdout.take())
    }

    fn stderr(child: &mut Child) -> Self {
        Self::spawn(child.stderr.take())
    }

    fn spawn<R>(stream: Option<R>) -> Self
    where
        R: Read + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let handle = stream.map(|mut stream| {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                let mut chunk = [0u8; 8192];
                loop {
                    match stream.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if let Ok(mut buf) = buffer.lock() {
                                buf.extend_from_slice(&chunk[..n]);
                            }
                        }
                    }
                }
            })
        });
        Self { buffer, handle }
    }

    /// Waits for the stream to close and returns everything read.
    fn finish(mut self) -> String {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.snapshot()
    }

    /// Whatever has been read so far, without waiting.
    fn snapshot(&self) -> String {
        self.buffer
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).to_string())
            .unwrap_or_default()
    }
}
