//! The `check` command: dispatch checks for affected packages.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use owo_colors::OwoColorize;
use precheck_adapters::default_registry;
use precheck_core::{
    partition, Baseline, CancellationToken, CheckDispatcher, CheckStatus, EnvironmentResolver,
    FailurePolicy, Orchestrator, RunEvent, RunReport, RunStatus,
};
use tracing::warn;

use crate::formatting::{
    create_progress_bar, format_duration, print_error, print_result_table, print_section_header,
    print_success, print_summary_box, print_warning, SectionStyle,
};

use super::Workspace;

pub struct CheckOptions {
    pub baseline: Baseline,
    pub packages: Vec<String>,
    pub jobs: Option<usize>,
    /// `None` defers to the workspace file.
    pub fail_fast: Option<bool>,
    pub timeout: Option<u64>,
    pub json: bool,
}

pub fn cmd_check(root: PathBuf, options: CheckOptions) -> Result<i32> {
    let start = Instant::now();
    let workspace = Workspace::load(&root)?;
    let changes = workspace.resolve_changes(&options.baseline)?;

    for name in &options.packages {
        if !workspace.packages.iter().any(|p| &p.name == name)
            && !workspace.packages.iter().any(|p| p.root == workspace.root.join(name))
        {
            warn!(package = %name, "--package does not match any discovered package");
        }
    }

    let mapping = partition(&workspace.packages, &changes)
        .include_always(&workspace.packages, &workspace.config.always_check)
        .retain_packages(&options.packages, &workspace.root);

    let timeout = options.timeout.or(workspace.config.timeout_secs);
    let mut cancel = CancellationToken::new();
    if let Some(secs) = timeout {
        cancel = cancel.with_timeout(Duration::from_secs(secs));
    }
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(error = %e, "failed to install interrupt handler");
    }

    let fail_fast = options
        .fail_fast
        .or(workspace.config.fail_fast)
        .unwrap_or(false);
    let policy = if fail_fast {
        FailurePolicy::StopOnFailure
    } else {
        FailurePolicy::RunAll
    };

    let mut orchestrator = Orchestrator::new(Arc::new(EnvironmentResolver::new(default_registry())))
        .with_dispatcher(CheckDispatcher::new().with_policy(policy))
        .with_cancellation(cancel);
    if let Some(jobs) = options.jobs.or(workspace.config.concurrency) {
        orchestrator = orchestrator.with_concurrency(jobs);
    }

    if !options.json {
        print_section_header("Running checks", SectionStyle::Primary);
    }

    let report = if options.json || mapping.is_empty() {
        orchestrator.run(&mapping)
    } else {
        let pb = create_progress_bar(mapping.affected.len() as u64);
        pb.set_message("Checking...");
        let observer_pb = pb.clone();
        let report = orchestrator
            .with_observer(move |event| match event {
                RunEvent::PackageStarted { package, .. } => {
                    observer_pb.set_message(package.to_string());
                }
                RunEvent::PackageFinished { .. } => observer_pb.inc(1),
                RunEvent::CheckFinished { .. } => observer_pb.tick(),
            })
            .run(&mapping);
        pb.finish_and_clear();
        report
    };

    if options.json {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report, start.elapsed());
    }

    Ok(report.exit_code())
}

fn print_report(report: &RunReport, elapsed: Duration) {
    if report.packages.is_empty() {
        print_success("No affected packages, nothing to check");
        println!();
        return;
    }

    print_result_table(report);
    println!();

    for package in &report.packages {
        for result in &package.results {
            if !matches!(result.status, CheckStatus::Failed | CheckStatus::Error) {
                continue;
            }
            let output = result.output();
            if output.is_empty() {
                continue;
            }
            print_section_header(
                &format!("{}::{}", package.name, result.check),
                SectionStyle::Error,
            );
            for line in output.lines() {
                println!("  {}", line);
            }
            println!();
        }
    }

    let counts = report.counts();
    print_summary_box(
        "Summary",
        &[
            ("Packages", &report.packages.len().to_string()),
            ("Passed", &counts.passed.to_string()),
            ("Failed", &counts.failed.to_string()),
            ("Errors", &counts.error.to_string()),
            ("Skipped", &counts.skipped.to_string()),
            ("Cancelled", &(counts.cancelled + counts.not_run).to_string()),
            ("Duration", &format_duration(elapsed.as_secs_f64())),
        ],
    );
    println!();

    if !report.ignored.is_empty() {
        println!(
            "  {} {}",
            report.ignored.len().to_string().bold(),
            "changed files outside any package were ignored".bright_black()
        );
        println!();
    }

    match report.status {
        RunStatus::Passed => {
            print_success(&format!("All checks passed in {} packages", report.packages.len()))
        }
        RunStatus::Failed => print_error(&format!(
            "{} failed, {} could not run",
            counts.failed, counts.error
        )),
        RunStatus::Cancelled => print_warning("Run cancelled before all checks finished"),
    }
}
