mod commands;
mod formatting;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use precheck_core::report::EXIT_ORCHESTRATION_ERROR;
use precheck_core::Baseline;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "precheck")]
#[command(about = "Change-aware, per-package commit checks for monorepos")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Monorepo root to discover packages under.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long, global = true, action)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run each affected package's checks against its changed files.
    Check {
        #[command(flatten)]
        baseline: BaselineArgs,
        /// Only check these packages (name or path relative to the root).
        #[arg(short, long = "package", value_name = "NAME")]
        packages: Vec<String>,
        /// Packages checked in parallel.
        #[arg(short = 'j', long)]
        jobs: Option<usize>,
        /// Stop a package's remaining checks after its first failure.
        #[arg(long, action, overrides_with = "no_fail_fast")]
        fail_fast: bool,
        /// Run every check even if the workspace enables fail-fast.
        #[arg(long, action, overrides_with = "fail_fast")]
        no_fail_fast: bool,
        /// Cancel the run after this many seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        #[arg(long, action)]
        json: bool,
    },
    /// Show which packages a change set affects, without running checks.
    Affected {
        #[command(flatten)]
        baseline: BaselineArgs,
        #[arg(long, action)]
        json: bool,
    },
    /// List discovered packages.
    List {
        #[arg(long, action)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
#[group(required = false, multiple = false)]
struct BaselineArgs {
    /// Files staged for commit (default).
    #[arg(long, action)]
    staged: bool,
    /// Staged, unstaged and untracked files.
    #[arg(long, action)]
    working_tree: bool,
    /// Files changed in a commit or range, e.g. `main...HEAD`.
    #[arg(long, value_name = "RANGE")]
    rev: Option<String>,
    /// Explicit file list; `-` reads paths from stdin.
    #[arg(long, num_args = 1.., value_name = "FILE")]
    files: Vec<PathBuf>,
}

impl BaselineArgs {
    fn into_baseline(self) -> Result<Baseline> {
        if self.working_tree {
            Ok(Baseline::WorkingTree)
        } else if let Some(rev) = self.rev {
            Ok(Baseline::Revision(rev))
        } else if self.files.len() == 1 && self.files[0].as_os_str() == "-" {
            Ok(Baseline::Files(commands::read_stdin_paths()?))
        } else if !self.files.is_empty() {
            Ok(Baseline::Files(self.files))
        } else {
            Ok(Baseline::Staged)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let log_level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Check {
            baseline,
            packages,
            jobs,
            fail_fast,
            no_fail_fast,
            timeout,
            json,
        } => commands::cmd_check(
            cli.root,
            commands::CheckOptions {
                baseline: baseline.into_baseline()?,
                packages,
                jobs,
                fail_fast: match (fail_fast, no_fail_fast) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                timeout,
                json,
            },
        ),
        Commands::Affected { baseline, json } => {
            commands::cmd_affected(cli.root, baseline.into_baseline()?, json)?;
            Ok(0)
        }
        Commands::List { json } => {
            commands::cmd_list(cli.root, json)?;
            Ok(0)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(EXIT_ORCHESTRATION_ERROR as u8)
        }
    }
}
