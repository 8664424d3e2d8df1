//! Parallel dispatch of affected packages and report assembly.

use std::sync::Arc;

use crossbeam::channel;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::affected::{AffectedMapping, AffectedPackage};
use crate::cancel::CancellationToken;
use crate::dispatcher::CheckDispatcher;
use crate::environment::EnvironmentResolver;
use crate::report::{aggregate, CheckResult, CheckStatus, PackageOutcome, RunReport};

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone, Copy)]
pub enum RunEvent<'a> {
    PackageStarted {
        index: usize,
        package: &'a str,
    },
    CheckFinished {
        index: usize,
        result: &'a CheckResult,
    },
    PackageFinished {
        index: usize,
        package: &'a str,
    },
}

type Observer = Arc<dyn Fn(RunEvent<'_>) + Send + Sync>;

/// Runs every affected package's checks and aggregates the results.
///
/// Packages are independent and run on a bounded worker pool; checks within
/// a package run sequentially. The report always lists packages in
/// discovery order, whatever order the workers finish in.
pub struct Orchestrator {
    resolver: Arc<EnvironmentResolver>,
    dispatcher: CheckDispatcher,
    concurrency: usize,
    cancel: CancellationToken,
    observer: Option<Observer>,
}

impl Orchestrator {
    pub fn new(resolver: Arc<EnvironmentResolver>) -> Self {
        Self {
            resolver,
            dispatcher: CheckDispatcher::new(),
            concurrency: rayon::current_num_threads(),
            cancel: CancellationToken::new(),
            observer: None,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: CheckDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Maximum number of packages checked at once. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(RunEvent<'_>) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    fn emit(&self, event: RunEvent<'_>) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }

    pub fn run(&self, mapping: &AffectedMapping) -> RunReport {
        let affected = &mapping.affected;
        let workers = self.concurrency.min(affected.len()).max(1);
        info!(packages = affected.len(), workers, "running checks");

        let outcomes = if workers == 1 {
            affected
                .iter()
                .enumerate()
                .map(|(index, entry)| self.run_package(index, entry))
                .collect()
        } else {
            self.run_parallel(affected, workers)
        };

        aggregate(affected, outcomes, mapping.ignored.clone())
    }

    fn run_parallel(&self, affected: &[AffectedPackage], workers: usize) -> Vec<PackageOutcome> {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("precheck-worker-{}", i))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                warn!(error = %e, "failed to build worker pool, running sequentially");
                return affected
                    .iter()
                    .enumerate()
                    .map(|(index, entry)| self.run_package(index, entry))
                    .collect();
            }
        };

        let (tx, rx) = channel::unbounded();
        pool.install(|| {
            affected.par_iter().enumerate().for_each(|(index, entry)| {
                let _ = tx.send(self.run_package(index, entry));
            });
        });
        drop(tx);

        rx.iter().collect()
    }

    fn run_package(&self, index: usize, entry: &AffectedPackage) -> PackageOutcome {
        let package = &entry.package;

        if self.cancel.is_cancelled() {
            return PackageOutcome {
                index,
                environment: None,
                results: package
                    .checks
                    .iter()
                    .map(|c| CheckResult::not_run(&package.name, &c.name))
                    .collect(),
                cancelled: true,
            };
        }

        self.emit(RunEvent::PackageStarted {
            index,
            package: &package.name,
        });

        let (environment, results) = match self.resolver.resolve(package) {
            Ok(handle) => {
                let results = self.dispatcher.dispatch_with(
                    entry,
                    &handle,
                    &self.cancel,
                    &mut |result| self.emit(RunEvent::CheckFinished { index, result }),
                );
                (Some(handle.id.clone()), results)
            }
            Err(e) => {
                warn!(package = %package.name, error = %e, "environment unavailable");
                let results = CheckDispatcher::error_results(entry, &e.to_string());
                for result in &results {
                    self.emit(RunEvent::CheckFinished { index, result });
                }
                (None, results)
            }
        };

        self.emit(RunEvent::PackageFinished {
            index,
            package: &package.name,
        });

        let cancelled = results.iter().any(|r| r.status == CheckStatus::Cancelled);
        PackageOutcome {
            index,
            environment,
            results,
            cancelled,
        }
    }
}
