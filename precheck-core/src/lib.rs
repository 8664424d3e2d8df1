//! Core library for change-aware, per-package checks in a monorepo.
//!
//! A run flows through discovery ([`PackageRegistry`]), change resolution
//! ([`ChangeSetResolver`]), mapping ([`affected::partition`]), environment
//! resolution ([`EnvironmentResolver`]), dispatch ([`CheckDispatcher`]) and
//! aggregation ([`report::aggregate`]), driven by the [`Orchestrator`].

pub mod adapter;
pub mod adapter_registry;
pub mod affected;
pub mod cancel;
pub mod change;
pub mod command_validator;
pub mod dispatcher;
pub mod environment;
pub mod error;
pub mod manifest;
pub mod package;
pub mod path_utils;
pub mod registry;
pub mod report;
pub mod runner;

pub use adapter::{EnvironmentAdapter, EnvironmentHandle};
pub use adapter_registry::AdapterRegistry;
pub use affected::{map_affected, partition, AffectedMapping, AffectedPackage};
pub use cancel::CancellationToken;
pub use change::{Baseline, ChangeSet, ChangeSetResolver, GitCli, VersionControl};
pub use dispatcher::{CheckDispatcher, FailurePolicy};
pub use environment::EnvironmentResolver;
pub use error::{Error, Result};
pub use manifest::{Manifest, WorkspaceConfig, MANIFEST_FILE};
pub use package::{CheckSpec, EnvironmentSpec, Package};
pub use registry::{discover, PackageRegistry};
pub use report::{CheckResult, CheckStatus, PackageReport, PackageStatus, RunReport, RunStatus};
pub use runner::{Orchestrator, RunEvent};
