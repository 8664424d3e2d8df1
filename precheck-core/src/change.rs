//! Change set resolution against a version-control baseline.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::path_utils;

/// The reference point changes are measured against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Baseline {
    /// Files staged in the index.
    Staged,
    /// Staged, unstaged and untracked files.
    WorkingTree,
    /// A commit or range understood by the version-control tool.
    Revision(String),
    /// An explicit file list; no version-control query.
    Files(Vec<PathBuf>),
}

impl fmt::Display for Baseline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Baseline::Staged => write!(f, "staged changes"),
            Baseline::WorkingTree => write!(f, "working tree"),
            Baseline::Revision(rev) => write!(f, "revision '{}'", rev),
            Baseline::Files(files) => write!(f, "{} explicit files", files.len()),
        }
    }
}

/// Version-control collaborator: lists changed paths for a baseline.
pub trait VersionControl: Send + Sync {
    /// Directory that returned relative paths are anchored at.
    fn repository_root(&self) -> Result<PathBuf>;

    /// Paths changed for `baseline`, absolute or relative to the repository root.
    fn changed_paths(&self, baseline: &Baseline) -> Result<Vec<PathBuf>>;
}

/// Immutable set of absolute, normalized changed file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    files: BTreeSet<PathBuf>,
}

impl ChangeSet {
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            files: files
                .into_iter()
                .map(|p| path_utils::normalize(p.as_ref()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }
}

/// Turns a baseline into a [`ChangeSet`].
pub struct ChangeSetResolver<V> {
    vcs: V,
    working_dir: PathBuf,
}

impl<V: VersionControl> ChangeSetResolver<V> {
    /// `working_dir` anchors relative paths of [`Baseline::Files`].
    pub fn new(vcs: V, working_dir: impl AsRef<Path>) -> Self {
        Self {
            vcs,
            working_dir: path_utils::canonical_dir(working_dir.as_ref()),
        }
    }

    pub fn resolve(&self, baseline: &Baseline) -> Result<ChangeSet> {
        let files: Vec<PathBuf> = match baseline {
            Baseline::Files(files) => files
                .iter()
                .map(|f| anchor(&self.working_dir, f))
                .collect(),
            _ => {
                let root = path_utils::canonical_dir(&self.vcs.repository_root()?);
                self.vcs
                    .changed_paths(baseline)?
                    .iter()
                    .map(|f| anchor(&root, f))
                    .collect()
            }
        };
        let changes = ChangeSet::new(files);
        debug!(baseline = %baseline, count = changes.len(), "resolved change set");
        Ok(changes)
    }
}

/// Absolute path of `file` with symlinked directories resolved, so it compares
/// against canonical package roots.
fn anchor(base: &Path, file: &Path) -> PathBuf {
    path_utils::canonical_file(&path_utils::absolutize(base, file))
}

/// [`VersionControl`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    working_dir: PathBuf,
}

impl GitCli {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    fn git(&self, dir: &Path, args: &[&str], baseline: &str) -> Result<Vec<u8>> {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| Error::ChangeResolution {
                baseline: baseline.to_string(),
                message: format!("failed to run git: {}", e),
            })?;

        if !output.status.success() {
            return Err(Error::ChangeResolution {
                baseline: baseline.to_string(),
                message: format!(
                    "git {} failed: {}",
                    args.first().copied().unwrap_or_default(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(output.stdout)
    }

    fn name_list(&self, root: &Path, args: &[&str], baseline: &Baseline) -> Result<Vec<PathBuf>> {
        let stdout = self.git(root, args, &baseline.to_string())?;
        Ok(split_nul(&stdout))
    }
}

/// Splits `-z` output into paths, keeping every byte of each name.
fn split_nul(output: &[u8]) -> Vec<PathBuf> {
    output
        .split(|b| *b == 0)
        .filter(|name| !name.is_empty())
        .map(path_from_bytes)
        .collect()
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

impl VersionControl for GitCli {
    fn repository_root(&self) -> Result<PathBuf> {
        let stdout = self.git(
            &self.working_dir,
            &["rev-parse", "--show-toplevel"],
            "repository root",
        )?;
        Ok(PathBuf::from(String::from_utf8_lossy(&stdout).trim()))
    }

    fn changed_paths(&self, baseline: &Baseline) -> Result<Vec<PathBuf>> {
        let root = self.repository_root()?;
        const DIFF: &[&str] = &["diff", "--name-only", "-z", "--diff-filter=d"];

        match baseline {
            Baseline::Staged => {
                let mut args = DIFF.to_vec();
                args.push("--cached");
                self.name_list(&root, &args, baseline)
            }
            Baseline::WorkingTree => {
                let mut staged = DIFF.to_vec();
                staged.push("--cached");
                let mut files = self.name_list(&root, &staged, baseline)?;
                files.extend(self.name_list(&root, DIFF, baseline)?);
                files.extend(self.name_list(
                    &root,
                    &["ls-files", "--others", "--exclude-standard", "-z"],
                    baseline,
                )?);
                Ok(files)
            }
            Baseline::Revision(rev) => {
                if rev.trim().is_empty() || rev.starts_with('-') {
                    return Err(Error::ChangeResolution {
                        baseline: baseline.to_string(),
                        message: "revision must be a commit or range, not an option".to_string(),
                    });
                }
                let mut args = DIFF.to_vec();
                args.push(rev.as_str());
                self.name_list(&root, &args, baseline)
            }
            Baseline::Files(files) => Ok(files.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_nul_keeps_whitespace_in_names() {
        assert_eq!(
            split_nul(b"notes \0dir/a b.py\0\0"),
            vec![PathBuf::from("notes "), PathBuf::from("dir/a b.py")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn split_nul_keeps_non_utf8_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let paths = split_nul(b"caf\xe9.py\0");
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].as_os_str().as_bytes(), b"caf\xe9.py");
    }
}
