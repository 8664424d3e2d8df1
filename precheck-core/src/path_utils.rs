//! Shared path utilities.

use std::path::{Component, Path, PathBuf};

/// Lexically normalizes a path.
///
/// Drops `.` components and folds `..` into the preceding component without
/// touching the filesystem, so it also works for deleted files. The result
/// is rebuilt component by component and therefore uses the platform's
/// native separator throughout.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Makes `path` absolute against `base` and normalizes it.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Canonicalizes a directory, falling back to lexical normalization when the
/// filesystem cannot resolve it.
pub fn canonical_dir(path: &Path) -> PathBuf {
    canonicalize_clean(path).unwrap_or_else(|| normalize(path))
}

/// Resolves symlinks in the deepest existing ancestor of `path` and
/// re-attaches the remaining components.
///
/// The last component is never resolved, so deleted files and files that are
/// themselves symlinks keep their name.
pub fn canonical_file(path: &Path) -> PathBuf {
    let path = normalize(path);
    for ancestor in path.ancestors().skip(1) {
        if let Some(canonical) = canonicalize_clean(ancestor) {
            return match path.strip_prefix(ancestor) {
                Ok(rest) => canonical.join(rest),
                Err(_) => path,
            };
        }
    }
    path
}

fn canonicalize_clean(path: &Path) -> Option<PathBuf> {
    let canonical = path.canonicalize().ok()?;
    // Strip the verbatim prefix Windows adds so prefixes compare cleanly.
    #[cfg(windows)]
    {
        let s = canonical.to_string_lossy();
        if let Some(stripped) = s.strip_prefix(r"\\?\") {
            return Some(PathBuf::from(stripped));
        }
    }
    Some(canonical)
}

/// Path of `file` relative to `root`, or `file` itself when outside `root`.
pub fn relative_to(file: &Path, root: &Path) -> PathBuf {
    file.strip_prefix(root)
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|_| file.to_path_buf())
}
