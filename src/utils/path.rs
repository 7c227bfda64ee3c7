//! Path normalization helpers.

use std::path::{Path, PathBuf};

/// Normalize a path to a stable absolute form.
///
/// Canonicalizes when the file exists; otherwise falls back to joining onto
/// the current directory so removed files still key consistently.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Relative path from `root` to `path` as a `/`-separated string.
///
/// Falls back to the file name when `path` is not under `root`.
pub fn relative_str(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    parts.join("/")
}
