//! Unix-style path helpers.
//!
//! Module URLs, manifest lines and ledger keys are all built from
//! forward-slash paths regardless of host platform. These helpers do the
//! string-level work once so every stage agrees on the same spelling.

use std::path::Path;

/// Converts a path to a string with `/` separators.
pub fn to_unix_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Strips the final extension from a unix path string.
///
/// Only the last path segment is considered, so `a.b/c` is returned
/// unchanged. Leading dots (hidden files) are not treated as extensions.
pub fn strip_extension(path: &str) -> &str {
    let seg_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[seg_start..].rfind('.') {
        Some(0) | None => path,
        Some(dot) => &path[..seg_start + dot],
    }
}

/// Replaces the final extension of a unix path string.
///
/// `ext` includes its leading dot. A path without an extension gets `ext`
/// appended.
pub fn replace_extension(path: &str, ext: &str) -> String {
    format!("{}{ext}", strip_extension(path))
}

/// Returns `path` relative to `root` as a unix string, if `root` is a
/// segment-aligned prefix of `path`.
pub fn relative_unix(path: &str, root: &str) -> Option<String> {
    let root = root.trim_end_matches('/');
    let rest = path.strip_prefix(root)?;
    if root.is_empty() {
        return Some(rest.trim_start_matches('/').to_string());
    }
    rest.strip_prefix('/').map(str::to_string)
}
