//! Route derivation - source path to URL route mapping.

use std::path::Path;

use crate::utils::path::relative_str;

/// Derive the URL route for a content file under `root`.
///
/// Rules:
/// - extension stripped
/// - trailing `index` segments collapse into the parent
/// - always a single leading slash, never a trailing one (except `/`)
/// - the bare root index maps to `/`
///
/// Pure function of `path` and `root`; deriving twice yields the same route.
///
/// ```text
/// content/index.md        -> /
/// content/about.md        -> /about
/// content/blog/post.md    -> /blog/post
/// content/blog/index.md   -> /blog
/// ```
pub fn derive_route(path: &Path, root: &Path) -> String {
    let rel = relative_str(path, root);

    // Strip the extension from the last segment
    let without_ext = match rel.rfind('.') {
        Some(dot) if !rel[dot + 1..].contains('/') => &rel[..dot],
        _ => rel.as_str(),
    };

    let mut segments: Vec<&str> = without_ext
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    // Collapse trailing index segments into the parent
    while segments.last() == Some(&"index") {
        segments.pop();
    }

    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segments.join("/"))
}
