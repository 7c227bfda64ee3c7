//! Error types for the build and serve pipeline.
//!
//! Propagation policy:
//! - Per-file errors during route-table building are logged and the file is
//!   skipped; the build continues.
//! - `build_start`/`build_end` hook errors abort the enclosing build.
//! - Cache-layer I/O errors (mtime lookups) are treated as misses and never
//!   surface to the caller.
//! - Broadcast failures are isolated per client and never fatal.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the content pipeline and dev-server subsystems.
#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read `{path}`")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write `{path}`")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed frontmatter block. Non-fatal: processing degrades to empty
    /// metadata and continues with the body.
    #[error("malformed frontmatter in `{path}`: {reason}")]
    ContentParse { path: PathBuf, reason: String },

    /// A plugin hook failed; tagged with the plugin and hook name so the
    /// diagnostic points at the offender.
    #[error("plugin `{plugin}` failed in `{hook}` hook")]
    PluginHook {
        plugin: String,
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Watch subsystem could not be set up. Fatal to watching only; the
    /// server keeps serving the last good route table.
    #[error("failed to set up file watcher")]
    WatchSetup(#[from] notify::Error),

    #[error("hot-update delivery failed: {0}")]
    ChannelBroadcast(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Wrap an I/O error from reading `path`, mapping NotFound to the
    /// dedicated variant.
    pub fn from_read(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path.to_path_buf())
        } else {
            Self::FileRead {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_from_read() {
        let err = Error::from_read(
            std::path::Path::new("/missing.md"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_plugin_hook_display_names_offender() {
        let err = Error::PluginHook {
            plugin: "seo".into(),
            hook: "transform",
            source: anyhow::anyhow!("boom"),
        };
        let msg = err.to_string();
        assert!(msg.contains("seo"));
        assert!(msg.contains("transform"));
    }
}
