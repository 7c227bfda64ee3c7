//! Route table construction and the swappable route store.
//!
//! The table is rebuilt wholesale on every regeneration pass: the cache in
//! the processor absorbs most of the cost, and whole-table replacement keeps
//! readers race-free (they see the old table or the new one, never a partial
//! build). True incremental single-file updates would change observable
//! rebuild timing; the full walk is the documented tradeoff.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;

use crate::content::{ContentFile, ContentProcessor};
use crate::error::Result;
use crate::plugin::PluginPipeline;

/// Route string → processed content.
pub type RouteTable = FxHashMap<String, ContentFile>;

/// Content file extensions that become routes.
pub const CONTENT_EXTENSIONS: &[&str] = &["md", "markdown"];

fn is_content_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| CONTENT_EXTENSIONS.contains(&ext))
}

/// Builds route tables by walking a content directory.
pub struct RouteTableBuilder<'a> {
    processor: &'a ContentProcessor,
    pipeline: &'a PluginPipeline,
}

impl<'a> RouteTableBuilder<'a> {
    pub fn new(processor: &'a ContentProcessor, pipeline: &'a PluginPipeline) -> Self {
        Self {
            processor,
            pipeline,
        }
    }

    /// Walk `pages_dir` recursively and process every content file.
    ///
    /// Per-file errors are logged with the offending path and the file is
    /// skipped; one broken file never blocks the rest of the site.
    pub fn build(&self, pages_dir: &Path) -> RouteTable {
        let mut table = RouteTable::default();

        for path in collect_content_files(pages_dir) {
            match self.processor.process(&path, self.pipeline) {
                Ok(file) => {
                    table.insert(file.route.clone(), file);
                }
                Err(e) => {
                    crate::log!("error"; "skipping {}: {e:#}", path.display());
                }
            }
        }

        table
    }

    /// Like [`build`](Self::build), bracketed by `build_start`/`build_end`
    /// and feeding every produced file to `process_content_file` hooks.
    ///
    /// Lifecycle hook errors abort the pass; per-file errors (processing or
    /// `process_content_file`) only skip that file. Produces the identical
    /// route set as `build` for the same unchanged input tree.
    pub fn build_session(&self, pages_dir: &Path) -> Result<RouteTable> {
        self.pipeline.run_build_start()?;

        let mut table = RouteTable::default();
        for path in collect_content_files(pages_dir) {
            match self.processor.process(&path, self.pipeline) {
                Ok(file) => {
                    if let Err(e) = self.pipeline.run_process_content_file(&file) {
                        crate::log!("error"; "skipping {}: {e:#}", path.display());
                        continue;
                    }
                    table.insert(file.route.clone(), file);
                }
                Err(e) => {
                    crate::log!("error"; "skipping {}: {e:#}", path.display());
                }
            }
        }

        self.pipeline.run_build_end()?;
        Ok(table)
    }
}

/// All content files under `dir`, sorted for deterministic processing order.
fn collect_content_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = jwalk::WalkDir::new(dir)
        .skip_hidden(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_content_file(path))
        .collect();
    files.sort();
    files
}

/// Owned, swappable reference to the current route table.
///
/// Rebuilds produce a fresh table that is swapped in atomically; readers
/// load a snapshot and never observe in-place mutation.
pub struct RouteStore {
    current: ArcSwap<RouteTable>,
}

impl RouteStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(RouteTable::default()),
        }
    }

    /// Snapshot of the current table.
    pub fn load(&self) -> Arc<RouteTable> {
        self.current.load_full()
    }

    /// Replace the table wholesale.
    pub fn swap(&self, table: RouteTable) {
        self.current.store(Arc::new(table));
    }

    /// Look up a route in the current snapshot.
    pub fn resolve(&self, route: &str) -> Option<ContentFile> {
        self.current.load().get(route).cloned()
    }
}

impl Default for RouteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ProcessorOptions;
    use crate::plugin::Plugin;
    use std::fs;
    use tempfile::TempDir;

    fn site(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_build_maps_routes() {
        let dir = site(&[
            ("index.md", "# Home"),
            ("about.md", "# About"),
            ("blog/post.md", "# Post"),
            ("blog/index.md", "# Blog"),
            ("notes.txt", "not content"),
        ]);
        let processor = ContentProcessor::new(dir.path(), ProcessorOptions::default());
        let pipeline = PluginPipeline::new();
        let table = RouteTableBuilder::new(&processor, &pipeline).build(dir.path());

        let mut routes: Vec<_> = table.keys().cloned().collect();
        routes.sort();
        assert_eq!(routes, vec!["/", "/about", "/blog", "/blog/post"]);
    }

    #[test]
    fn test_determinism_across_builds() {
        let dir = site(&[("a.md", "# A"), ("b/c.md", "# C"), ("index.md", "# I")]);
        let processor = ContentProcessor::new(dir.path(), ProcessorOptions::default());
        let pipeline = PluginPipeline::new();
        let builder = RouteTableBuilder::new(&processor, &pipeline);

        let first = builder.build(dir.path());
        let second = builder.build(dir.path());

        let mut a: Vec<_> = first.keys().cloned().collect();
        let mut b: Vec<_> = second.keys().cloned().collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
        for (route, file) in &first {
            assert_eq!(second[route].route, file.route);
        }
    }

    #[test]
    fn test_partial_failure_tolerance() {
        let dir = site(&[("good.md", "# Good"), ("also-good.md", "# Also")]);
        // Invalid UTF-8 makes the read fail for this one file
        fs::write(dir.path().join("broken.md"), [0xff, 0xfe, 0x00]).unwrap();

        let processor = ContentProcessor::new(dir.path(), ProcessorOptions::default());
        let pipeline = PluginPipeline::new();
        let table = RouteTableBuilder::new(&processor, &pipeline).build(dir.path());

        assert!(table.contains_key("/good"));
        assert!(table.contains_key("/also-good"));
        assert!(!table.contains_key("/broken"));
    }

    #[test]
    fn test_session_runs_lifecycle_and_observers() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let dir = site(&[("one.md", "# One"), ("two.md", "# Two")]);
        let observed = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(AtomicUsize::new(0));

        let mut pipeline = PluginPipeline::new();
        let seen = Arc::clone(&observed);
        let starts = Arc::clone(&started);
        pipeline.register(
            Plugin::new("collector")
                .with_build_start(move || {
                    starts.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .with_process_content_file(move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
        );

        let processor = ContentProcessor::new(dir.path(), ProcessorOptions::default());
        let table = RouteTableBuilder::new(&processor, &pipeline)
            .build_session(dir.path())
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(observed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_build_start_error_aborts() {
        let dir = site(&[("one.md", "# One")]);
        let mut pipeline = PluginPipeline::new();
        pipeline.register(Plugin::new("bad").with_build_start(|| anyhow::bail!("no dir")));

        let processor = ContentProcessor::new(dir.path(), ProcessorOptions::default());
        let result = RouteTableBuilder::new(&processor, &pipeline).build_session(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_store_swaps_snapshots() {
        let store = RouteStore::new();
        assert!(store.resolve("/a").is_none());

        let mut table = RouteTable::default();
        table.insert(
            "/a".into(),
            ContentFile {
                route: "/a".into(),
                ..Default::default()
            },
        );
        let old = store.load();
        store.swap(table);

        assert!(old.is_empty());
        assert_eq!(store.resolve("/a").unwrap().route, "/a");
    }
}
