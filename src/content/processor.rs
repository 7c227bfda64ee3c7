//! The content processor: read, split, convert, transform, cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::cache::SourceCache;
use crate::error::{Error, Result};
use crate::plugin::PluginPipeline;
use crate::utils::path::normalize_path;

use super::{
    ContentFile, MarkdownOptions, derive_route, extract_toc, render_markdown, split_frontmatter,
};

/// Processor tuning knobs.
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    /// Disable to force re-processing on every call (previews, tests).
    pub cache_enabled: bool,
    pub cache_max_size: usize,
    /// Zero disables time-based expiry.
    pub cache_ttl: Duration,
    /// Inclusive heading level range for the TOC.
    pub toc_levels: (u8, u8),
    pub markdown: MarkdownOptions,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_max_size: 256,
            cache_ttl: Duration::ZERO,
            toc_levels: (2, 4),
            markdown: MarkdownOptions::all(),
        }
    }
}

/// Turns content files into [`ContentFile`]s, caching results by source path.
///
/// Thread-safe: the cache sits behind a mutex, and a per-path in-flight
/// guard makes concurrent misses on the same path compute once; the second
/// caller waits and re-checks the cache.
pub struct ContentProcessor {
    root: PathBuf,
    options: ProcessorOptions,
    cache: Mutex<SourceCache<ContentFile>>,
    inflight: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl ContentProcessor {
    /// Create a processor for content under `root`.
    pub fn new(root: impl Into<PathBuf>, options: ProcessorOptions) -> Self {
        let cache = SourceCache::new(options.cache_max_size, options.cache_ttl);
        Self {
            root: normalize_path(&root.into()),
            options,
            cache: Mutex::new(cache),
            inflight: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Process a file-backed source, serving from cache when fresh.
    ///
    /// A cache hit returns the cached [`ContentFile`] unchanged: no
    /// re-conversion, no plugin invocation.
    pub fn process(&self, path: &Path, pipeline: &PluginPipeline) -> Result<ContentFile> {
        let path = normalize_path(path);

        if self.options.cache_enabled {
            let mut cache = self.cache.lock();
            if cache.is_fresh(&path)
                && let Some(cached) = cache.get(&path)
            {
                return Ok(cached);
            }
        }

        // Per-path single flight: one computation per concurrent miss group
        let gate = self
            .inflight
            .entry(path.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = gate.lock();

        // Re-check: a concurrent caller may have filled the cache while we
        // waited on the gate
        if self.options.cache_enabled {
            let mut cache = self.cache.lock();
            if cache.is_fresh(&path)
                && let Some(cached) = cache.get(&path)
            {
                drop(_guard);
                self.inflight.remove(&path);
                return Ok(cached);
            }
        }

        let result = self.process_uncached(&path, pipeline);

        if self.options.cache_enabled
            && let Ok(ref file) = result
        {
            // Stamped with now (not the file's own mtime): any later on-disk
            // edit has a strictly newer mtime and fails the freshness check
            self.cache.lock().set(&path, file.clone(), None);
        }

        drop(_guard);
        self.inflight.remove(&path);
        result
    }

    /// Process an in-memory string (preview mode). Never cached; the
    /// resulting route is `/` and the path is empty.
    pub fn process_str(&self, source: &str, pipeline: &PluginPipeline) -> Result<ContentFile> {
        self.build_content_file(PathBuf::new(), "/".to_string(), source, pipeline)
    }

    /// Drop every cached entry.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    /// Evict a single path (used when the watcher reports a removal).
    pub fn evict(&self, path: &Path) {
        self.cache.lock().remove(&normalize_path(path));
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    fn process_uncached(&self, path: &Path, pipeline: &PluginPipeline) -> Result<ContentFile> {
        let source =
            std::fs::read_to_string(path).map_err(|e| Error::from_read(path, e))?;
        let route = derive_route(path, &self.root);
        self.build_content_file(path.to_path_buf(), route, &source, pipeline)
    }

    fn build_content_file(
        &self,
        path: PathBuf,
        route: String,
        source: &str,
        pipeline: &PluginPipeline,
    ) -> Result<ContentFile> {
        let (metadata, raw_body) = match split_frontmatter(source) {
            Ok(pair) => pair,
            Err(parse) => {
                let err = Error::ContentParse {
                    path: path.clone(),
                    reason: parse.reason,
                };
                crate::debug!("content"; "{}", err);
                (super::JsonMap::new(), parse.body)
            }
        };

        let html = render_markdown(&raw_body, &self.options.markdown);
        let rendered_body = pipeline.run_transform(html)?;
        let toc = extract_toc(&rendered_body, self.options.toc_levels);

        Ok(ContentFile {
            path,
            route,
            raw_body,
            metadata,
            rendered_body,
            toc,
        })
    }
}
