//! Processed content model and the processing pipeline.
//!
//! A content file moves through: read → frontmatter split → markdown
//! conversion → plugin `transform` chain → TOC extraction → route
//! derivation, with [`processor::ContentProcessor`] caching the result.

mod frontmatter;
mod markdown;
mod processor;
mod route;
mod toc;

pub use frontmatter::{FrontmatterError, split_frontmatter};
pub use markdown::{MarkdownOptions, render_markdown};
pub use processor::{ContentProcessor, ProcessorOptions};
pub use route::derive_route;
pub use toc::{TocEntry, extract_toc};

use std::path::PathBuf;

/// Ordered key→value metadata map (insertion order preserved via serde_json's
/// `preserve_order` feature).
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// A processed content file.
///
/// Instances are immutable once cached; the cache hands out clones, so a
/// caller that mutates its copy never corrupts the cached one.
#[derive(Debug, Clone, Default)]
pub struct ContentFile {
    /// Absolute source location (cache identity).
    pub path: PathBuf,
    /// Derived URL route (`/`, `/a/b`; never empty).
    pub route: String,
    /// Body with the frontmatter block stripped.
    pub raw_body: String,
    /// Frontmatter key→value map, coerced values, file order preserved.
    pub metadata: JsonMap,
    /// Final markup after conversion and the plugin transform chain.
    pub rendered_body: String,
    /// Headings extracted from the rendered markup, in document order.
    pub toc: Vec<TocEntry>,
}

impl ContentFile {
    /// Title from metadata, falling back to the route's last segment.
    pub fn title(&self) -> String {
        if let Some(title) = self.metadata.get("title").and_then(|v| v.as_str()) {
            return title.to_string();
        }
        match self.route.rsplit('/').next() {
            Some("") | None => "Home".to_string(),
            Some(seg) => seg.to_string(),
        }
    }
}
