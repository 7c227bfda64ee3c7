//! Sitemap generation.
//!
//! Generates a sitemap.xml file listing all routes for search engine
//! indexing.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!   </url>
//! </urlset>
//! ```

use std::borrow::Cow;
use std::fs;

use anyhow::{Context, Result};

use crate::config::BreezeConfig;
use crate::log;
use crate::routes::RouteTable;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Build and write sitemap.xml from the route table.
pub fn build_sitemap(config: &BreezeConfig, table: &RouteTable) -> Result<()> {
    let sitemap = Sitemap::build(config, table);
    sitemap.write(config)
}

struct Sitemap {
    urls: Vec<String>,
}

impl Sitemap {
    fn build(config: &BreezeConfig, table: &RouteTable) -> Self {
        let base_url = config.site.base_url.trim_end_matches('/');

        let mut urls: Vec<String> = table
            .keys()
            .map(|route| {
                if route == "/" {
                    format!("{}/", base_url)
                } else {
                    format!("{}{}", base_url, route)
                }
            })
            .collect();
        // Deterministic output regardless of table iteration order
        urls.sort();

        Self { urls }
    }

    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(4096);

        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<urlset xmlns=\"");
        xml.push_str(SITEMAP_NS);
        xml.push_str("\">\n");

        for loc in self.urls {
            xml.push_str("  <url>\n    <loc>");
            xml.push_str(&escape_xml(&loc));
            xml.push_str("</loc>\n  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    fn write(self, config: &BreezeConfig) -> Result<()> {
        let sitemap_path = config.build.output.join("sitemap.xml");
        let xml = self.into_xml();

        fs::write(&sitemap_path, xml)
            .with_context(|| format!("Failed to write sitemap to {}", sitemap_path.display()))?;

        log!("sitemap"; "sitemap.xml");
        Ok(())
    }
}

/// Escape special XML characters.
pub(super) fn escape_xml(s: &str) -> Cow<'_, str> {
    // Fast path: check if escaping is needed
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}
