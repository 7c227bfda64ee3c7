//! robots.txt generation.

use std::fs;

use anyhow::{Context, Result};

use crate::config::BreezeConfig;
use crate::log;

/// Write a permissive robots.txt pointing crawlers at the sitemap.
pub fn build_robots(config: &BreezeConfig) -> Result<()> {
    let path = config.build.output.join("robots.txt");
    let base_url = config.site.base_url.trim_end_matches('/');

    let content = format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}/sitemap.xml\n",
        base_url
    );

    fs::write(&path, content)
        .with_context(|| format!("Failed to write robots.txt to {}", path.display()))?;

    log!("robots"; "robots.txt");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robots_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = BreezeConfig::default();
        config.build.output = dir.path().to_path_buf();
        config.site.base_url = "https://example.com".to_string();

        build_robots(&config).unwrap();
        let content = fs::read_to_string(dir.path().join("robots.txt")).unwrap();
        assert!(content.contains("User-agent: *"));
        assert!(content.contains("Sitemap: https://example.com/sitemap.xml"));
    }
}
