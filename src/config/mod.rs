//! Site configuration management for `breeze.toml`.
//!
//! # Sections
//!
//! | Section   | Purpose                                          |
//! |-----------|--------------------------------------------------|
//! | `[site]`  | Site metadata (title, base_url)                  |
//! | `[build]` | Content/output/assets dirs, toc levels, cache    |
//! | `[serve]` | Development server (interface, port, watch)      |
//! | `[watch]` | Watcher ignore patterns, extensions, debounce    |

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, Commands};
use crate::log;
use crate::utils::path::normalize_path;

/// Site metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    /// Site title, used in the HTML shell and generators.
    pub title: String,
    /// Absolute base URL for sitemap entries (e.g. `https://example.com`).
    pub base_url: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: String::new(),
            base_url: "http://localhost".to_string(),
        }
    }
}

/// Build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Content source directory.
    pub content: PathBuf,
    /// Build output directory.
    pub output: PathBuf,
    /// Static assets directory, copied/served as-is.
    pub assets: PathBuf,
    /// Heading levels included in the table of contents.
    pub toc_min_level: u8,
    pub toc_max_level: u8,
    /// Maximum entries in the processed-content cache. 0 disables caching.
    pub cache_max_size: usize,
    /// Cache entry lifetime in seconds. 0 means entries never expire by age.
    pub cache_ttl_secs: u64,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            content: PathBuf::from("content"),
            output: PathBuf::from("dist"),
            assets: PathBuf::from("static"),
            toc_min_level: 2,
            toc_max_level: 4,
            cache_max_size: 256,
            cache_ttl_secs: 0,
        }
    }
}

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeSection {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,
    /// HTTP port number.
    pub port: u16,
    /// Enable file watcher for live reload.
    pub watch: bool,
    /// Cache-Control values keyed by content type; `image/*` wildcards and
    /// the `*` catch-all are supported.
    pub cache_control: Vec<(String, String)>,
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 4000,
            watch: true,
            cache_control: Vec::new(),
        }
    }
}

/// File watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Glob patterns excluded from watching.
    pub ignore: Vec<String>,
    /// Extensions that trigger rebuilds. Empty means all.
    pub extensions: Vec<String>,
    /// Per-path quiet period before a change is reported.
    pub debounce_ms: u64,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            ignore: vec!["**/.git/**".to_string(), "**/node_modules/**".to_string()],
            extensions: vec![
                "md".to_string(),
                "markdown".to_string(),
                "html".to_string(),
                "css".to_string(),
                "js".to_string(),
            ],
            debounce_ms: crate::watch::DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// Root configuration structure representing breeze.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BreezeConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    pub site: SiteSection,
    pub build: BuildSection,
    pub serve: ServeSection,
    pub watch: WatchSection,
}

impl BreezeConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file; a missing file yields
    /// the defaults rooted at cwd. CLI options override config values.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = normalize_path(&path);
                config
            }
            None => Self::default(),
        };

        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
        config.root = normalize_path(&root);

        config.apply_cli(cli);
        config.normalize_paths();
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let (config, _) = Self::parse_with_ignored(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("invalid config in {}", path.display()))?;

        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}:", path.display());
            for field in &ignored {
                log!("warning"; "  - {}", field);
            }
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Apply command-specific CLI overrides.
    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ref content) = cli.content {
            self.build.content = content.clone();
        }
        if let Some(ref output) = cli.output {
            self.build.output = output.clone();
        }

        match &cli.command {
            Commands::Build { build_args } => {
                if let Some(ref url) = build_args.base_url {
                    self.site.base_url = url.clone();
                }
            }
            Commands::Serve {
                build_args,
                interface,
                port,
                watch,
            } => {
                if let Some(ref url) = build_args.base_url {
                    self.site.base_url = url.clone();
                }
                if let Some(interface) = interface {
                    self.serve.interface = *interface;
                }
                if let Some(port) = port {
                    self.serve.port = *port;
                }
                if let Some(watch) = watch {
                    self.serve.watch = *watch;
                }
            }
        }
    }

    /// Normalize all paths relative to the root directory.
    fn normalize_paths(&mut self) {
        let root = self.root.clone();
        self.build.content = normalize_path(&root.join(&self.build.content));
        self.build.output = normalize_path(&root.join(&self.build.output));
        self.build.assets = normalize_path(&root.join(&self.build.assets));
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Heading level range for TOC extraction.
    pub fn toc_levels(&self) -> (u8, u8) {
        (self.build.toc_min_level, self.build.toc_max_level)
    }

    /// Cache TTL as a duration (`ZERO` disables age-based expiry).
    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.build.cache_ttl_secs)
    }
}

/// Search upward from cwd for the config file.
fn find_config_file(name: &Path) -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BreezeConfig::default();
        assert_eq!(config.build.content, PathBuf::from("content"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(config.serve.port, 4000);
        assert!(config.serve.watch);
        assert_eq!(config.watch.debounce_ms, 100);
        assert_eq!(config.toc_levels(), (2, 4));
    }

    #[test]
    fn test_parse_sections() {
        let config = BreezeConfig::from_str(
            "[site]\ntitle = \"My Blog\"\n\n[serve]\nport = 8080\nwatch = false\n\n[build]\ncache_max_size = 32",
        )
        .unwrap();
        assert_eq!(config.site.title, "My Blog");
        assert_eq!(config.serve.port, 8080);
        assert!(!config.serve.watch);
        assert_eq!(config.build.cache_max_size, 32);
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[site]\ntitle = \"Test\"\n[mystery]\nfield = 1";
        let (config, ignored) = BreezeConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.site.title, "Test");
        assert!(ignored.iter().any(|f| f.contains("mystery")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let content = "[watch]\ndebounce_ms = 250\nignore = [\"*.tmp\"]";
        let (config, ignored) = BreezeConfig::parse_with_ignored(content).unwrap();
        assert!(ignored.is_empty());
        assert_eq!(config.watch.debounce_ms, 250);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(BreezeConfig::from_str("[site\ntitle = \"x\"").is_err());
    }

    #[test]
    fn test_cache_control_pairs() {
        let config = BreezeConfig::from_str(
            "[serve]\ncache_control = [[\"image/*\", \"max-age=86400\"], [\"text/html\", \"no-cache\"]]",
        )
        .unwrap();
        assert_eq!(config.serve.cache_control.len(), 2);
        assert_eq!(config.serve.cache_control[0].0, "image/*");
    }
}
