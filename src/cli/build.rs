//! Build command: write the whole site to the output directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::config::BreezeConfig;
use crate::content::{ContentProcessor, ProcessorOptions};
use crate::generator::{build_robots, build_sitemap};
use crate::log;
use crate::plugin::PluginPipeline;
use crate::routes::{RouteTable, RouteTableBuilder};
use crate::serve::render_shell;

/// Build the full site: route table, HTML output, assets, generators.
pub fn build_site(config: &Arc<BreezeConfig>) -> Result<()> {
    let started = Instant::now();

    let processor = ContentProcessor::new(config.build.content.clone(), processor_options(config));
    let pipeline = PluginPipeline::new();

    let builder = RouteTableBuilder::new(&processor, &pipeline);
    let table = builder
        .build_session(&config.build.content)
        .context("site build failed")?;

    fs::create_dir_all(&config.build.output).with_context(|| {
        format!(
            "failed to create output dir {}",
            config.build.output.display()
        )
    })?;

    write_routes(config, &table)?;
    copy_assets(&config.build.assets, &config.build.output)?;
    build_sitemap(config, &table)?;
    build_robots(config)?;

    log!(
        "build";
        "{} routes in {:.2}s",
        table.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Processor options derived from the `[build]` section.
pub fn processor_options(config: &BreezeConfig) -> ProcessorOptions {
    ProcessorOptions {
        cache_enabled: config.build.cache_max_size > 0,
        cache_max_size: config.build.cache_max_size.max(1),
        cache_ttl: config.cache_ttl(),
        toc_levels: config.toc_levels(),
        ..ProcessorOptions::default()
    }
}

/// Write each route as `<route>/index.html` under the output directory.
fn write_routes(config: &BreezeConfig, table: &RouteTable) -> Result<()> {
    for (route, file) in table {
        let rel = route.trim_start_matches('/');
        let dir = if rel.is_empty() {
            config.build.output.clone()
        } else {
            config.build.output.join(rel)
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let target = dir.join("index.html");
        let html = render_shell(file, config);
        fs::write(&target, html)
            .with_context(|| format!("failed to write {}", target.display()))?;
    }
    Ok(())
}

/// Copy the assets directory into the output directory, preserving layout.
fn copy_assets(assets_dir: &Path, output_dir: &Path) -> Result<()> {
    if !assets_dir.is_dir() {
        return Ok(());
    }

    for entry in jwalk::WalkDir::new(assets_dir)
        .skip_hidden(true)
        .sort(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let rel = path
            .strip_prefix(assets_dir)
            .unwrap_or_else(|_| Path::new(""));
        let target = output_dir.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::copy(&path, &target)
            .with_context(|| format!("failed to copy {}", path.display()))?;
    }
    Ok(())
}
