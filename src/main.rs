//! Breeze - a Markdown static site generator with a live-reload dev server.

#![allow(dead_code)]

mod cache;
mod cli;
mod config;
mod content;
mod core;
mod embed;
mod error;
mod generator;
mod hmr;
mod logger;
mod plugin;
mod routes;
mod serve;
mod utils;
mod watch;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::BreezeConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    logger::set_verbose(cli.build_args().verbose);

    let config = Arc::new(BreezeConfig::load(&cli)?);

    match &cli.command {
        Commands::Build { .. } => cli::build::build_site(&config),
        Commands::Serve { .. } => cli::serve::serve_site(&config),
    }
}
