//! Serve command: dev server with optional watch mode.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;

use crate::config::BreezeConfig;
use crate::content::ContentProcessor;
use crate::plugin::{PluginPipeline, ServerHandle};
use crate::routes::{RouteStore, RouteTableBuilder};
use crate::serve::{BoundServer, ServeContext, WatchSession, bind_server, spawn_watch_session};
use crate::{core, log};

use super::build::processor_options;

/// Start the development server (blocking until shutdown).
pub fn serve_site(config: &Arc<BreezeConfig>) -> Result<()> {
    // Bind first so early requests get a loading page during the build
    let bound: BoundServer = bind_server(config)?;

    let processor = Arc::new(ContentProcessor::new(
        config.build.content.clone(),
        processor_options(config),
    ));
    let pipeline = Arc::new(PluginPipeline::new());
    let routes = Arc::new(RouteStore::new());

    let mut handle = ServerHandle::default();
    pipeline.run_configure_server(&mut handle)?;

    // Watcher before the initial build: changes made while building buffer
    // instead of being lost
    let watch_handle = if config.serve.watch {
        let session = WatchSession {
            config: Arc::clone(config),
            processor: Arc::clone(&processor),
            pipeline: Arc::clone(&pipeline),
            routes: Arc::clone(&routes),
        };
        Some(spawn_watch_session(session, bound.shutdown_rx())?)
    } else {
        None
    };

    spawn_initial_build(config, &processor, &pipeline, &routes);

    let ctx = ServeContext::new(Arc::clone(config), Arc::clone(&routes), handle);
    bound.run(ctx);

    wait_for_shutdown(watch_handle);
    Ok(())
}

/// Build the initial route table in the background, then flip the serving
/// flag.
fn spawn_initial_build(
    config: &Arc<BreezeConfig>,
    processor: &Arc<ContentProcessor>,
    pipeline: &Arc<PluginPipeline>,
    routes: &Arc<RouteStore>,
) {
    let config = Arc::clone(config);
    let processor = Arc::clone(processor);
    let pipeline = Arc::clone(pipeline);
    let routes = Arc::clone(routes);

    thread::spawn(move || {
        let builder = RouteTableBuilder::new(&processor, &pipeline);
        let table = builder.build(&config.build.content);
        log!("build"; "{} routes", table.len());
        routes.swap(table);
        core::set_serving();
    });
}

/// Wait for the watch session to wind down gracefully (max 2 seconds).
fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(std::time::Duration::from_millis(50));
    }
}
