//! Watch-mode session: file changes drive route-table rebuilds and hot
//! update broadcasts.
//!
//! Every settled change triggers a full table rebuild followed by one swap.
//! Rebuilds are cheap because unchanged files come out of the content cache;
//! per-route incremental diffing is deliberately not attempted.

use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::config::BreezeConfig;
use crate::content::ContentProcessor;
use crate::hmr::{HmrChannel, UpdateKind, start_hmr_server};
use crate::plugin::PluginPipeline;
use crate::routes::{CONTENT_EXTENSIONS, RouteStore, RouteTableBuilder};
use crate::watch::{ChangeKind, EventFilter, FileChange, FileWatcher, KnownPaths};
use crate::{debug, log, logger};

/// Everything the watch loop needs to rebuild and notify.
pub struct WatchSession {
    pub config: Arc<BreezeConfig>,
    pub processor: Arc<ContentProcessor>,
    pub pipeline: Arc<PluginPipeline>,
    pub routes: Arc<RouteStore>,
}

/// Spawn the watch session on a background thread with its own tokio
/// runtime. Binds the hot update channel and records the bound port.
pub fn spawn_watch_session(
    session: WatchSession,
    shutdown_rx: Receiver<()>,
) -> anyhow::Result<JoinHandle<()>> {
    let channel = HmrChannel::new();
    let ws_port = start_hmr_server(super::DEFAULT_WS_PORT, channel.clone())?;
    super::set_actual_ws_port(ws_port);
    debug!("hmr"; "ws://localhost:{}", ws_port);

    let handle = thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                log!("watch"; "failed to create runtime: {}", e);
                return;
            }
        };

        rt.block_on(async {
            if let Err(e) = run_watch_loop(session, channel.clone(), shutdown_rx).await {
                log!("watch"; "error: {}", e);
            }
        });
        channel.close_all();
    });

    Ok(handle)
}

async fn run_watch_loop(
    session: WatchSession,
    channel: HmrChannel,
    shutdown_rx: Receiver<()>,
) -> crate::error::Result<()> {
    let config = &session.config;

    let filter = EventFilter::new(&config.watch.ignore, &config.watch.extensions);
    let known: KnownPaths = {
        let routes = Arc::clone(&session.routes);
        Arc::new(move |path: &Path| routes.load().values().any(|f| f.path == path))
    };
    let roots = vec![config.build.content.clone(), config.build.assets.clone()];

    let watcher = FileWatcher::new(
        &roots,
        filter,
        Duration::from_millis(config.watch.debounce_ms),
        known,
    )?;
    let watcher_handle = watcher.handle();

    let (changes_tx, mut changes_rx) = mpsc::channel::<Vec<FileChange>>(16);
    let watch_task = tokio::spawn(watcher.run(changes_tx));

    log!("watch"; "watching for changes...");

    loop {
        tokio::select! {
            biased;
            // Shutdown channel is sync (crossbeam), so poll it
            _ = tokio::time::sleep(Duration::from_millis(100)) => {
                if shutdown_rx.try_recv().is_ok() || crate::core::is_shutdown() {
                    break;
                }
            }
            Some(changes) = changes_rx.recv() => {
                handle_changes(&session, &channel, changes);
            }
        }
    }

    watcher_handle.close();
    let _ = watch_task.await;
    Ok(())
}

/// Rebuild the route table for a settled change batch, then broadcast the
/// narrowest update type the batch allows.
fn handle_changes(session: &WatchSession, channel: &HmrChannel, changes: Vec<FileChange>) {
    if changes.is_empty() || !crate::core::is_serving() {
        return;
    }

    for change in &changes {
        debug!("watch"; "{}: {}", change.kind.label(), change.path.display());
        session.processor.evict(&change.path);
    }

    // Surface per-file errors as overlays before the lenient rebuild skips them
    let mut broken = false;
    for change in &changes {
        if change.kind == ChangeKind::Removed || !is_content_file(&change.path) {
            continue;
        }
        if let Err(e) = session.processor.process(&change.path, &session.pipeline) {
            logger::status_error("build failed", &e.to_string());
            channel.push_error(e.to_string(), Some(change.path.display().to_string()));
            broken = true;
        }
    }

    let builder = RouteTableBuilder::new(&session.processor, &session.pipeline);
    let table = builder.build(&session.config.build.content);
    let route_count = table.len();
    session.routes.swap(table);

    if broken {
        // Error overlay is already up; skip the reload so it stays visible
        return;
    }

    broadcast_changes(channel, &changes);
    logger::status_success(&format!(
        "rebuilt {} routes ({} changed)",
        route_count,
        changes.len()
    ));
}

/// One broadcast decision for a change batch.
#[derive(Debug, PartialEq)]
enum UpdateSelection {
    Reload(String),
    Scripts(Vec<String>),
    Styles(Vec<String>),
}

/// Pick one update per batch: any content/markup change forces a reload,
/// otherwise scripts beat stylesheets.
fn select_update(changes: &[FileChange]) -> Option<UpdateSelection> {
    let mut css_paths = Vec::new();
    let mut js_paths = Vec::new();
    let mut other = None;

    for change in changes {
        let display = change.path.display().to_string();
        match UpdateKind::for_path(&change.path) {
            UpdateKind::Style => css_paths.push(display),
            UpdateKind::Script => js_paths.push(display),
            UpdateKind::Reload => other = Some(display),
        }
    }

    if let Some(path) = other {
        Some(UpdateSelection::Reload(path))
    } else if !js_paths.is_empty() {
        Some(UpdateSelection::Scripts(js_paths))
    } else if !css_paths.is_empty() {
        Some(UpdateSelection::Styles(css_paths))
    } else {
        None
    }
}

fn broadcast_changes(channel: &HmrChannel, changes: &[FileChange]) {
    match select_update(changes) {
        Some(UpdateSelection::Reload(path)) => {
            channel.request_reload(Some(path));
        }
        Some(UpdateSelection::Scripts(paths)) => {
            channel.push_script_update(paths);
        }
        Some(UpdateSelection::Styles(paths)) => {
            channel.push_style_update(paths);
        }
        None => {}
    }
}

fn is_content_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| CONTENT_EXTENSIONS.contains(&ext))
}
