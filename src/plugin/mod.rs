//! Plugin pipeline with named, optional lifecycle hooks.
//!
//! A [`Plugin`] is a capability-tagged record: each hook slot is an
//! `Option`, so "this plugin does not implement that hook" is visible in
//! the type rather than discovered by probing. Hooks run in registration
//! order for every hook kind.
//!
//! Failure semantics: a hook error propagates to the hook's caller wrapped
//! in [`Error::PluginHook`]; the pipeline never swallows errors. Callers
//! decide: per-file processing errors are logged and skipped, while
//! `build_start`/`build_end` errors abort the build.

use anyhow::Result as HookResult;

use crate::content::ContentFile;
use crate::error::{Error, Result};

/// Mutable handle passed to `configure_server` hooks before the dev server
/// starts. Plugins can add extra routes served verbatim.
#[derive(Debug, Default)]
pub struct ServerHandle {
    /// Extra (route, body, content-type) responses registered by plugins.
    pub extra_routes: Vec<(String, String, &'static str)>,
}

impl ServerHandle {
    pub fn add_route(
        &mut self,
        route: impl Into<String>,
        body: impl Into<String>,
        content_type: &'static str,
    ) {
        self.extra_routes.push((route.into(), body.into(), content_type));
    }
}

type BuildHook = Box<dyn Fn() -> HookResult<()> + Send + Sync>;
type TransformHook = Box<dyn Fn(String) -> HookResult<String> + Send + Sync>;
type ContentHook = Box<dyn Fn(&ContentFile) -> HookResult<()> + Send + Sync>;
type ServerHook = Box<dyn Fn(&mut ServerHandle) -> HookResult<()> + Send + Sync>;

/// A named plugin with optional hooks.
pub struct Plugin {
    pub name: String,
    build_start: Option<BuildHook>,
    build_end: Option<BuildHook>,
    transform: Option<TransformHook>,
    process_content_file: Option<ContentHook>,
    configure_server: Option<ServerHook>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            build_start: None,
            build_end: None,
            transform: None,
            process_content_file: None,
            configure_server: None,
        }
    }

    pub fn with_build_start(
        mut self,
        hook: impl Fn() -> HookResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.build_start = Some(Box::new(hook));
        self
    }

    pub fn with_build_end(
        mut self,
        hook: impl Fn() -> HookResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.build_end = Some(Box::new(hook));
        self
    }

    pub fn with_transform(
        mut self,
        hook: impl Fn(String) -> HookResult<String> + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Box::new(hook));
        self
    }

    pub fn with_process_content_file(
        mut self,
        hook: impl Fn(&ContentFile) -> HookResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.process_content_file = Some(Box::new(hook));
        self
    }

    pub fn with_configure_server(
        mut self,
        hook: impl Fn(&mut ServerHandle) -> HookResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.configure_server = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("build_start", &self.build_start.is_some())
            .field("build_end", &self.build_end.is_some())
            .field("transform", &self.transform.is_some())
            .field("process_content_file", &self.process_content_file.is_some())
            .field("configure_server", &self.configure_server.is_some())
            .finish()
    }
}

/// Ordered plugin collection; registration order is execution order for
/// every hook.
#[derive(Debug, Default)]
pub struct PluginPipeline {
    plugins: Vec<Plugin>,
}

impl PluginPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Plugin) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run every `build_start` hook sequentially, in registration order.
    /// Side effects of earlier plugins are visible to later ones.
    pub fn run_build_start(&self) -> Result<()> {
        for plugin in &self.plugins {
            if let Some(hook) = &plugin.build_start {
                hook().map_err(|e| wrap(&plugin.name, "buildStart", e))?;
            }
        }
        Ok(())
    }

    /// Run every `build_end` hook sequentially, in registration order.
    pub fn run_build_end(&self) -> Result<()> {
        for plugin in &self.plugins {
            if let Some(hook) = &plugin.build_end {
                hook().map_err(|e| wrap(&plugin.name, "buildEnd", e))?;
            }
        }
        Ok(())
    }

    /// Left-fold the markup through every `transform` hook: plugin i's
    /// output is plugin i+1's input. Empty or unchanged output is valid.
    pub fn run_transform(&self, markup: String) -> Result<String> {
        let mut current = markup;
        for plugin in &self.plugins {
            if let Some(hook) = &plugin.transform {
                current = hook(current).map_err(|e| wrap(&plugin.name, "transform", e))?;
            }
        }
        Ok(current)
    }

    /// Fire-and-observe: hand the produced file to every
    /// `process_content_file` hook, in registration order.
    pub fn run_process_content_file(&self, file: &ContentFile) -> Result<()> {
        for plugin in &self.plugins {
            if let Some(hook) = &plugin.process_content_file {
                hook(file).map_err(|e| wrap(&plugin.name, "processContentFile", e))?;
            }
        }
        Ok(())
    }

    /// Give every `configure_server` hook the same mutable server handle.
    pub fn run_configure_server(&self, handle: &mut ServerHandle) -> Result<()> {
        for plugin in &self.plugins {
            if let Some(hook) = &plugin.configure_server {
                hook(handle).map_err(|e| wrap(&plugin.name, "configureServer", e))?;
            }
        }
        Ok(())
    }
}

fn wrap(plugin: &str, hook: &'static str, source: anyhow::Error) -> Error {
    Error::PluginHook {
        plugin: plugin.to_string(),
        hook,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use parking_lot::Mutex;

    fn append_plugin(name: &str, suffix: &'static str) -> Plugin {
        Plugin::new(name).with_transform(move |mut html| {
            html.push_str(suffix);
            Ok(html)
        })
    }

    #[test]
    fn test_transform_is_ordered_left_fold() {
        let mut pipeline = PluginPipeline::new();
        pipeline.register(append_plugin("p1", "1"));
        pipeline.register(append_plugin("p2", "2"));

        assert_eq!(pipeline.run_transform("x".into()).unwrap(), "x12");
    }

    #[test]
    fn test_transform_empty_output_is_valid() {
        let mut pipeline = PluginPipeline::new();
        pipeline.register(Plugin::new("clear").with_transform(|_| Ok(String::new())));
        pipeline.register(append_plugin("after", "z"));

        assert_eq!(pipeline.run_transform("x".into()).unwrap(), "z");
    }

    #[test]
    fn test_hookless_plugin_is_skipped() {
        let mut pipeline = PluginPipeline::new();
        pipeline.register(Plugin::new("observer"));
        pipeline.register(append_plugin("p", "!"));

        assert_eq!(pipeline.run_transform("a".into()).unwrap(), "a!");
        assert!(pipeline.run_build_start().is_ok());
    }

    #[test]
    fn test_hook_error_is_attributed() {
        let mut pipeline = PluginPipeline::new();
        pipeline.register(
            Plugin::new("broken").with_transform(|_| anyhow::bail!("nope")),
        );

        let err = pipeline.run_transform("x".into()).unwrap_err();
        match err {
            Error::PluginHook { plugin, hook, .. } => {
                assert_eq!(plugin, "broken");
                assert_eq!(hook, "transform");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_build_hooks_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = PluginPipeline::new();
        for name in ["a", "b", "c"] {
            let seen = Arc::clone(&order);
            pipeline.register(Plugin::new(name).with_build_start(move || {
                seen.lock().push(name);
                Ok(())
            }));
        }

        pipeline.run_build_start().unwrap();
        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_process_content_file_observes_every_plugin() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut pipeline = PluginPipeline::new();
        for name in ["x", "y"] {
            let seen = Arc::clone(&count);
            pipeline.register(Plugin::new(name).with_process_content_file(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }

        pipeline
            .run_process_content_file(&ContentFile::default())
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_configure_server_shares_one_handle() {
        let mut pipeline = PluginPipeline::new();
        pipeline.register(Plugin::new("a").with_configure_server(|handle| {
            handle.add_route("/a.txt", "A", "text/plain; charset=utf-8");
            Ok(())
        }));
        pipeline.register(Plugin::new("b").with_configure_server(|handle| {
            handle.add_route("/b.txt", "B", "text/plain; charset=utf-8");
            Ok(())
        }));

        let mut handle = ServerHandle::default();
        pipeline.run_configure_server(&mut handle).unwrap();
        assert_eq!(handle.extra_routes.len(), 2);
        assert_eq!(handle.extra_routes[0].0, "/a.txt");
    }
}
