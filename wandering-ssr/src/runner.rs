// Bundle execution

use crate::{Result, SsrError};
use crate::bundle::Bundle;
use crate::context::RenderContext;
use crate::engine::TemplateEngine;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Renders a bundle's entry with a request context.
///
/// The entry and its sibling files are compiled into the engine on the first
/// run; later runs reuse the resolved entry. Bundle files take precedence over
/// `basedir` partials with the same name.
#[derive(Clone)]
pub struct BundleRunner {
    bundle: Arc<Bundle>,
    engine: TemplateEngine,
    runner: Arc<OnceCell<String>>,
}

impl BundleRunner {
    pub fn new(bundle: Bundle, engine: TemplateEngine) -> Self {
        Self {
            bundle: Arc::new(bundle),
            engine,
            runner: Arc::new(OnceCell::new()),
        }
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    /// Whether the entry has been compiled
    pub fn is_compiled(&self) -> bool {
        self.runner.get().is_some()
    }

    fn runner(&self) -> Result<&str> {
        self.runner
            .get_or_try_init(|| self.evaluate())
            .map(String::as_str)
    }

    fn evaluate(&self) -> Result<String> {
        let mut compiled = 0;
        for (name, source) in self.bundle.siblings() {
            self.compile_file(name, source)?;
            compiled += 1;
        }

        let entry = self.bundle.entry.as_str();
        if let Some(source) = self.bundle.entry_source() {
            self.compile_file(entry, source)?;
        }

        debug!(entry, siblings = compiled, "Compiled bundle entry");
        Ok(entry.to_string())
    }

    fn compile_file(&self, name: &str, source: &str) -> Result<()> {
        let replaced = self
            .engine
            .compile_override(name, source)
            .map_err(|e| match e {
                SsrError::Template(message) => SsrError::BundleCompile {
                    file: name.to_string(),
                    message,
                },
                other => other,
            })?;

        if replaced {
            warn!(file = name, "Bundle file replaces the partial of the same name");
        }
        Ok(())
    }

    /// Render the entry on the calling thread
    pub fn run_blocking(&self, data: &Value) -> Result<String> {
        let entry = self.runner()?;
        self.engine.render(entry, data)
    }

    /// Render the entry on the blocking pool
    pub async fn run(&self, context: &RenderContext) -> Result<String> {
        let runner = self.clone();
        let data = context.to_value();
        tokio::task::spawn_blocking(move || runner.run_blocking(&data)).await?
    }
}

impl std::fmt::Debug for BundleRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleRunner")
            .field("entry", &self.bundle.entry)
            .field("files", &self.bundle.files.len())
            .field("compiled", &self.is_compiled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn bundle(files: &[(&str, &str)], entry: &str) -> Bundle {
        Bundle {
            entry: entry.to_string(),
            files: files
                .iter()
                .map(|(name, source)| (name.to_string(), source.to_string()))
                .collect(),
            maps: BTreeMap::new(),
            basedir: None,
        }
    }

    fn engine() -> TemplateEngine {
        TemplateEngine::new(EngineOptions::default()).unwrap()
    }

    #[tokio::test]
    async fn test_runs_entry_with_context() {
        let runner = BundleRunner::new(bundle(&[("main", "<div>{{msg}}</div>")], "main"), engine());
        assert!(!runner.is_compiled());

        let ctx = RenderContext::new().with("msg", "hello");
        assert_eq!(runner.run(&ctx).await.unwrap(), "<div>hello</div>");
        assert!(runner.is_compiled());
    }

    #[tokio::test]
    async fn test_siblings_are_partials() {
        let runner = BundleRunner::new(
            bundle(&[("main", "<main>{{> header}}</main>"), ("header", "<h1>{{title}}</h1>")], "main"),
            engine(),
        );
        let ctx = RenderContext::new().with("title", "Docs");
        assert_eq!(runner.run(&ctx).await.unwrap(), "<main><h1>Docs</h1></main>");
    }

    #[tokio::test]
    async fn test_compiled_once_across_runs() {
        let engine = engine();
        let runner = BundleRunner::new(bundle(&[("main", "{{n}}")], "main"), engine.clone());

        for n in 0..3 {
            let ctx = RenderContext::new().with("n", n);
            assert_eq!(runner.run(&ctx).await.unwrap(), n.to_string());
        }
        assert!(!engine.compile_cached("main", "changed").unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_first_runs() {
        let runner = BundleRunner::new(bundle(&[("main", "<p>{{id}}</p>")], "main"), engine());

        let handles: Vec<_> = (0..8)
            .map(|id| {
                let runner = runner.clone();
                tokio::spawn(async move { runner.run(&RenderContext::new().with("id", id)).await })
            })
            .collect();

        for (id, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap().unwrap(), format!("<p>{}</p>", id));
        }
    }

    #[tokio::test]
    async fn test_compile_error_is_reported_per_run() {
        let runner = BundleRunner::new(bundle(&[("main", "{{#if x}}never closed")], "main"), engine());
        let ctx = RenderContext::new();

        for _ in 0..2 {
            let err = runner.run(&ctx).await.unwrap_err();
            assert!(matches!(&err, SsrError::BundleCompile { file, .. } if file == "main"));
            assert!(!err.is_construction_error());
        }
        assert!(!runner.is_compiled());
    }

    #[tokio::test]
    async fn test_bundle_files_shadow_basedir_partials() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("app.hbs"), "STALE PARTIAL").unwrap();
        fs::write(temp_dir.path().join("nav.hbs"), "STALE NAV").unwrap();
        let engine = TemplateEngine::new(EngineOptions {
            basedir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap();

        let runner = BundleRunner::new(
            bundle(&[("app", "<div>{{msg}}{{> nav}}</div>"), ("nav", "<nav/>")], "app"),
            engine,
        );
        let ctx = RenderContext::new().with("msg", "bundle");
        assert_eq!(runner.run(&ctx).await.unwrap(), "<div>bundle<nav/></div>");
    }
}
