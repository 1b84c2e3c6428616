// Renderer facade

use crate::bundle::{Bundle, BundleSource};
use crate::config::RendererOptions;
use crate::context::RenderContext;
use crate::engine::TemplateEngine;
use crate::renderer::TemplateRenderer;
use crate::runner::BundleRunner;
use crate::{Result, SsrError};
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Progress of a single render call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Pending,
    RenderingBody,
    ComposingTemplate,
    Done,
    Failed,
}

impl RenderPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderPhase::Pending => "pending",
            RenderPhase::RenderingBody => "rendering_body",
            RenderPhase::ComposingTemplate => "composing_template",
            RenderPhase::Done => "done",
            RenderPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for RenderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn enter(phase: RenderPhase) {
    debug!(phase = %phase, "Render phase");
}

fn finish(result: Result<String>) -> Result<String> {
    match &result {
        Ok(html) => debug!(phase = %RenderPhase::Done, bytes = html.len(), "Render phase"),
        Err(e) => debug!(phase = %RenderPhase::Failed, error = %e, "Render phase"),
    }
    result
}

/// Await a render, turning a panic into a render error.
async fn catch_panic(render: impl Future<Output = Result<String>>) -> Result<String> {
    match AssertUnwindSafe(render).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => finish(Err(SsrError::Render(format!(
            "render panicked: {}",
            panic_message(panic.as_ref())
        )))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Renders pre-rendered markup into the document template.
#[derive(Clone, Debug)]
pub struct Renderer {
    template_renderer: Arc<TemplateRenderer>,
}

impl Renderer {
    pub fn new(options: RendererOptions) -> Result<Self> {
        let engine = TemplateEngine::new(options.engine_options(None))?;
        let template_renderer = TemplateRenderer::new(&options, engine)?;

        Ok(Self {
            template_renderer: Arc::new(template_renderer),
        })
    }

    /// Splice `content` into the template; without a template `content` is returned as is.
    pub async fn render_to_string(&self, content: &str, context: &RenderContext) -> Result<String> {
        enter(RenderPhase::Pending);
        enter(RenderPhase::RenderingBody);
        finish(self.compose(content.to_string(), context).await)
    }

    /// Interpolate `view` with the context, then compose the document around it.
    pub async fn render_view(&self, view: &str, context: &RenderContext) -> Result<String> {
        enter(RenderPhase::Pending);
        enter(RenderPhase::RenderingBody);

        let body = match self
            .template_renderer
            .engine()
            .render_template(view, &context.to_value())
        {
            Ok(body) => body,
            Err(e) => return finish(Err(e)),
        };
        finish(self.compose(body, context).await)
    }

    async fn compose(&self, body: String, context: &RenderContext) -> Result<String> {
        if !self.template_renderer.has_template() {
            return Ok(body);
        }
        enter(RenderPhase::ComposingTemplate);
        self.template_renderer.render(&body, context).await
    }

    /// Render on the Tokio runtime and hand the result to `callback` once.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn render_to_string_with_callback<F>(
        &self,
        content: impl Into<String>,
        context: RenderContext,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<String>) + Send + 'static,
    {
        let renderer = self.clone();
        let content = content.into();
        tokio::spawn(async move {
            let result = catch_panic(renderer.render_to_string(&content, &context)).await;
            callback(result);
        })
    }

    pub fn template_renderer(&self) -> &TemplateRenderer {
        &self.template_renderer
    }
}

/// Renders a server bundle per request and composes the document around it.
#[derive(Clone, Debug)]
pub struct BundleRenderer {
    runner: BundleRunner,
    template_renderer: Arc<TemplateRenderer>,
}

impl BundleRenderer {
    /// Load the bundle and build the renderer.
    ///
    /// The template root is taken from the options, then from the bundle.
    pub fn new(source: impl Into<BundleSource>, options: RendererOptions) -> Result<Self> {
        let bundle = source.into().load()?;
        Self::from_bundle(bundle, options)
    }

    pub fn from_bundle(bundle: Bundle, options: RendererOptions) -> Result<Self> {
        let basedir = options
            .basedir
            .clone()
            .or_else(|| bundle.basedir.clone())
            .ok_or(SsrError::MissingBasedir)?;

        let engine = TemplateEngine::new(options.engine_options(Some(basedir)))?;
        let template_renderer = TemplateRenderer::new(&options, engine.clone())?;

        debug!(entry = %bundle.entry, files = bundle.files.len(), "Created bundle renderer");

        Ok(Self {
            runner: BundleRunner::new(bundle, engine),
            template_renderer: Arc::new(template_renderer),
        })
    }

    /// Render the bundle entry, then the template around it.
    pub async fn render_to_string(&self, context: &RenderContext) -> Result<String> {
        enter(RenderPhase::Pending);
        enter(RenderPhase::RenderingBody);

        let body = match self.runner.run(context).await {
            Ok(body) => body,
            Err(e) => return finish(Err(e)),
        };

        if !self.template_renderer.has_template() {
            return finish(Ok(body));
        }
        enter(RenderPhase::ComposingTemplate);
        finish(self.template_renderer.render(&body, context).await)
    }

    /// Render on the Tokio runtime and hand the result to `callback` once.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn render_to_string_with_callback<F>(&self, context: RenderContext, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<String>) + Send + 'static,
    {
        let renderer = self.clone();
        tokio::spawn(async move {
            let result = catch_panic(renderer.render_to_string(&context)).await;
            callback(result);
        })
    }

    pub fn runner(&self) -> &BundleRunner {
        &self.runner
    }

    pub fn template_renderer(&self) -> &TemplateRenderer {
        &self.template_renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ClientManifest;
    use crate::renderer::RenderHelpers;
    use crate::template::{FnTemplate, TemplateSource};
    use serde_json::json;
    use tempfile::TempDir;

    const TEMPLATE: &str = "<html><head></head><body><!--ssr-outlet--></body></html>";

    #[tokio::test]
    async fn test_no_template_returns_content() {
        let renderer = Renderer::new(RendererOptions::new()).unwrap();
        let html = renderer
            .render_to_string("<div>hi</div>", &RenderContext::new())
            .await
            .unwrap();
        assert_eq!(html, "<div>hi</div>");
    }

    #[tokio::test]
    async fn test_render_view() {
        let renderer = Renderer::new(RendererOptions::new().with_template(TEMPLATE)).unwrap();
        let ctx = RenderContext::new().with("name", "xiaows");

        let html = renderer.render_view("<p>{{name}}</p>", &ctx).await.unwrap();
        assert_eq!(html, "<html><head></head><body><p>xiaows</p></body></html>");
    }

    #[tokio::test]
    async fn test_callback_fires_once() {
        let renderer = Renderer::new(RendererOptions::new().with_template(TEMPLATE)).unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        renderer
            .render_to_string_with_callback("<i/>", RenderContext::new(), move |result| {
                tx.send(result).unwrap();
            })
            .await
            .unwrap();

        let html = rx.recv().await.unwrap().unwrap();
        assert!(html.contains("<body><i/></body>"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_callback_receives_panics() {
        let template = FnTemplate(
            |_: &str, _: &RenderContext, _: &RenderHelpers<'_>| -> Result<String> {
                panic!("template exploded")
            },
        );
        let renderer =
            Renderer::new(RendererOptions::new().with_template(TemplateSource::function(template))).unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        renderer
            .render_to_string_with_callback("<i/>", RenderContext::new(), move |result| {
                tx.send(result).unwrap();
            })
            .await
            .unwrap();

        let err = rx.recv().await.unwrap().unwrap_err();
        assert!(matches!(&err, SsrError::Render(msg) if msg.contains("template exploded")));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_bundle_requires_basedir() {
        let err = BundleRenderer::new("<div></div>", RendererOptions::new()).unwrap_err();
        assert!(matches!(err, SsrError::MissingBasedir));
        assert_eq!(err.to_string(), "basedir is undefined");
    }

    #[tokio::test]
    async fn test_bundle_without_template() {
        let temp_dir = TempDir::new().unwrap();
        let renderer = BundleRenderer::new(
            "<div>{{msg}}</div>",
            RendererOptions::new().with_basedir(temp_dir.path()),
        )
        .unwrap();

        let ctx = RenderContext::new().with("msg", "hello");
        assert_eq!(renderer.render_to_string(&ctx).await.unwrap(), "<div>hello</div>");
    }

    #[tokio::test]
    async fn test_bundle_with_template_and_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let renderer = BundleRenderer::new(
            json!({"entry": "app", "files": {"app": "<div id=app>{{msg}}</div>"}, "basedir": temp_dir.path()}),
            RendererOptions::new()
                .with_template(TEMPLATE)
                .with_client_manifest(ClientManifest::new("/").with_initial("app.js")),
        )
        .unwrap();

        let ctx = RenderContext::new().with("msg", "hi").with_state(json!({"a": 1}));
        let html = renderer.render_to_string(&ctx).await.unwrap();
        assert_eq!(
            html,
            concat!(
                r#"<html><head><link rel="preload" href="/app.js" as="script"></head><body>"#,
                "<div id=app>hi</div>",
                r#"<script>window.__INITIAL_STATE__={"a":1}</script>"#,
                r#"<script src="/app.js" defer></script>"#,
                "</body></html>"
            )
        );
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(RenderPhase::ComposingTemplate.to_string(), "composing_template");
        assert_eq!(RenderPhase::Failed.as_str(), "failed");
    }
}
