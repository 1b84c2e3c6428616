// Document composition

use crate::asset::AssetDescriptor;
use crate::config::RendererOptions;
use crate::context::RenderContext;
use crate::engine::TemplateEngine;
use crate::hints::{NoAsyncChunks, ResourceHints};
use crate::state::{StateOptions, StateSerializer, render_state};
use crate::template::{TemplateFragments, TemplateFunction, TemplateSource, parse_template};
use crate::{Result, SsrError};
use std::sync::Arc;
use tracing::debug;

const HEAD_TEMPLATE: &str = "__wandering_head";
const NECK_TEMPLATE: &str = "__wandering_neck";
const TAIL_TEMPLATE: &str = "__wandering_tail";

#[derive(Clone)]
enum ParsedTemplate {
    Fragments(Arc<TemplateFragments>),
    Function(Arc<dyn TemplateFunction>),
}

/// Splices rendered markup into the document template.
///
/// Without a template the renderer still renders hints, styles, state and
/// scripts for callers assembling the document themselves.
#[derive(Clone)]
pub struct TemplateRenderer {
    template: Option<ParsedTemplate>,
    hints: Option<ResourceHints>,
    state_options: StateOptions,
    serializer: Option<StateSerializer>,
    engine: TemplateEngine,
}

impl TemplateRenderer {
    /// Parse and compile the template, classify the manifest.
    pub fn new(options: &RendererOptions, engine: TemplateEngine) -> Result<Self> {
        let template = match &options.template {
            Some(TemplateSource::Html(html)) if !html.is_empty() => {
                let fragments = parse_template(html, &options.placeholder)?;
                engine.compile_cached(HEAD_TEMPLATE, &fragments.head)?;
                engine.compile_cached(NECK_TEMPLATE, &fragments.neck)?;
                engine.compile_cached(TAIL_TEMPLATE, &fragments.tail)?;
                Some(ParsedTemplate::Fragments(Arc::new(fragments)))
            }
            Some(TemplateSource::Function(function)) => {
                Some(ParsedTemplate::Function(Arc::clone(function)))
            }
            // empty templates count as absent
            Some(TemplateSource::Html(_)) | None => None,
        };

        let hints = options.client_manifest.as_ref().map(|manifest| {
            ResourceHints::new(manifest)
                .with_should_preload(options.should_preload.clone())
                .with_should_prefetch(options.should_prefetch.clone())
                .with_async_chunks(
                    options
                        .async_chunks
                        .clone()
                        .unwrap_or_else(|| Arc::new(NoAsyncChunks)),
                )
        });

        debug!(
            template = template.is_some(),
            manifest = hints.is_some(),
            "Created template renderer"
        );

        Ok(Self {
            template,
            hints,
            state_options: options.state_options.clone(),
            serializer: options.serializer.clone(),
            engine,
        })
    }

    pub fn has_template(&self) -> bool {
        self.template.is_some()
    }

    /// The head/neck/tail split of an HTML template
    pub fn fragments(&self) -> Option<&TemplateFragments> {
        match &self.template {
            Some(ParsedTemplate::Fragments(fragments)) => Some(fragments.as_ref()),
            _ => None,
        }
    }

    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    /// Compose the final document around `content`.
    pub async fn render(&self, content: &str, context: &RenderContext) -> Result<String> {
        match &self.template {
            Some(ParsedTemplate::Fragments(_)) => self.compose(content, context),
            Some(ParsedTemplate::Function(function)) => {
                function.render(content, context, &self.helpers(context)).await
            }
            None => Err(SsrError::MissingTemplate),
        }
    }

    fn compose(&self, content: &str, context: &RenderContext) -> Result<String> {
        let data = context.to_value();

        let mut html = self.engine.render(HEAD_TEMPLATE, &data)?;
        html.push_str(context.head().unwrap_or_default());
        html.push_str(&self.render_resource_hints(context));
        html.push_str(&self.render_styles(context));
        html.push_str(&self.engine.render(NECK_TEMPLATE, &data)?);
        html.push_str(content);
        html.push_str(&self.render_state(context));
        html.push_str(&self.render_scripts(context));
        html.push_str(&self.engine.render(TAIL_TEMPLATE, &data)?);
        Ok(html)
    }

    /// Helpers bound to `context`
    pub fn helpers<'a>(&'a self, context: &'a RenderContext) -> RenderHelpers<'a> {
        RenderHelpers {
            renderer: self,
            context,
        }
    }

    pub fn render_resource_hints(&self, context: &RenderContext) -> String {
        self.hints
            .as_ref()
            .map(|hints| hints.render_resource_hints(context))
            .unwrap_or_default()
    }

    pub fn render_preload_links(&self, context: &RenderContext) -> String {
        self.hints
            .as_ref()
            .map(|hints| hints.render_preload_links(context))
            .unwrap_or_default()
    }

    pub fn render_prefetch_links(&self, context: &RenderContext) -> String {
        self.hints
            .as_ref()
            .map(|hints| hints.render_prefetch_links(context))
            .unwrap_or_default()
    }

    /// Manifest stylesheets followed by `context.styles`
    pub fn render_styles(&self, context: &RenderContext) -> String {
        match &self.hints {
            Some(hints) => hints.render_styles(context),
            None => context.styles().unwrap_or_default().to_string(),
        }
    }

    pub fn render_state(&self, context: &RenderContext) -> String {
        render_state(context, &self.state_options, self.serializer.as_ref())
    }

    /// State script for non-default keys
    pub fn render_state_with(&self, context: &RenderContext, options: &StateOptions) -> String {
        render_state(context, options, self.serializer.as_ref())
    }

    pub fn render_scripts(&self, context: &RenderContext) -> String {
        self.hints
            .as_ref()
            .map(|hints| hints.render_scripts(context))
            .unwrap_or_default()
    }

    pub fn preload_files(&self, context: &RenderContext) -> Vec<AssetDescriptor> {
        self.hints
            .as_ref()
            .map(|hints| hints.preload_files(context))
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("template", &self.fragments())
            .field("hints", &self.hints)
            .field("state_options", &self.state_options)
            .finish()
    }
}

/// Document fragments for one render, handed to function templates.
#[derive(Clone, Copy)]
pub struct RenderHelpers<'a> {
    renderer: &'a TemplateRenderer,
    context: &'a RenderContext,
}

impl RenderHelpers<'_> {
    pub fn render_resource_hints(&self) -> String {
        self.renderer.render_resource_hints(self.context)
    }

    pub fn render_styles(&self) -> String {
        self.renderer.render_styles(self.context)
    }

    pub fn render_state(&self) -> String {
        self.renderer.render_state(self.context)
    }

    pub fn render_state_with(&self, options: &StateOptions) -> String {
        self.renderer.render_state_with(self.context, options)
    }

    pub fn render_scripts(&self) -> String {
        self.renderer.render_scripts(self.context)
    }

    pub fn preload_files(&self) -> Vec<AssetDescriptor> {
        self.renderer.preload_files(self.context)
    }
}
