//! Manifest-driven server-side rendering for wandering.
//!
//! This crate assembles complete HTML documents from rendered application
//! markup, a document template and the client build manifest.
//!
//! ## Features
//!
//! - 🧩 Template splitting around a content placeholder
//! - 🔗 Preload, prefetch, stylesheet and script tags from the client manifest
//! - 🔒 Script-safe inline state for hydration
//! - 📦 Server bundles rendered with a per-renderer Handlebars environment
//! - ⚙️ TOML/JSON configuration and soft-failing artifact readers
//!
//! ## Example
//!
//! ```no_run
//! use wandering_ssr::{create_renderer, read_manifest, RenderContext, RendererOptions};
//! use serde_json::json;
//!
//! # async fn example() -> wandering_ssr::Result<()> {
//! let renderer = create_renderer(
//!     RendererOptions::new()
//!         .with_template("<html><head></head><body><!--ssr-outlet--></body></html>")
//!         .with_client_manifest(read_manifest("dist/client-manifest.json")),
//! )?;
//!
//! let context = RenderContext::new().with_state(json!({"name": "xiaows"}));
//! let html = renderer.render_to_string("<div id=app>hi</div>", &context).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Bundle rendering
//!
//! Bundle files are Handlebars templates. The entry is rendered with the
//! request context; sibling files and `*.hbs` files under `basedir` are
//! available as partials.
//!
//! ```no_run
//! use wandering_ssr::{create_bundle_renderer, RenderContext, RendererOptions};
//! use std::path::PathBuf;
//!
//! # async fn example() -> wandering_ssr::Result<()> {
//! let renderer = create_bundle_renderer(
//!     PathBuf::from("/srv/app/dist/server-bundle.json"),
//!     RendererOptions::new().with_template("<body><!--ssr-outlet--></body>"),
//! )?;
//! let html = renderer.render_to_string(&RenderContext::new()).await?;
//! # Ok(())
//! # }
//! ```

mod asset;
mod bundle;
mod config;
mod context;
mod engine;
mod error;
mod helpers;
mod hints;
mod manifest;
mod reader;
mod renderer;
mod runner;
mod service;
mod state;
mod template;

pub use asset::{AssetDescriptor, AssetType, classify, classify_all};
pub use bundle::{Bundle, BundleSource, RAW_BUNDLE_ENTRY, ServerBundleBuilder};
pub use config::{ConfigFormat, RendererOptions, SsrConfig, StateConfig};
pub use context::RenderContext;
pub use engine::{EngineOptions, TemplateEngine};
pub use error::{Result, SsrError};
pub use hints::{AssetPredicate, AsyncChunkResolver, NoAsyncChunks, ResourceHints};
pub use manifest::ClientManifest;
pub use reader::{read_file, read_manifest, read_template, resolve_path};
pub use renderer::{RenderHelpers, TemplateRenderer};
pub use runner::BundleRunner;
pub use service::{BundleRenderer, RenderPhase, Renderer};
pub use state::{StateOptions, StateSerializer, render_state, serialize_state};
pub use template::{
    DEFAULT_PLACEHOLDER, FnTemplate, TemplateFragments, TemplateFunction, TemplateSource,
    parse_template,
};

/// Create a renderer for pre-rendered markup
pub fn create_renderer(options: RendererOptions) -> Result<Renderer> {
    Renderer::new(options)
}

/// Create a renderer for a server bundle
pub fn create_bundle_renderer(
    bundle: impl Into<BundleSource>,
    options: RendererOptions,
) -> Result<BundleRenderer> {
    BundleRenderer::new(bundle, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_renderer() {
        let renderer = create_renderer(RendererOptions::new()).unwrap();
        assert!(!renderer.template_renderer().has_template());
    }

    #[test]
    fn test_create_bundle_renderer_errors() {
        let err = create_bundle_renderer(
            serde_json::json!({"entry": "main.js", "files": {"other.js": ""}}),
            RendererOptions::new().with_basedir("/tmp"),
        )
        .unwrap_err();
        assert!(matches!(err, SsrError::InvalidBundleFormat(_)));
    }
}
