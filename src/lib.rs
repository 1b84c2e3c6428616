// wandering - manifest-driven server-side rendering for Rust
//
// This library splices rendered application markup, resource hints, inline
// state and script tags into HTML templates described by a client build
// manifest, and renders Handlebars server bundles.

// Re-export core functionality
pub use wandering_ssr::*;

// Context values are plain JSON
pub use serde_json;

/// Prelude for common imports.
///
/// ```
/// use wandering::prelude::*;
/// ```
pub mod prelude {
    pub use wandering_ssr::{
        BundleRenderer, BundleSource, ClientManifest, RenderContext, RenderHelpers, Renderer,
        RendererOptions, SsrConfig, SsrError, TemplateSource, create_bundle_renderer,
        create_renderer, read_manifest, read_template,
    };
}
