// Resource hints, stylesheet links and script tags derived from the manifest

use crate::asset::{AssetDescriptor, AssetType};
use crate::context::RenderContext;
use crate::manifest::ClientManifest;
use std::collections::HashSet;
use std::sync::Arc;

/// Filter deciding whether a file gets a hint: `(file_without_query, as_type)`.
pub type AssetPredicate = Arc<dyn Fn(&str, AssetType) -> bool + Send + Sync>;

/// Resolves the async chunks a rendered page actually used.
///
/// Those files are preloaded and their scripts emitted alongside the initial
/// chunks. Implementations usually read module ids recorded in the context by
/// the application.
pub trait AsyncChunkResolver: Send + Sync {
    fn used_async_files(&self, context: &RenderContext) -> Vec<AssetDescriptor>;
}

/// Resolver that never reports used async chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAsyncChunks;

impl AsyncChunkResolver for NoAsyncChunks {
    fn used_async_files(&self, _context: &RenderContext) -> Vec<AssetDescriptor> {
        Vec::new()
    }
}

/// Renders `<link>`/`<script>` tags for a client manifest.
#[derive(Clone)]
pub struct ResourceHints {
    public_path: String,
    preload_files: Vec<AssetDescriptor>,
    prefetch_files: Vec<AssetDescriptor>,
    should_preload: Option<AssetPredicate>,
    should_prefetch: Option<AssetPredicate>,
    async_chunks: Arc<dyn AsyncChunkResolver>,
}

impl ResourceHints {
    /// Classify the manifest once; descriptors are reused for every render.
    pub fn new(manifest: &ClientManifest) -> Self {
        Self {
            public_path: manifest.normalized_public_path(),
            preload_files: manifest.preload_files(),
            prefetch_files: manifest.prefetch_files(),
            should_preload: None,
            should_prefetch: None,
            async_chunks: Arc::new(NoAsyncChunks),
        }
    }

    pub fn with_should_preload(mut self, predicate: Option<AssetPredicate>) -> Self {
        self.should_preload = predicate;
        self
    }

    pub fn with_should_prefetch(mut self, predicate: Option<AssetPredicate>) -> Self {
        self.should_prefetch = predicate;
        self
    }

    pub fn with_async_chunks(mut self, resolver: Arc<dyn AsyncChunkResolver>) -> Self {
        self.async_chunks = resolver;
        self
    }

    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    /// Initial files followed by the async files used by this render
    pub fn preload_files(&self, context: &RenderContext) -> Vec<AssetDescriptor> {
        let mut files = self.preload_files.clone();
        files.extend(self.async_chunks.used_async_files(context));
        files
    }

    pub fn render_resource_hints(&self, context: &RenderContext) -> String {
        let mut out = self.render_preload_links(context);
        out.push_str(&self.render_prefetch_links(context));
        out
    }

    pub fn render_preload_links(&self, context: &RenderContext) -> String {
        self.preload_files(context)
            .iter()
            .filter(|asset| match &self.should_preload {
                Some(should_preload) => should_preload(&asset.file_without_query, asset.as_type),
                // by default, only scripts and styles
                None => matches!(asset.as_type, AssetType::Script | AssetType::Style),
            })
            .map(|asset| {
                let as_attr = match asset.as_type {
                    AssetType::Other => String::new(),
                    ty => format!(" as=\"{}\"", ty),
                };
                let extra = if asset.as_type == AssetType::Font {
                    format!(" type=\"font/{}\" crossorigin", asset.extension)
                } else {
                    String::new()
                };
                format!(
                    "<link rel=\"preload\" href=\"{}{}\"{}{}>",
                    self.public_path, asset.file, as_attr, extra
                )
            })
            .collect()
    }

    pub fn render_prefetch_links(&self, context: &RenderContext) -> String {
        let used = self.async_chunks.used_async_files(context);
        let already_rendered: HashSet<&str> = used.iter().map(|a| a.file.as_str()).collect();

        self.prefetch_files
            .iter()
            .filter(|asset| match &self.should_prefetch {
                Some(should_prefetch) => should_prefetch(&asset.file_without_query, asset.as_type),
                None => true,
            })
            .filter(|asset| !already_rendered.contains(asset.file.as_str()))
            .map(|asset| format!("<link rel=\"prefetch\" href=\"{}{}\">", self.public_path, asset.file))
            .collect()
    }

    /// Stylesheet links for CSS files, then the context's inline styles
    pub fn render_styles(&self, context: &RenderContext) -> String {
        let mut out: String = self
            .preload_files(context)
            .iter()
            .filter(|asset| asset.is_style())
            .map(|asset| format!("<link rel=\"stylesheet\" href=\"{}{}\">", self.public_path, asset.file))
            .collect();
        out.push_str(context.styles().unwrap_or_default());
        out
    }

    /// Deferred script tags.
    ///
    /// The first initial script (runtime/vendor chunk) comes first, then the
    /// used async chunks, then the remaining initial scripts.
    pub fn render_scripts(&self, context: &RenderContext) -> String {
        let initial: Vec<&AssetDescriptor> =
            self.preload_files.iter().filter(|a| a.is_script()).collect();
        let used = self.async_chunks.used_async_files(context);
        let async_scripts = used.iter().filter(|a| a.is_script());

        initial
            .first()
            .copied()
            .into_iter()
            .chain(async_scripts)
            .chain(initial.iter().skip(1).copied())
            .map(|asset| {
                format!(
                    "<script src=\"{}{}\" defer></script>",
                    self.public_path, asset.file
                )
            })
            .collect()
    }
}

impl std::fmt::Debug for ResourceHints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHints")
            .field("public_path", &self.public_path)
            .field("preload_files", &self.preload_files)
            .field("prefetch_files", &self.prefetch_files)
            .field("should_preload", &self.should_preload.is_some())
            .field("should_prefetch", &self.should_prefetch.is_some())
            .finish()
    }
}
