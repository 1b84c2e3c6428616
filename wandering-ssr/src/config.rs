// Renderer configuration

use crate::engine::EngineOptions;
use crate::hints::{AssetPredicate, AsyncChunkResolver};
use crate::manifest::ClientManifest;
use crate::reader::{read_manifest, read_template, resolve_path};
use crate::state::{StateOptions, StateSerializer};
use crate::template::{DEFAULT_PLACEHOLDER, TemplateSource};
use crate::{Result, SsrError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options shared by [`Renderer`](crate::Renderer) and
/// [`BundleRenderer`](crate::BundleRenderer).
#[derive(Clone)]
pub struct RendererOptions {
    /// Document template; `None` returns rendered markup unchanged
    pub template: Option<TemplateSource>,

    /// Client build manifest driving hints and scripts
    pub client_manifest: Option<ClientManifest>,

    /// Replaces the default script/style preload filter
    pub should_preload: Option<AssetPredicate>,

    /// Filters prefetch links (default: all async files)
    pub should_prefetch: Option<AssetPredicate>,

    /// Replaces the script-safe JSON state serializer
    pub serializer: Option<StateSerializer>,

    /// Template root; required for bundle rendering
    pub basedir: Option<PathBuf>,

    /// Content placeholder (default: `<!--ssr-outlet-->`)
    pub placeholder: String,

    /// Escape interpolated template values (default: true)
    pub escape_html: bool,

    /// Fail on missing template variables (default: false)
    pub strict_mode: bool,

    /// Extension of partial files under `basedir` (default: ".hbs")
    pub partial_extension: String,

    /// State context and window keys
    pub state_options: StateOptions,

    /// Source of the async chunks used by a render
    pub async_chunks: Option<Arc<dyn AsyncChunkResolver>>,
}

impl RendererOptions {
    pub fn new() -> Self {
        Self {
            template: None,
            client_manifest: None,
            should_preload: None,
            should_prefetch: None,
            serializer: None,
            basedir: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            escape_html: true,
            strict_mode: false,
            partial_extension: ".hbs".to_string(),
            state_options: StateOptions::default(),
            async_chunks: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<TemplateSource>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_client_manifest(mut self, manifest: ClientManifest) -> Self {
        self.client_manifest = Some(manifest);
        self
    }

    pub fn with_should_preload<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str, crate::AssetType) -> bool + Send + Sync + 'static,
    {
        self.should_preload = Some(Arc::new(predicate));
        self
    }

    pub fn with_should_prefetch<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str, crate::AssetType) -> bool + Send + Sync + 'static,
    {
        self.should_prefetch = Some(Arc::new(predicate));
        self
    }

    pub fn with_serializer<F>(mut self, serializer: F) -> Self
    where
        F: Fn(&serde_json::Value) -> String + Send + Sync + 'static,
    {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    pub fn with_basedir(mut self, basedir: impl Into<PathBuf>) -> Self {
        self.basedir = Some(basedir.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_escape_html(mut self, escape: bool) -> Self {
        self.escape_html = escape;
        self
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn with_partial_extension(mut self, extension: impl Into<String>) -> Self {
        self.partial_extension = extension.into();
        self
    }

    pub fn with_state_options(mut self, options: StateOptions) -> Self {
        self.state_options = options;
        self
    }

    pub fn with_async_chunks(mut self, resolver: Arc<dyn AsyncChunkResolver>) -> Self {
        self.async_chunks = Some(resolver);
        self
    }

    /// Engine settings with `basedir` overriding the configured one
    pub(crate) fn engine_options(&self, basedir: Option<PathBuf>) -> EngineOptions {
        EngineOptions {
            basedir: basedir.or_else(|| self.basedir.clone()),
            partial_extension: self.partial_extension.clone(),
            escape_html: self.escape_html,
            strict_mode: self.strict_mode,
        }
    }
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RendererOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererOptions")
            .field("template", &self.template)
            .field("client_manifest", &self.client_manifest)
            .field("should_preload", &self.should_preload.is_some())
            .field("should_prefetch", &self.should_prefetch.is_some())
            .field("serializer", &self.serializer.is_some())
            .field("basedir", &self.basedir)
            .field("placeholder", &self.placeholder)
            .field("escape_html", &self.escape_html)
            .field("strict_mode", &self.strict_mode)
            .field("partial_extension", &self.partial_extension)
            .field("state_options", &self.state_options)
            .field("async_chunks", &self.async_chunks.is_some())
            .finish()
    }
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(ConfigFormat::Json),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }

    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| SsrError::Config(format!("No file extension found: {}", path.display())))?;

        Self::from_extension(ext).ok_or_else(|| SsrError::Config(format!("Unsupported format: {}", ext)))
    }
}

/// Build output locations and renderer settings read from a file.
///
/// ```toml
/// template = "dist/index.html"
/// client_manifest = "dist/client-manifest.json"
/// bundle = "dist/server-bundle.json"
///
/// [state]
/// context_key = "state"
/// window_key = "__INITIAL_STATE__"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsrConfig {
    pub template: Option<PathBuf>,
    pub client_manifest: Option<PathBuf>,
    pub bundle: Option<PathBuf>,
    pub basedir: Option<PathBuf>,
    pub placeholder: String,
    pub escape_html: bool,
    pub strict_mode: bool,
    pub partial_extension: String,
    pub state: StateConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub context_key: String,
    pub window_key: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        let defaults = StateOptions::default();
        Self {
            context_key: defaults.context_key,
            window_key: defaults.window_key,
        }
    }
}

impl Default for SsrConfig {
    fn default() -> Self {
        Self {
            template: None,
            client_manifest: None,
            bundle: None,
            basedir: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            escape_html: true,
            strict_mode: false,
            partial_extension: ".hbs".to_string(),
            state: StateConfig::default(),
        }
    }
}

impl SsrConfig {
    /// Load a `.toml` or `.json` file; its paths become absolute, relative to its directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path)
            .map_err(|e| SsrError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config = Self::parse(&content, format)?;
        let root = resolve_path(&std::env::current_dir()?, path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(config.resolve_relative_to(&root))
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| SsrError::Config(format!("JSON parse error: {}", e))),
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| SsrError::Config(format!("TOML parse error: {}", e))),
        }
    }

    /// Make every configured path absolute relative to `root`.
    pub fn resolve_relative_to(mut self, root: &Path) -> Self {
        let resolve = |p: Option<PathBuf>| p.map(|p| resolve_path(root, &p));
        self.template = resolve(self.template);
        self.client_manifest = resolve(self.client_manifest);
        self.bundle = resolve(self.bundle);
        self.basedir = resolve(self.basedir);
        self
    }

    /// Renderer options with the template and manifest read from disk.
    ///
    /// Missing template or manifest files are logged and replaced by defaults.
    pub fn into_options(self) -> RendererOptions {
        let mut options = RendererOptions::new()
            .with_placeholder(self.placeholder)
            .with_escape_html(self.escape_html)
            .with_strict_mode(self.strict_mode)
            .with_partial_extension(self.partial_extension)
            .with_state_options(StateOptions::new(self.state.context_key, self.state.window_key));

        if let Some(template) = self.template {
            options = options.with_template(read_template(template));
        }
        if let Some(manifest) = self.client_manifest {
            options = options.with_client_manifest(read_manifest(manifest));
        }
        if let Some(basedir) = self.basedir {
            options = options.with_basedir(basedir);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_options() {
        let options = RendererOptions::default();
        assert!(options.template.is_none());
        assert_eq!(options.placeholder, "<!--ssr-outlet-->");
        assert!(options.escape_html);
        assert!(!options.strict_mode);
        assert_eq!(options.state_options, StateOptions::default());
    }

    #[test]
    fn test_options_builder() {
        let options = RendererOptions::new()
            .with_template("<body><!--app--></body>")
            .with_placeholder("<!--app-->")
            .with_basedir("/srv/views")
            .with_should_preload(|_, _| true)
            .with_strict_mode(true);

        assert!(matches!(options.template, Some(TemplateSource::Html(_))));
        assert_eq!(options.placeholder, "<!--app-->");
        assert!(options.should_preload.is_some());
        assert!(options.strict_mode);

        let engine = options.engine_options(None);
        assert_eq!(engine.basedir, Some(PathBuf::from("/srv/views")));
        let engine = options.engine_options(Some(PathBuf::from("/other")));
        assert_eq!(engine.basedir, Some(PathBuf::from("/other")));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }

    #[test]
    fn test_parse_toml_defaults() {
        let config = SsrConfig::parse("template = \"index.html\"", ConfigFormat::Toml).unwrap();
        assert_eq!(config.template, Some(PathBuf::from("index.html")));
        assert!(config.escape_html);
        assert_eq!(config.state.window_key, "__INITIAL_STATE__");
    }

    #[test]
    fn test_parse_json() {
        let config = SsrConfig::parse(
            r#"{"bundle": "server-bundle.json", "state": {"window_key": "__STATE__"}}"#,
            ConfigFormat::Json,
        )
        .unwrap();
        assert_eq!(config.bundle, Some(PathBuf::from("server-bundle.json")));
        assert_eq!(config.state.context_key, "state");
        assert_eq!(config.state.window_key, "__STATE__");
    }

    #[test]
    fn test_parse_error() {
        let err = SsrConfig::parse("template = ", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, SsrError::Config(_)));
    }

    #[test]
    fn test_from_file_resolves_paths() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ssr.toml");
        fs::write(
            &path,
            "template = \"dist/index.html\"\nclient_manifest = \"/abs/manifest.json\"\n",
        )
        .unwrap();

        let config = SsrConfig::from_file(&path).unwrap();
        assert_eq!(config.template, Some(temp_dir.path().join("dist/index.html")));
        assert_eq!(config.client_manifest, Some(PathBuf::from("/abs/manifest.json")));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = SsrConfig::from_file("ssr.yaml").unwrap_err();
        assert!(matches!(err, SsrError::Config(_)));
    }

    #[test]
    fn test_into_options_reads_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("index.html"), "<body><!--ssr-outlet--></body>").unwrap();
        let config = SsrConfig {
            template: Some(PathBuf::from("index.html")),
            client_manifest: Some(PathBuf::from("missing.json")),
            ..Default::default()
        }
        .resolve_relative_to(temp_dir.path());
        let options = config.into_options();

        match options.template {
            Some(TemplateSource::Html(html)) => assert_eq!(html, "<body><!--ssr-outlet--></body>"),
            other => panic!("unexpected template: {:?}", other),
        }
        assert_eq!(options.client_manifest, Some(ClientManifest::default()));
    }
}
