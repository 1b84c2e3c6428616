//! Handlebars environment owned by a renderer.
//!
//! Every renderer gets its own registry. It doubles as the compiled template
//! cache: template fragments and bundle files are compiled into it on first
//! use and stay there for the renderer's lifetime. Partials are loaded from
//! the renderer's `basedir` when one is configured.

use crate::{Result, SsrError, helpers};
use handlebars::Handlebars;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Settings for a renderer's template environment
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Directory partials are loaded from
    pub basedir: Option<PathBuf>,

    /// Partial file extension (default: ".hbs")
    pub partial_extension: String,

    /// Escape interpolated values (default: true)
    pub escape_html: bool,

    /// Fail on missing variables (default: false)
    pub strict_mode: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            basedir: None,
            partial_extension: ".hbs".to_string(),
            escape_html: true,
            strict_mode: false,
        }
    }
}

#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Arc<RwLock<Handlebars<'static>>>,
    options: EngineOptions,
}

impl TemplateEngine {
    /// Create an engine and load partials from `basedir`, if any.
    pub fn new(options: EngineOptions) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(options.strict_mode);

        if !options.escape_html {
            handlebars.register_escape_fn(handlebars::no_escape);
        }

        helpers::register_builtin_helpers(&mut handlebars);

        let engine = Self {
            handlebars: Arc::new(RwLock::new(handlebars)),
            options,
        };

        if let Some(basedir) = engine.options.basedir.clone() {
            if !basedir.is_dir() {
                return Err(SsrError::Config(format!(
                    "basedir is not a directory: {}",
                    basedir.display()
                )));
            }
            let loaded = engine.load_partials_from_dir(&basedir, &basedir)?;
            debug!(basedir = %basedir.display(), partials = loaded, "Loaded template partials");
        }

        Ok(engine)
    }

    fn load_partials_from_dir(&self, root: &Path, dir: &Path) -> Result<usize> {
        let mut loaded = 0;
        let extension = self.options.partial_extension.trim_start_matches('.');

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();

            if path.is_dir() {
                loaded += self.load_partials_from_dir(root, &path)?;
            } else if path.extension().is_some_and(|ext| ext == extension) {
                let name = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .with_extension("")
                    .to_string_lossy()
                    .replace('\\', "/");
                let source = fs::read_to_string(&path)?;

                self.write()?.register_partial(&name, source)?;
                loaded += 1;
            }
        }

        Ok(loaded)
    }

    /// Compile `source` under `name` unless a template of that name exists.
    ///
    /// Returns `true` when this call compiled the template. Concurrent callers
    /// for the same name compile it once.
    pub fn compile_cached(&self, name: &str, source: &str) -> Result<bool> {
        if self.read()?.has_template(name) {
            return Ok(false);
        }

        let mut handlebars = self.write()?;
        if handlebars.has_template(name) {
            return Ok(false);
        }
        handlebars.register_template_string(name, source)?;
        debug!(template = name, "Compiled template");
        Ok(true)
    }

    /// Compile `source` under `name`, replacing a partial of the same name.
    ///
    /// Returns `true` when an existing template was replaced.
    pub fn compile_override(&self, name: &str, source: &str) -> Result<bool> {
        let mut handlebars = self.write()?;
        let replaced = handlebars.has_template(name);
        handlebars.register_template_string(name, source)?;
        debug!(template = name, replaced, "Compiled template");
        Ok(replaced)
    }

    /// Render a registered template
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        Ok(self.read()?.render(name, data)?)
    }

    /// Render a one-off template string without caching it
    pub fn render_template<T: Serialize>(&self, source: &str, data: &T) -> Result<String> {
        Ok(self.read()?.render_template(source, data)?)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.read().map(|h| h.has_template(name)).unwrap_or(false)
    }

    /// Names of every compiled template and loaded partial
    pub fn templates(&self) -> Vec<String> {
        self.read()
            .map(|h| h.get_templates().keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn basedir(&self) -> Option<&Path> {
        self.options.basedir.as_deref()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Handlebars<'static>>> {
        self.handlebars
            .read()
            .map_err(|_| SsrError::Render("template registry lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Handlebars<'static>>> {
        self.handlebars
            .write()
            .map_err(|_| SsrError::Render("template registry lock poisoned".to_string()))
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("options", &self.options)
            .field("templates", &self.templates().len())
            .finish()
    }
}
