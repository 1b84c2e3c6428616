// Error types for server-side rendering

use std::path::PathBuf;
use thiserror::Error;

/// Shape expected of an object bundle, quoted in format errors.
pub(crate) const BUNDLE_SHAPE: &str = "{ entry: string; files: { [filename: string]: string; }; maps?: { [filename: string]: string; } }";

#[derive(Error, Debug)]
pub enum SsrError {
    #[error("Content placeholder not found in template: {0}")]
    PlaceholderNotFound(String),

    #[error("render cannot be called without a template")]
    MissingTemplate,

    #[error(
        "Invalid server-rendering bundle format: {}. Should be a string or a bundle object of type {}",
        .0,
        BUNDLE_SHAPE
    )]
    InvalidBundleFormat(String),

    #[error("Cannot locate bundle file: {0}")]
    BundleNotFound(PathBuf),

    #[error("Invalid JSON bundle file {path}: {source}")]
    InvalidBundleJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "Server-side bundle should have one single entry file, found {}: {}",
        .0.len(),
        .0.join(", ")
    )]
    MultipleEntryAssets(Vec<String>),

    #[error("Entry \"{0}\" not found. Did you specify the correct entry option?")]
    EntryNotFound(String),

    #[error("basedir is undefined")]
    MissingBasedir,

    #[error("Template parsing error: {0}")]
    Template(String),

    /// A bundle file failed to compile on the first render.
    #[error("Failed to compile bundle file {file}: {message}")]
    BundleCompile { file: String, message: String },

    #[error("Rendering error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SsrError {
    /// Whether this error can only come out of renderer construction.
    ///
    /// Construction errors mean the build output or the renderer options are
    /// wrong; they are never delivered through a render call.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            SsrError::PlaceholderNotFound(_)
                | SsrError::InvalidBundleFormat(_)
                | SsrError::BundleNotFound(_)
                | SsrError::InvalidBundleJson { .. }
                | SsrError::MultipleEntryAssets(_)
                | SsrError::EntryNotFound(_)
                | SsrError::MissingBasedir
                | SsrError::Template(_)
                | SsrError::Config(_)
        )
    }
}

impl From<handlebars::TemplateError> for SsrError {
    fn from(err: handlebars::TemplateError) -> Self {
        SsrError::Template(err.to_string())
    }
}

impl From<handlebars::RenderError> for SsrError {
    fn from(err: handlebars::RenderError) -> Self {
        SsrError::Render(err.to_string())
    }
}

impl From<tokio::task::JoinError> for SsrError {
    fn from(err: tokio::task::JoinError) -> Self {
        SsrError::Render(format!("render task failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, SsrError>;
