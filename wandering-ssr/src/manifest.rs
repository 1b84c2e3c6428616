// Client manifest produced by the build

use crate::asset::{AssetDescriptor, classify_all};
use serde::{Deserialize, Serialize};

/// Asset manifest describing the client build output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientManifest {
    /// URL prefix for every asset
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Files needed by every page (initial chunks)
    #[serde(default)]
    pub initial: Vec<String>,

    /// Files only needed when referenced by the rendered page
    #[serde(default, rename = "async")]
    pub async_files: Vec<String>,
}

fn default_public_path() -> String {
    "/".to_string()
}

impl ClientManifest {
    /// Create a manifest with the given public path and no files
    pub fn new(public_path: impl Into<String>) -> Self {
        Self {
            public_path: public_path.into(),
            initial: Vec::new(),
            async_files: Vec::new(),
        }
    }

    /// Add an initial file
    pub fn with_initial(mut self, file: impl Into<String>) -> Self {
        self.initial.push(file.into());
        self
    }

    /// Add an async file
    pub fn with_async(mut self, file: impl Into<String>) -> Self {
        self.async_files.push(file.into());
        self
    }

    /// Parse a manifest from JSON text
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Public path guaranteed to end with `/`, unless it is empty.
    pub fn normalized_public_path(&self) -> String {
        normalize_public_path(&self.public_path)
    }

    /// Classified `initial` files
    pub fn preload_files(&self) -> Vec<AssetDescriptor> {
        classify_all(&self.initial)
    }

    /// Classified `async` files
    pub fn prefetch_files(&self) -> Vec<AssetDescriptor> {
        classify_all(&self.async_files)
    }
}

impl Default for ClientManifest {
    fn default() -> Self {
        Self::new(default_public_path())
    }
}

pub(crate) fn normalize_public_path(public_path: &str) -> String {
    if public_path.is_empty() || public_path.ends_with('/') {
        public_path.to_string()
    } else {
        format!("{}/", public_path)
    }
}
