//! Server bundles.
//!
//! A bundle is a set of named template sources with one entry. It can be
//! given as raw template source, as the path of a `.json`/`.js` build
//! artifact, or as an in-memory object. Every form is normalized into a
//! [`Bundle`] at construction time, so shape problems never reach a render.
//! Template syntax inside bundle files is checked by the first render.

use crate::asset::classify;
use crate::{Result, SsrError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Entry name given to raw source bundles
pub const RAW_BUNDLE_ENTRY: &str = "__wandering_ssr_bundle__";

/// Normalized server bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub entry: String,
    pub files: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub maps: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basedir: Option<PathBuf>,
}

/// Bundle as given by the caller
#[derive(Debug, Clone)]
pub enum BundleSource {
    /// Entry template source
    Raw(String),
    /// Absolute path of a `.json` bundle or a `.js` entry source
    File(PathBuf),
    /// Bundle object built in memory
    Inline(Bundle),
    /// Bundle object in its JSON form
    Json(Value),
}

impl Bundle {
    /// Single-file bundle around raw entry source
    pub fn from_source(source: impl Into<String>) -> Self {
        let mut files = BTreeMap::new();
        files.insert(RAW_BUNDLE_ENTRY.to_string(), source.into());
        Self {
            entry: RAW_BUNDLE_ENTRY.to_string(),
            files,
            maps: BTreeMap::new(),
            basedir: None,
        }
    }

    /// Validate a JSON bundle object.
    pub fn from_value(value: Value) -> Result<Self> {
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(SsrError::InvalidBundleFormat(format!(
                    "expected an object, got {}",
                    json_type(&other)
                )));
            }
        };

        let entry = match object.get("entry") {
            Some(Value::String(entry)) => entry.clone(),
            _ => return Err(SsrError::InvalidBundleFormat("missing string `entry`".to_string())),
        };

        let files = match object.get("files") {
            Some(Value::Object(files)) => string_map(files, "files")?,
            _ => return Err(SsrError::InvalidBundleFormat("missing object `files`".to_string())),
        };

        let maps = match object.get("maps") {
            Some(Value::Object(maps)) => maps
                .iter()
                .map(|(name, map)| {
                    let map = match map {
                        Value::String(map) => map.clone(),
                        other => other.to_string(),
                    };
                    (name.clone(), map)
                })
                .collect(),
            _ => BTreeMap::new(),
        };

        let basedir = object.get("basedir").and_then(Value::as_str).map(PathBuf::from);

        Self {
            entry,
            files,
            maps,
            basedir,
        }
        .validated()
    }

    /// Read a bundle file.
    ///
    /// `.json` files hold a bundle object, `.js` files the entry source. The
    /// file's directory becomes the bundle `basedir` unless it names one.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_absolute() {
            return Err(SsrError::InvalidBundleFormat(format!(
                "bundle path must be absolute: {}",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(SsrError::BundleNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut bundle = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let value: Value =
                    serde_json::from_str(&content).map_err(|source| SsrError::InvalidBundleJson {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Self::from_value(value)?
            }
            Some("js") => Self::from_source(content),
            _ => {
                return Err(SsrError::InvalidBundleFormat(format!(
                    "bundle file must end in .js or .json: {}",
                    path.display()
                )));
            }
        };

        if bundle.basedir.is_none() {
            bundle.basedir = path.parent().map(Path::to_path_buf);
        }

        debug!(path = %path.display(), files = bundle.files.len(), "Loaded server bundle");
        Ok(bundle)
    }

    /// Check that `entry` names one of `files`.
    pub fn validated(self) -> Result<Self> {
        if !self.files.contains_key(&self.entry) {
            return Err(SsrError::InvalidBundleFormat(format!(
                "entry \"{}\" is not one of the bundle files",
                self.entry
            )));
        }
        Ok(self)
    }

    pub fn entry_source(&self) -> Option<&str> {
        self.files.get(&self.entry).map(String::as_str)
    }

    /// Every file other than the entry
    pub fn siblings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .filter(|(name, _)| **name != self.entry)
            .map(|(name, source)| (name.as_str(), source.as_str()))
    }
}

impl BundleSource {
    /// Normalize into a validated bundle.
    pub fn load(self) -> Result<Bundle> {
        match self {
            BundleSource::Raw(source) => Ok(Bundle::from_source(source)),
            BundleSource::File(path) => Bundle::from_file(&path),
            BundleSource::Inline(bundle) => bundle.validated(),
            BundleSource::Json(value) => Bundle::from_value(value),
        }
    }
}

impl From<&str> for BundleSource {
    /// Absolute `.js`/`.json` paths are files, anything else is source
    fn from(bundle: &str) -> Self {
        let path = Path::new(bundle);
        let is_bundle_file = path.is_absolute()
            && path
                .extension()
                .is_some_and(|ext| ext == "js" || ext == "json");

        if is_bundle_file {
            BundleSource::File(path.to_path_buf())
        } else {
            BundleSource::Raw(bundle.to_string())
        }
    }
}

impl From<String> for BundleSource {
    fn from(bundle: String) -> Self {
        BundleSource::from(bundle.as_str())
    }
}

impl From<PathBuf> for BundleSource {
    fn from(path: PathBuf) -> Self {
        BundleSource::File(path)
    }
}

impl From<&Path> for BundleSource {
    fn from(path: &Path) -> Self {
        BundleSource::File(path.to_path_buf())
    }
}

impl From<Bundle> for BundleSource {
    fn from(bundle: Bundle) -> Self {
        BundleSource::Inline(bundle)
    }
}

impl From<Value> for BundleSource {
    fn from(value: Value) -> Self {
        BundleSource::Json(value)
    }
}

/// Assembles a server bundle from the assets of a build entrypoint.
#[derive(Debug, Clone, Default)]
pub struct ServerBundleBuilder {
    entry_assets: Vec<String>,
    files: BTreeMap<String, String>,
    maps: BTreeMap<String, String>,
    basedir: Option<PathBuf>,
}

impl ServerBundleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an asset of the server entrypoint
    pub fn entry_asset(mut self, name: impl Into<String>) -> Self {
        self.entry_assets.push(name.into());
        self
    }

    /// Add an emitted file; `.map` files are stored as source maps
    pub fn file(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        let name = name.into();
        match name.strip_suffix(".map") {
            Some(target) => {
                self.maps.insert(target.to_string(), source.into());
            }
            None => {
                self.files.insert(name, source.into());
            }
        }
        self
    }

    pub fn basedir(mut self, basedir: impl Into<PathBuf>) -> Self {
        self.basedir = Some(basedir.into());
        self
    }

    /// Build the bundle; the entrypoint must have exactly one script asset.
    pub fn build(self) -> Result<Bundle> {
        let scripts: Vec<String> = self
            .entry_assets
            .iter()
            .filter(|asset| classify(asset).is_script())
            .cloned()
            .collect();

        let entry = match scripts.as_slice() {
            [] => {
                return Err(SsrError::EntryNotFound(
                    self.entry_assets.first().cloned().unwrap_or_default(),
                ));
            }
            [entry] => entry.clone(),
            _ => return Err(SsrError::MultipleEntryAssets(scripts)),
        };

        if !self.files.contains_key(&entry) {
            return Err(SsrError::EntryNotFound(entry));
        }

        Ok(Bundle {
            entry,
            files: self.files,
            maps: self.maps,
            basedir: self.basedir,
        })
    }
}

fn string_map(object: &Map<String, Value>, field: &str) -> Result<BTreeMap<String, String>> {
    object
        .iter()
        .map(|(name, value)| match value {
            Value::String(source) => Ok((name.clone(), source.clone())),
            _ => Err(SsrError::InvalidBundleFormat(format!(
                "`{}.{}` must be a string",
                field, name
            ))),
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
