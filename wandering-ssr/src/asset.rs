//! Asset classification for manifest entries.

use serde::Serialize;
use std::fmt;

/// The `as` type of a preload hint, derived from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Script,
    Style,
    Image,
    Font,
    /// Anything not covered above; rendered without an `as` attribute.
    #[serde(rename = "")]
    Other,
}

impl AssetType {
    /// Map a bare extension (no leading dot) to its preload type.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "js" => AssetType::Script,
            "css" => AssetType::Style,
            "jpg" | "jpeg" | "png" | "svg" | "gif" | "webp" | "ico" => AssetType::Image,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => AssetType::Font,
            _ => AssetType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Script => "script",
            AssetType::Style => "style",
            AssetType::Image => "image",
            AssetType::Font => "font",
            AssetType::Other => "",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A manifest file with its query stripped and its type resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetDescriptor {
    /// Path as listed in the manifest, query string included
    pub file: String,
    /// Extension without the leading dot, empty if none
    pub extension: String,
    pub file_without_query: String,
    pub as_type: AssetType,
}

impl AssetDescriptor {
    pub fn is_script(&self) -> bool {
        self.as_type == AssetType::Script
    }

    pub fn is_style(&self) -> bool {
        self.as_type == AssetType::Style
    }
}

/// Classify a manifest file path.
///
/// Everything from the first `?` is treated as a query and ignored for
/// classification; the returned `file` keeps it.
pub fn classify(file: &str) -> AssetDescriptor {
    let without_query = match file.find('?') {
        Some(idx) => &file[..idx],
        None => file,
    };

    AssetDescriptor {
        file: file.to_string(),
        extension: extension_of(without_query).to_string(),
        file_without_query: without_query.to_string(),
        as_type: AssetType::from_extension(extension_of(without_query)),
    }
}

/// Classify every entry of a manifest list, keeping order.
pub fn classify_all<S: AsRef<str>>(files: &[S]) -> Vec<AssetDescriptor> {
    files.iter().map(|f| classify(f.as_ref())).collect()
}

// Same rules as a path's extname: last dot of the last segment, dotfiles have none.
fn extension_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &name[idx + 1..],
    }
}
