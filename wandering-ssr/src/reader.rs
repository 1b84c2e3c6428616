// Build artifact readers

use crate::Result;
use crate::manifest::ClientManifest;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Resolve `path` against `root` unless it is already absolute
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Read a file relative to the current directory.
pub fn read_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let root = std::env::current_dir()?;
    Ok(fs::read_to_string(resolve_path(&root, path))?)
}

/// Read a client manifest, falling back to the default manifest.
///
/// Unreadable or malformed files are logged and never fail the caller.
pub fn read_manifest(path: impl AsRef<Path>) -> ClientManifest {
    let path = path.as_ref();

    let content = match read_file(path) {
        Ok(content) => content,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read client manifest");
            return ClientManifest::default();
        }
    };

    match ClientManifest::from_json(&content) {
        Ok(manifest) => {
            debug!(
                path = %path.display(),
                initial = manifest.initial.len(),
                async_files = manifest.async_files.len(),
                "Loaded client manifest"
            );
            manifest
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to parse client manifest");
            ClientManifest::default()
        }
    }
}

/// Read an HTML template, falling back to an empty string.
pub fn read_template(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();

    read_file(path).unwrap_or_else(|e| {
        error!(path = %path.display(), error = %e, "Failed to read template");
        String::new()
    })
}
