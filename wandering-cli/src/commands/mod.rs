//! CLI command implementations.

pub mod check;
pub mod render;

use crate::error::CliResult;
use std::path::{Path, PathBuf};
use wandering_ssr::{BundleRenderer, RendererOptions, SsrConfig, create_bundle_renderer, resolve_path};

/// Absolute form of a command line path
pub(crate) fn absolute(path: &Path) -> CliResult<PathBuf> {
    Ok(resolve_path(&std::env::current_dir()?, path))
}

/// Bundle renderer when a bundle is given on the command line or in the config
pub(crate) fn bundle_renderer(
    config: &SsrConfig,
    bundle: Option<&Path>,
    options: RendererOptions,
) -> CliResult<Option<BundleRenderer>> {
    let bundle = match bundle {
        Some(path) => Some(absolute(path)?),
        None => config.bundle.clone(),
    };

    match bundle {
        Some(path) => Ok(Some(create_bundle_renderer(path, options)?)),
        None => Ok(None),
    }
}
