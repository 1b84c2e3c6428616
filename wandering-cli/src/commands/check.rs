//! Check command
//!
//! Builds the configured renderer and reports construction errors.

use super::bundle_renderer;
use crate::error::CliResult;
use colored::Colorize;
use std::path::Path;
use tracing::debug;
use wandering_ssr::{SsrConfig, TemplateRenderer, create_renderer};

/// What a successful check found
#[derive(Debug, PartialEq, Eq)]
pub struct CheckReport {
    pub template: bool,
    pub preload_files: usize,
    pub bundle_entry: Option<String>,
}

pub fn execute(config: &Path, bundle: Option<&Path>, quiet: bool) -> CliResult<()> {
    let report = check(config, bundle)?;
    if quiet {
        return Ok(());
    }

    println!("{}", "wandering SSR check".bright_cyan().bold());
    println!("  {} config {}", "✓".green(), config.display());
    if report.template {
        println!("  {} template parsed", "✓".green());
    } else {
        println!("  {} no template, markup is returned unchanged", "!".yellow());
    }
    println!("  {} {} initial asset(s)", "✓".green(), report.preload_files);
    match &report.bundle_entry {
        Some(entry) => println!("  {} bundle entry {}", "✓".green(), entry),
        None => println!("  {} no bundle configured", "-".dimmed()),
    }
    Ok(())
}

pub fn check(config: &Path, bundle: Option<&Path>) -> CliResult<CheckReport> {
    let ssr_config = SsrConfig::from_file(config)?;
    debug!(?ssr_config, "Loaded configuration");
    let options = ssr_config.clone().into_options();

    if let Some(renderer) = bundle_renderer(&ssr_config, bundle, options.clone())? {
        let mut report = report(renderer.template_renderer());
        report.bundle_entry = Some(renderer.runner().bundle().entry.clone());
        return Ok(report);
    }

    let renderer = create_renderer(options)?;
    Ok(report(renderer.template_renderer()))
}

fn report(renderer: &TemplateRenderer) -> CheckReport {
    CheckReport {
        template: renderer.has_template(),
        preload_files: renderer.preload_files(&Default::default()).len(),
        bundle_entry: None,
    }
}
