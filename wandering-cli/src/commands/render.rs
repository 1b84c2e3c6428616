//! Render command
//!
//! Renders one document from the configured template, manifest and bundle.

use super::bundle_renderer;
use crate::error::{CliError, CliResult};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use wandering_ssr::{RenderContext, SsrConfig, create_renderer};

/// Inputs of a render
#[derive(Debug, Default)]
pub struct RenderArgs {
    pub config: PathBuf,
    pub bundle: Option<PathBuf>,
    pub view: Option<PathBuf>,
    pub content: Option<String>,
    pub state: Option<PathBuf>,
    pub context: Option<PathBuf>,
    pub out: Option<PathBuf>,
}

/// Render and write the document to `out` or stdout
pub async fn execute(args: RenderArgs) -> CliResult<()> {
    let html = render(&args).await?;

    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(out, &html)?;
            info!(path = %out.display(), bytes = html.len(), "Wrote document");
            eprintln!("{} {}", "✓".green().bold(), out.display());
        }
        None => println!("{}", html),
    }

    Ok(())
}

/// Render the document described by `args`
pub async fn render(args: &RenderArgs) -> CliResult<String> {
    let config = SsrConfig::from_file(&args.config)?;
    let context = load_context(args, &config)?;
    let options = config.clone().into_options();

    if let Some(renderer) = bundle_renderer(&config, args.bundle.as_deref(), options.clone())? {
        if args.view.is_some() || args.content.is_some() {
            return Err(CliError::InvalidArgument(
                "--view and --content cannot be combined with a bundle".to_string(),
            ));
        }
        return Ok(renderer.render_to_string(&context).await?);
    }

    let renderer = create_renderer(options)?;
    match (&args.view, &args.content) {
        (Some(view), None) => {
            let view = fs::read_to_string(view)?;
            Ok(renderer.render_view(&view, &context).await?)
        }
        (None, Some(content)) => Ok(renderer.render_to_string(content, &context).await?),
        (Some(_), Some(_)) => Err(CliError::InvalidArgument(
            "--view and --content are mutually exclusive".to_string(),
        )),
        (None, None) => Err(CliError::InvalidArgument(
            "nothing to render: pass --bundle, --view or --content".to_string(),
        )),
    }
}

fn load_context(args: &RenderArgs, config: &SsrConfig) -> CliResult<RenderContext> {
    let mut context = match &args.context {
        Some(path) => {
            let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
            if !value.is_object() {
                return Err(CliError::Json(format!(
                    "context file must hold an object: {}",
                    path.display()
                )));
            }
            RenderContext::from_value(value)
        }
        None => RenderContext::new(),
    };

    if let Some(path) = &args.state {
        let state: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        context.insert(config.state.context_key.as_str(), state);
    }

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("index.html"),
            "<html><head></head><body><!--ssr-outlet--></body></html>",
        )
        .unwrap();
        fs::write(temp_dir.path().join("ssr.toml"), "template = \"index.html\"\n").unwrap();
        temp_dir
    }

    #[tokio::test]
    async fn test_render_content() {
        let temp_dir = project();
        let html = render(&RenderArgs {
            config: temp_dir.path().join("ssr.toml"),
            content: Some("<div>hi</div>".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(html, "<html><head></head><body><div>hi</div></body></html>");
    }

    #[tokio::test]
    async fn test_render_view_with_context_and_state() {
        let temp_dir = project();
        fs::write(temp_dir.path().join("home.hbs"), "<h1>{{title}}</h1>").unwrap();
        fs::write(temp_dir.path().join("context.json"), r#"{"title": "Home"}"#).unwrap();
        fs::write(temp_dir.path().join("state.json"), r#"{"user": 1}"#).unwrap();

        let html = render(&RenderArgs {
            config: temp_dir.path().join("ssr.toml"),
            view: Some(temp_dir.path().join("home.hbs")),
            context: Some(temp_dir.path().join("context.json")),
            state: Some(temp_dir.path().join("state.json")),
            ..Default::default()
        })
        .await
        .unwrap();

        assert!(html.contains(r#"<h1>Home</h1><script>window.__INITIAL_STATE__={"user":1}</script>"#));
    }

    #[tokio::test]
    async fn test_state_uses_configured_keys() {
        let temp_dir = project();
        fs::write(
            temp_dir.path().join("ssr.toml"),
            "template = \"index.html\"\n\n[state]\ncontext_key = \"store\"\nwindow_key = \"__STORE__\"\n",
        )
        .unwrap();
        fs::write(temp_dir.path().join("state.json"), r#"{"count": 2}"#).unwrap();

        let html = render(&RenderArgs {
            config: temp_dir.path().join("ssr.toml"),
            content: Some("<p/>".to_string()),
            state: Some(temp_dir.path().join("state.json")),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(
            html,
            r#"<html><head></head><body><p/><script>window.__STORE__={"count":2}</script></body></html>"#
        );
    }

    #[tokio::test]
    async fn test_nothing_to_render() {
        let temp_dir = project();
        let err = render(&RenderArgs {
            config: temp_dir.path().join("ssr.toml"),
            ..Default::default()
        })
        .await
        .unwrap_err();

        assert!(matches!(err, CliError::InvalidArgument(_)));
    }
}
