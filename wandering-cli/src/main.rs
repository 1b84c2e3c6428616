//! wandering SSR CLI - render documents from build output.
//!
//! # Commands
//!
//! - `wandering-ssr render --config ssr.toml --content '<div>hi</div>'` - Render pre-rendered markup
//! - `wandering-ssr render --config ssr.toml --bundle dist/server-bundle.json` - Render a server bundle
//! - `wandering-ssr check --config ssr.toml` - Validate the template, manifest and bundle

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use commands::{check, render};
use error::CliResult;

/// wandering SSR - manifest-driven server-side rendering
#[derive(Parser)]
#[command(name = "wandering-ssr")]
#[command(version)]
#[command(about = "Render HTML documents from a template, a client manifest and a server bundle")]
#[command(propagate_version = true)]
#[command(after_help = format!(
    "{}\n  {} wandering-ssr check -c ssr.toml\n  {} wandering-ssr render -c ssr.toml --content '<div>hi</div>'\n  {} wandering-ssr render -c ssr.toml --bundle dist/server-bundle.json --state state.json -o dist/index.html",
    "Examples:".bright_cyan().bold(),
    "$".dimmed(),
    "$".dimmed(),
    "$".dimmed(),
))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one document
    #[command(alias = "r")]
    Render(RenderArgs),

    /// Build the renderer and report construction errors
    #[command(alias = "c")]
    Check(CheckArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Configuration file (.toml or .json)
    #[arg(short, long, env = "WANDERING_SSR_CONFIG")]
    config: PathBuf,

    /// Server bundle (.json or .js), overriding the configured one
    #[arg(short, long)]
    bundle: Option<PathBuf>,

    /// View template interpolated with the context
    #[arg(long, conflicts_with = "content")]
    view: Option<PathBuf>,

    /// Pre-rendered markup
    #[arg(long)]
    content: Option<String>,

    /// JSON file with the hydration state
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// JSON file with the render context
    #[arg(long)]
    context: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct CheckArgs {
    /// Configuration file (.toml or .json)
    #[arg(short, long, env = "WANDERING_SSR_CONFIG")]
    config: PathBuf,

    /// Server bundle (.json or .js), overriding the configured one
    #[arg(short, long)]
    bundle: Option<PathBuf>,
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_logging(cli.verbose, cli.quiet);

    let result: CliResult<()> = match cli.command {
        Commands::Render(args) => {
            render::execute(render::RenderArgs {
                config: args.config,
                bundle: args.bundle,
                view: args.view,
                content: args.content,
                state: args.state,
                context: args.context,
                out: args.out,
            })
            .await
        }
        Commands::Check(args) => check::execute(&args.config, args.bundle.as_deref(), cli.quiet),
    };

    if let Err(e) = result {
        eprintln!("\n  {} {}\n", "Error:".red().bold(), e);
        std::process::exit(1);
    };
}
