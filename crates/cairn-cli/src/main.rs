//! Cairn CLI
//!
//! Command-line interface for building, diffing, flattening and extracting
//! content manifests

use cairn_core::config::{LogFormat, DEFAULT_CONFIG_FILE};
use cairn_core::logging_facility::init;
use cairn_core::CairnConfig;
use cairn_core_types::RunId;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cairn")]
#[command(about = "Cairn - content manifests and deduplicating stores", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Directory receiving manifests, reports and stores
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Configuration file (defaults to ./cairn.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Suppress the progress bar
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Print reports as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Extra allow/deny rules applied to every walk
    #[arg(long, global = true)]
    pub filters: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a manifest per source and a diff report per consecutive pair
    Diff(commands::SourcesArgs),
    /// Flatten each source into its own raw store (reset)
    Flatten(commands::SourcesArgs),
    /// Flatten every source into the shared raw store
    Shared(commands::SourcesArgs),
    /// Flatten each source into its own compressed store (reset)
    Compress(commands::SourcesArgs),
    /// Flatten every source into the shared compressed store
    #[command(name = "compressshared")]
    CompressShared(commands::SourcesArgs),
    /// Rebuild trees from manifest and store pairs
    Extract(commands::extract::ExtractArgs),
    /// Check a store holds everything a manifest needs
    Validate(commands::validate::ValidateArgs),
    /// Remove store content no listed manifest references
    Tidy(commands::tidy::TidyArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.global.config {
        Some(path) => CairnConfig::load(path)?,
        None => CairnConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    let format: LogFormat = cli.global.log_format.unwrap_or(config.log_format);
    init(format.profile());

    let run_id = RunId::new();
    let span = tracing::info_span!("cairn", run_id = %run_id);
    let _guard = span.enter();

    let ctx = commands::Context::new(config, &cli.global)?;

    use commands::flatten::Mode;
    match cli.command {
        Commands::Diff(args) => commands::diff::execute(&ctx, args),
        Commands::Flatten(args) => commands::flatten::execute(&ctx, Mode::Flatten, args),
        Commands::Shared(args) => commands::flatten::execute(&ctx, Mode::Shared, args),
        Commands::Compress(args) => commands::flatten::execute(&ctx, Mode::Compress, args),
        Commands::CompressShared(args) => {
            commands::flatten::execute(&ctx, Mode::CompressShared, args)
        }
        Commands::Extract(args) => commands::extract::execute(&ctx, args),
        Commands::Validate(args) => commands::validate::execute(&ctx, args),
        Commands::Tidy(args) => commands::tidy::execute(&ctx, args),
    }
}
