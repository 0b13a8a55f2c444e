//! pdftools CLI
//!
//! Runs the REST API server or performs one-off compress/merge jobs on local
//! files.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use pdftools::compression::check_ghostscript_available;
use pdftools::{CompressionLevel, MergeInput, ServiceConfig, compress_pdf, merge_files, validate_files};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// CLI enum for compression levels
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLevel {
    /// Light compression, keeps image quality high
    Optimized,
    /// Aggressive compression, downsamples images
    Maximum,
}

impl From<CliLevel> for CompressionLevel {
    fn from(level: CliLevel) -> Self {
        match level {
            CliLevel::Optimized => CompressionLevel::Optimized,
            CliLevel::Maximum => CompressionLevel::Maximum,
        }
    }
}

#[derive(Parser)]
#[command(name = "pdftools", version)]
#[command(about = "Compress and merge PDF documents", long_about = None)]
struct Cli {
    /// Path to a config file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Address to bind
        #[arg(short = 'H', long, env = "PDFTOOLS_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },

    /// Compress a single PDF
    Compress {
        /// PDF to compress
        input: PathBuf,

        /// Output path (default: compressed_<name> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compression level
        #[arg(short, long, value_enum, default_value = "optimized")]
        level: CliLevel,
    },

    /// Merge PDFs and PNG/JPEG images into one PDF, in argument order
    Merge {
        /// Files to merge
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,

        /// Output PDF
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    if let Some(path) = path {
        return ServiceConfig::from_file(path).with_context(|| format!("Failed to load config {}", path.display()));
    }

    Ok(ServiceConfig::discover()?.unwrap_or_default())
}

fn default_compress_output(input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Input path has no file name: {}", input.display()))?;
    Ok(input.with_file_name(format!("compressed_{}", name)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            match check_ghostscript_available(&config.ghostscript).await {
                Ok(path) => tracing::info!(ghostscript = %path.display(), "Ghostscript available"),
                Err(e) => tracing::warn!("Ghostscript unavailable, using lopdf fallback only: {}", e),
            }

            pdftools::api::serve_with_config(&host, port, config).await?;
            Ok(())
        }

        Commands::Compress { input, output, level } => {
            if !input.is_file() {
                bail!("Input file not found: {}", input.display());
            }
            let output = match output {
                Some(output) => output,
                None => default_compress_output(&input)?,
            };

            let outcome = compress_pdf(&input, &output, level.into(), &config).await?;

            eprintln!("{}", outcome.message);
            println!("{}", serde_json::to_string_pretty(&outcome.stats)?);
            Ok(())
        }

        Commands::Merge { inputs, output } => {
            let inputs: Vec<MergeInput> = inputs.into_iter().map(MergeInput::new).collect();
            validate_files(&inputs)?;

            let stats = merge_files(&inputs, &output).await?;

            eprintln!(
                "Merged {} files ({} pages) into {}",
                stats.total_files,
                stats.total_pages,
                output.display()
            );
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
    }
}
