//! # regchunk CLI
//!
//! The `regchunk` binary parses regulatory documents into their legal
//! structure and cuts them into retrieval-sized chunks.
//!
//! ## Usage
//!
//! ```bash
//! regchunk --config ./config/regchunk.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `regchunk detect <file>` | Print the detected dialect (gdpr, hipaa, generic) |
//! | `regchunk sections <file>` | Print the parsed section outline |
//! | `regchunk chunk <file>` | Chunk one document to text, JSON, or JSONL |
//! | `regchunk ingest <dir>` | Chunk every matching file under a directory to JSONL |
//! | `regchunk stats <file>` | Print chunk statistics for one document |
//!
//! A missing config file is not an error: built-in defaults apply.
//! Logging goes to stderr and is controlled by `RUST_LOG` or `--verbose`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use regchunk::config;
use regchunk::export::{self, OutputFormat};
use regchunk::{ingest, inspect, stats};
use regchunk_core::dialect::Dialect;

/// regchunk: structure-aware chunking of regulatory texts.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/regchunk.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "regchunk",
    about = "Structure-aware parsing and chunking of regulatory texts",
    version,
    long_about = "regchunk splits regulations such as GDPR and HIPAA into their legal units \
    (chapters, articles, recitals, parts, subparts, sections) and chunks each unit at sentence \
    boundaries within a configurable size envelope, ready for embedding and retrieval."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/regchunk.toml`. Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/regchunk.toml")]
    config: PathBuf,

    /// Log progress at info level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Print the detected document dialect.
    Detect {
        /// Document to inspect (.txt, .md, .pdf, .docx).
        file: PathBuf,
    },

    /// Print the parsed section outline.
    Sections {
        /// Document to parse.
        file: PathBuf,

        /// Skip detection and parse with this dialect (gdpr, hipaa, generic).
        #[arg(long, value_parser = parse_dialect)]
        dialect: Option<Dialect>,

        /// Print full sections as JSON instead of an outline.
        #[arg(long)]
        json: bool,
    },

    /// Parse and chunk one document.
    Chunk {
        /// Document to chunk.
        file: PathBuf,

        /// Skip detection and parse with this dialect (gdpr, hipaa, generic).
        #[arg(long, value_parser = parse_dialect)]
        dialect: Option<Dialect>,

        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Chunk every matching document under a directory.
    ///
    /// Files are selected by `[ingest].include_globs` and processed
    /// concurrently; output is JSONL in path order. Documents that fail to
    /// read or parse are reported and skipped.
    Ingest {
        /// Directory to scan.
        dir: PathBuf,

        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print chunk statistics for one document.
    Stats {
        /// Document to analyze.
        file: PathBuf,

        /// Skip detection and parse with this dialect (gdpr, hipaa, generic).
        #[arg(long, value_parser = parse_dialect)]
        dialect: Option<Dialect>,
    },
}

fn parse_dialect(s: &str) -> Result<Dialect, String> {
    s.parse()
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Detect { file } => {
            inspect::run_detect(&cfg, &file)?;
        }
        Commands::Sections {
            file,
            dialect,
            json,
        } => {
            inspect::run_sections(&cfg, &file, dialect, json)?;
        }
        Commands::Chunk {
            file,
            dialect,
            format,
            output,
        } => {
            export::run_chunk(&cfg, &file, dialect, format, output.as_deref())?;
        }
        Commands::Ingest { dir, output } => {
            ingest::run_ingest(&cfg, &dir, output.as_deref()).await?;
        }
        Commands::Stats { file, dialect } => {
            stats::run_stats(&cfg, &file, dialect)?;
        }
    }

    Ok(())
}
