//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Chat with your text documents
#[derive(Parser, Debug)]
#[command(
    name = "docchat",
    version = env!("CARGO_PKG_VERSION"),
    about = "Chat with your text documents",
    long_about = "Embed a folder of .txt documents into a local vector store and ask questions about them.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ docchat init              # Write .docchat/settings.toml\n  $ docchat ingest            # Build the store from ./docs\n  $ docchat chat              # Ask questions\n  $ docchat search \"sky\"      # Inspect retrieval only"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .docchat directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Build the vector store from the documents directory
    #[command(
        about = "Chunk, embed and store the documents",
        after_help = "Examples:\n  docchat ingest\n  docchat ingest --force --no-progress"
    )]
    Ingest {
        /// Rebuild even if the store already exists
        #[arg(short, long)]
        force: bool,

        /// Disable progress bars (overrides settings.toml show_progress)
        #[arg(long)]
        no_progress: bool,
    },

    /// Interactive question answering
    #[command(about = "Start an interactive chat over the ingested documents")]
    Chat {
        /// Chunks retrieved per question (overrides retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// One-shot retrieval without the language model
    #[command(
        about = "Show the chunks closest to a query",
        after_help = "Examples:\n  docchat search \"what color is the sky\"\n  docchat search \"yeast\" --limit 3 --json"
    )]
    Search {
        /// Query text
        query: String,

        /// Maximum number of chunks (defaults to retrieval.top_k)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
