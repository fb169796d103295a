//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    category::CategoryCommands, completions::CompletionsArgs, init::InitArgs,
    product::ProductCommands, season::SeasonCommands,
};

#[derive(Parser)]
#[command(name = "shelf")]
#[command(author, version, about = "Storefront catalog manager")]
#[command(long_about = "Manage categories, products and seasons of a storefront catalog. \
Changes are shown immediately and rolled back if the backend refuses them.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .shelf/)
    #[arg(long, global = true, env = "SHELF_PROJECT")]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new shelf project
    Init(InitArgs),

    /// Storefront categories
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Products and their listing order
    #[command(subcommand)]
    Product(ProductCommands),

    /// Selling seasons
    #[command(subcommand)]
    Season(SeasonCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Tables for lists, a one-line summary for changes
    #[default]
    Auto,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// YAML format
    Yaml,
    /// Just IDs, one per line
    Id,
}
