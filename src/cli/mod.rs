//! Command-line interface for cite-check.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **check**: Check every entry of a reading list against the registries
//! - **lookup**: Check a single DOI or ISBN
//! - **parse**: Show the entries recognized in a reading list (no network)
//! - **sources**: List the registered metadata sources
//! - **serve**: Start the upload web interface
//!
//! ## Usage
//!
//! ```text
//! # Check a reading list
//! cite-check check literatur.docx
//!
//! # Include the slow national bibliographies, export a CSV report
//! cite-check check literatur.txt --include-slow --csv report.csv
//!
//! # JSON output for scripting
//! cite-check check literatur.txt --format json
//!
//! # Check one identifier
//! cite-check lookup 10.1000/xyz123 --title "Sample Title" --author "John Smith"
//!
//! # Start web UI
//! cite-check serve --port 8080 --open
//! ```

use clap::{Parser, Subcommand};

pub mod check;
pub mod lookup;
pub mod parse;
pub mod sources;

#[derive(Parser)]
#[command(name = "cite-check")]
#[command(author = "cite-check contributors")]
#[command(version)]
#[command(about = "Check bibliography entries against DOI and ISBN metadata registries")]
#[command(
    long_about = "cite-check reads a reading list (.txt or .docx), extracts every entry tagged with [DOI: ...] or [ISBN: ...] and asks public metadata registries what they know about each identifier.\n\nFor every entry it reports:\n- What each registry returned and how similar the title and authors are\n- A verdict: MATCH, PARTIAL or NO MATCH\n- The registry that agreed best with the claimed metadata"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check every entry of a reading list
    Check(check::CheckArgs),

    /// Check a single DOI or ISBN
    Lookup(lookup::LookupArgs),

    /// Show the entries recognized in a reading list
    Parse(parse::ParseArgs),

    /// List the registered metadata sources
    Sources,

    /// Start the web server
    Serve(ServeArgs),
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Registry lookup options shared by `check` and `lookup`
#[derive(clap::Args, Debug, Clone)]
pub struct RetrievalArgs {
    /// Also query the slow national bibliographies (DNB, ZDB)
    #[arg(long)]
    pub include_slow: bool,

    /// Minimum author similarity (0-100) for an author to count as found
    #[arg(long, default_value = "75", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub author_threshold: u8,

    /// Minimum title similarity (0-100) for the title to count as matching
    #[arg(long, default_value = "85", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub title_threshold: u8,

    /// Timeout in seconds for each registry call
    #[arg(long, default_value = "8", value_parser = clap::value_parser!(u64).range(1..=60))]
    pub timeout_secs: u64,

    /// Maximum concurrent requests per registry
    #[arg(long, default_value = "8", value_parser = clap::value_parser!(u16).range(1..=64))]
    pub per_source_limit: u16,
}

impl RetrievalArgs {
    /// Reconciler configuration from the command-line flags
    pub fn to_config(&self) -> crate::matching::ReconcilerConfig {
        let mut config = crate::matching::ReconcilerConfig::default();
        config.retrieval.include_slow_sources = self.include_slow;
        config.retrieval.call_timeout = std::time::Duration::from_secs(self.timeout_secs);
        config.retrieval.max_concurrent_per_source = usize::from(self.per_source_limit);
        config.scoring.author_threshold = self.author_threshold;
        config.classifier.title_threshold = self.title_threshold;
        config
    }
}

/// Build a reconciler over the default registries
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn build_reconciler(
    config: crate::matching::ReconcilerConfig,
) -> anyhow::Result<crate::matching::Reconciler> {
    let client = crate::sources::http::build_client(config.retrieval.call_timeout)?;
    let registry = crate::sources::registry::SourceRegistry::with_default_sources(&client);
    Ok(crate::matching::Reconciler::new(registry, config))
}
