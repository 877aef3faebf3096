use clap::Args;

use crate::cli::check::print_reports;
use crate::cli::{build_reconciler, OutputFormat, RetrievalArgs};
use crate::core::entry::{normalize_author, BibliographicEntry};
use crate::core::identifier::detect_kind;

#[derive(Args)]
pub struct LookupArgs {
    /// DOI (10.xxxx/...) or ISBN-10/ISBN-13, hyphens allowed
    #[arg(required = true)]
    pub identifier: String,

    /// Claimed title to compare against the registries
    #[arg(short, long, default_value = "")]
    pub title: String,

    /// Claimed author, "Given Family" or "Family, Given" (repeatable)
    #[arg(long = "author")]
    pub authors: Vec<String>,

    #[command(flatten)]
    pub retrieval: RetrievalArgs,
}

impl LookupArgs {
    /// Entry described by the command-line arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is neither DOI- nor ISBN-shaped.
    pub fn to_entry(&self) -> anyhow::Result<BibliographicEntry> {
        let kind = detect_kind(&self.identifier)?;
        Ok(BibliographicEntry::new(kind, self.identifier.trim(), self.title.trim())
            .with_authors(self.authors.iter().map(|a| normalize_author(a))))
    }
}

/// Execute lookup subcommand
///
/// # Errors
///
/// Returns an error if the identifier is invalid or the HTTP client cannot be
/// built.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: LookupArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let entry = args.to_entry()?;
    let reconciler = build_reconciler(args.retrieval.to_config())?;

    if verbose {
        eprintln!("Looking up {} {}", entry.kind, entry.raw_identifier);
    }

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(reconciler.check(&entry))?;

    print_reports(std::slice::from_ref(&report), format, verbose)
}
