use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::parsing::citation::{self, ParsedDocument};

#[derive(Args)]
pub struct ParseArgs {
    /// Reading list to parse (.txt or .docx)
    #[arg(required = true)]
    pub input: PathBuf,
}

/// Execute parse subcommand. Never touches the network.
///
/// # Errors
///
/// Returns an error if the reading list cannot be read or parsed.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ParseArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let parsed = citation::parse_file(&args.input)?;

    match format {
        OutputFormat::Text => print_text(&parsed, verbose),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&parsed)?),
        OutputFormat::Tsv => print_tsv(&parsed),
    }

    Ok(())
}

fn print_text(parsed: &ParsedDocument, verbose: bool) {
    for (i, entry) in parsed.entries.iter().enumerate() {
        let title = if entry.has_title() {
            entry.title.as_str()
        } else {
            "(no title)"
        };
        println!("#{} {} {}: {}", i + 1, entry.kind, entry.raw_identifier, title);

        if !entry.authors.is_empty() {
            println!("   Authors: {}", entry.authors.join("; "));
        }

        if verbose {
            match entry.identifier() {
                Ok(id) => println!("   Lookup keys: {}", id.lookup_keys().join(", ")),
                Err(e) => println!("   Warning: {e}"),
            }
        }
    }

    println!(
        "\n{} entries, {} lines without identifier skipped",
        parsed.entries.len(),
        parsed.skipped_lines
    );
}

fn print_tsv(parsed: &ParsedDocument) {
    println!("entry\tkind\tidentifier\ttitle\tauthors");
    for (i, entry) in parsed.entries.iter().enumerate() {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            i + 1,
            entry.kind,
            entry.raw_identifier,
            entry.title,
            entry.authors.join("; "),
        );
    }
}
