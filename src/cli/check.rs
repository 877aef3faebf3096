use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use crate::cli::{build_reconciler, OutputFormat, RetrievalArgs};
use crate::core::types::MatchStatus;
use crate::matching::EntryReport;
use crate::parsing::citation;

#[derive(Args)]
pub struct CheckArgs {
    /// Reading list to check (.txt or .docx)
    #[arg(required = true)]
    pub input: PathBuf,

    #[command(flatten)]
    pub retrieval: RetrievalArgs,

    /// Number of entries checked at the same time
    #[arg(short, long, default_value = "4", value_parser = clap::value_parser!(u16).range(1..=32))]
    pub jobs: u16,

    /// Also write the per-source rows to a CSV file
    #[arg(long, value_name = "OUT")]
    pub csv: Option<PathBuf>,
}

/// Execute check subcommand
///
/// # Errors
///
/// Returns an error if the reading list cannot be parsed, the HTTP client
/// cannot be built, or the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CheckArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let parsed = citation::parse_file(&args.input)?;

    if verbose {
        eprintln!(
            "Found {} entries in {} ({} lines without identifier skipped)",
            parsed.entries.len(),
            args.input.display(),
            parsed.skipped_lines,
        );
    }

    if parsed.entries.is_empty() {
        eprintln!("No entries with a [DOI: ...] or [ISBN: ...] tag found.");
        return Ok(());
    }

    let mut config = args.retrieval.to_config();
    config.max_concurrent_entries = usize::from(args.jobs);
    let reconciler = build_reconciler(config)?;

    if verbose {
        eprintln!(
            "Querying {} sources (slow sources {})",
            reconciler.orchestrator().registry().len(),
            if args.retrieval.include_slow { "included" } else { "skipped" },
        );
    }

    let rt = tokio::runtime::Runtime::new()?;
    let results = rt.block_on(reconciler.check_all(&parsed.entries));

    let total = results.len();
    let reports: Vec<EntryReport> = results.into_iter().filter_map(Result::ok).collect();
    if reports.len() < total {
        eprintln!(
            "Warning: {} entries with an invalid identifier were skipped.",
            total - reports.len()
        );
    }

    print_reports(&reports, format, verbose)?;

    if let Some(path) = &args.csv {
        write_csv(&reports, path)?;
        eprintln!("Wrote CSV report to {}", path.display());
    }

    Ok(())
}

/// Print entry reports in the requested format
pub(crate) fn print_reports(
    reports: &[EntryReport],
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print_text_reports(reports, verbose),
        OutputFormat::Json => print_json_reports(reports)?,
        OutputFormat::Tsv => print_tsv_reports(reports),
    }
    Ok(())
}

/// Count of verdicts per status
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub matched: usize,
    pub partial: usize,
    pub unmatched: usize,
}

impl StatusSummary {
    pub fn from_reports(reports: &[EntryReport]) -> Self {
        let mut summary = Self {
            total: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match report.verdict.status {
                MatchStatus::Match => summary.matched += 1,
                MatchStatus::PartialMatch => summary.partial += 1,
                MatchStatus::NoMatch => summary.unmatched += 1,
            }
        }
        summary
    }
}

fn print_text_reports(reports: &[EntryReport], verbose: bool) {
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            println!("\n{}", "─".repeat(60));
        }

        let verdict = &report.verdict;
        let title = if verdict.title.is_empty() {
            "(no title)"
        } else {
            verdict.title.as_str()
        };
        println!("\n#{} {} ({})", i + 1, title, verdict.status);
        println!("   {}: {}", report.identifier.kind, report.identifier.canonical);
        if !verdict.authors.is_empty() {
            println!("   Authors: {}", verdict.authors.join("; "));
        }

        if report.attempted.is_empty() {
            println!("\n   No source supports this identifier.");
        } else {
            println!("\n   {:<26} {:>5}  {:<6} Registry authors", "Source", "Title", "Author");
            for (source, comparison, record) in report.source_rows() {
                let registry_authors = record.map(|r| r.authors.join("; ")).unwrap_or_default();
                let title_cell = if record.is_some() {
                    comparison.title_score.to_string()
                } else {
                    "-".to_string()
                };
                println!(
                    "   {:<26} {:>5}  {:<6} {}",
                    source,
                    title_cell,
                    if comparison.author_match { "yes" } else { "no" },
                    registry_authors,
                );
            }
        }

        println!(
            "\n   Best: {} (title {}%, author {})",
            verdict.best_source,
            verdict.best_score,
            if verdict.author_found {
                verdict.matched_authors.join("; ")
            } else {
                "not found".to_string()
            },
        );

        if verbose {
            if let Some(strategy) = report.strategy {
                println!("   Strategy: {strategy:?}");
            }
            for record in &report.records {
                println!("   {} title: {}", record.source_name, record.title);
            }
        }
    }

    let summary = StatusSummary::from_reports(reports);
    println!(
        "\n{} entries: {} match, {} partial, {} no match",
        summary.total, summary.matched, summary.partial, summary.unmatched
    );
}

fn print_json_reports(reports: &[EntryReport]) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "summary": StatusSummary::from_reports(reports),
        "reports": reports,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_reports(reports: &[EntryReport]) {
    println!("entry\tkind\tidentifier\ttitle\tstatus\tbest_source\tbest_score\tauthor_found\tmatched_authors\tsources_attempted\tsources_answered");
    for (i, report) in reports.iter().enumerate() {
        let verdict = &report.verdict;
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            i + 1,
            report.identifier.kind,
            report.identifier.canonical,
            verdict.title,
            verdict.status,
            verdict.best_source,
            verdict.best_score,
            verdict.author_found,
            verdict.matched_authors.join("; "),
            report.attempted.len(),
            report.records.len(),
        );
    }
}

/// Column order of the CSV export
pub const CSV_HEADER: [&str; 9] = [
    "title",
    "authors",
    "kind",
    "identifier",
    "source",
    "title_score",
    "author_found",
    "registry_authors",
    "status",
];

/// Write one CSV row per (entry, attempted source) to `writer`.
///
/// Entries no source could be asked about still get a single row with
/// source `none`.
///
/// # Errors
///
/// Returns an error if a row cannot be written.
pub fn write_csv_rows<W: Write>(reports: &[EntryReport], writer: W) -> anyhow::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADER)?;

    for report in reports {
        let entry = &report.entry;
        let authors = entry.authors.join("; ");
        let kind = report.identifier.kind.to_string();
        let status = report.verdict.status.to_string();

        if report.attempted.is_empty() {
            csv_writer.write_record([
                entry.title.as_str(),
                authors.as_str(),
                kind.as_str(),
                report.identifier.canonical.as_str(),
                report.verdict.best_source.as_str(),
                "0",
                "false",
                "",
                status.as_str(),
            ])?;
            continue;
        }

        for (source, comparison, record) in report.source_rows() {
            let registry_authors = record.map(|r| r.authors.join("; ")).unwrap_or_default();
            csv_writer.write_record([
                entry.title.as_str(),
                authors.as_str(),
                kind.as_str(),
                report.identifier.canonical.as_str(),
                source,
                comparison.title_score.to_string().as_str(),
                if comparison.author_match { "true" } else { "false" },
                registry_authors.as_str(),
                status.as_str(),
            ])?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

fn write_csv(reports: &[EntryReport], path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv_rows(reports, std::io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::BibliographicEntry;
    use crate::core::record::SourceRecord;
    use crate::core::types::IdentifierKind;
    use crate::matching::{Reconciler, ReconcilerConfig};
    use crate::retrieval::RetrievalOutcome;
    use crate::sources::registry::SourceRegistry;

    fn report() -> EntryReport {
        let entry = BibliographicEntry::new(IdentifierKind::Doi, "10.1000/xyz123", "Sample Title")
            .with_authors(["John Smith"]);
        let outcome = RetrievalOutcome {
            records: vec![SourceRecord::new("Crossref", "Sample Title").with_authors(["John Smith"])],
            attempted: vec!["Crossref".to_string(), "DataCite".to_string()],
            strategy: Some(crate::retrieval::RetrievalStrategy::IdentifierFanOut),
        };
        let reconciler = Reconciler::new(SourceRegistry::default(), ReconcilerConfig::default());
        let identifier = entry.identifier().unwrap();
        reconciler.evaluate(&entry, identifier, outcome)
    }

    #[test]
    fn test_csv_one_row_per_attempted_source() {
        let mut out = Vec::new();
        write_csv_rows(&[report()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "title,authors,kind,identifier,source,title_score,author_found,registry_authors,status"
        );
        assert_eq!(
            lines[1],
            "Sample Title,John Smith,DOI,10.1000/xyz123,Crossref,100,true,John Smith,MATCH"
        );
        assert_eq!(
            lines[2],
            "Sample Title,John Smith,DOI,10.1000/xyz123,DataCite,0,false,,MATCH"
        );
    }

    #[test]
    fn test_csv_entry_without_sources() {
        let entry = BibliographicEntry::new(IdentifierKind::Isbn, "3796519144", "Stadtchronik");
        let reconciler = Reconciler::new(SourceRegistry::default(), ReconcilerConfig::default());
        let identifier = entry.identifier().unwrap();
        let report = reconciler.evaluate(&entry, identifier, RetrievalOutcome::default());

        let mut out = Vec::new();
        write_csv_rows(&[report], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains(",none,0,false,,NO MATCH"));
    }

    #[test]
    fn test_status_summary() {
        let mut unmatched = report();
        unmatched.verdict.status = MatchStatus::NoMatch;
        let summary = StatusSummary::from_reports(&[report(), unmatched]);
        assert_eq!(
            summary,
            StatusSummary {
                total: 2,
                matched: 1,
                partial: 0,
                unmatched: 1
            }
        );
    }
}
