use crate::cli::OutputFormat;
use crate::sources::registry::{SourceInfo, SourceRegistry};

/// Execute sources subcommand: list the registries in query order
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or JSON output fails.
pub fn run(format: OutputFormat) -> anyhow::Result<()> {
    let client = crate::sources::http::build_client(crate::sources::http::DEFAULT_CALL_TIMEOUT)?;
    let sources = SourceRegistry::with_default_sources(&client).describe();

    match format {
        OutputFormat::Text => print_text(&sources),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sources)?),
        OutputFormat::Tsv => print_tsv(&sources),
    }

    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn print_text(sources: &[SourceInfo]) {
    println!(
        "{:<26} {:<5} {:<5} {:<7} {:<5}",
        "Source", "DOI", "ISBN", "Title", "Slow"
    );
    println!("{}", "-".repeat(52));

    for info in sources {
        let caps = info.capabilities;
        println!(
            "{:<26} {:<5} {:<5} {:<7} {:<5}",
            info.name,
            yes_no(caps.supports_doi),
            yes_no(caps.supports_isbn),
            yes_no(caps.supports_title_search),
            yes_no(caps.is_slow),
        );
    }

    println!("\nSlow sources are only queried with --include-slow.");
}

fn print_tsv(sources: &[SourceInfo]) {
    println!("name\tsupports_doi\tsupports_isbn\tsupports_title_search\tis_slow");
    for info in sources {
        let caps = info.capabilities;
        println!(
            "{}\t{}\t{}\t{}\t{}",
            info.name, caps.supports_doi, caps.supports_isbn, caps.supports_title_search, caps.is_slow
        );
    }
}
