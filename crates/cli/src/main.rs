//! Command-line interface for archive listing.
//!
//! Prints the names of the entries inside an archive, one per line, after
//! identifying the format from the file's header bytes.

use clap::Parser;
use lister::{list_path, Entry, ListError, ListOptions, ListSummary};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;

#[derive(Parser)]
#[command(name = "pear")]
#[command(version, about = "List the entries of an archive", long_about = None)]
struct Cli {
    /// Archive file to list
    archive: PathBuf,

    /// Stop after N entries, or -1 for all
    #[arg(short = 'n', long, value_name = "N", default_value_t = 10, allow_negative_numbers = true)]
    max_count: i64,

    /// Skip the first N entries
    #[arg(short, long, value_name = "N", default_value_t = 0)]
    skip: usize,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// JSON report printed with `--json`.
#[derive(Serialize)]
struct Report {
    #[serde(flatten)]
    summary: ListSummary,
    entries: Vec<String>,
}

fn main() {
    // Initialize tracing; stdout is reserved for entry names
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    let options = ListOptions::new(cli.skip, cli.max_count);
    let result = if cli.json {
        handle_json(&cli.archive, &options)
    } else {
        handle_plain(&cli.archive, &options)
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(exit_code(&e));
    }
}

fn handle_plain(archive: &Path, options: &ListOptions) -> Result<(), ListError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let summary = list_path(archive, options, &mut |entry: &Entry| {
        // a closed stdout ends the listing like a reached limit
        writeln!(out, "{}", entry.name).is_ok()
    })?;
    let _ = out.flush();

    debug!(format = %summary.format, listed = summary.listed, "done");
    Ok(())
}

fn handle_json(archive: &Path, options: &ListOptions) -> Result<(), ListError> {
    let mut entries = Vec::new();
    let summary = list_path(archive, options, &mut |entry: &Entry| {
        entries.push(entry.name.clone());
        true
    })?;

    let report = Report { summary, entries };
    // a closed stdout drops the report instead of panicking
    let _ = write_report(&mut io::stdout().lock(), &report);
    Ok(())
}

fn write_report<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
    writeln!(out, "{}", json)?;
    out.flush()
}

/// Map a listing failure to the process exit status.
fn exit_code(err: &ListError) -> i32 {
    match err {
        ListError::UnknownFormat => 2,
        ListError::EmptyInput => 3,
        _ => 1,
    }
}
