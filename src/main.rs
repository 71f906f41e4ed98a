//! rustieee - IEEE Xplore search and result set algebra
//!
//! ## Usage
//!
//! ### Search
//! ```bash
//! rustieee search "optics AND nano" -o search1 -y 1990 -y 2000 -e
//! APIKEY=... rustieee search "h264 NEAR/3 cellular" -y 2005 -o search2.json --api
//! ```
//!
//! ### Combine saved results
//! ```bash
//! rustieee logic --merge a.json b.json c.json -o merged.json
//! rustieee logic --or a.json b.json --not c.json -o out.json
//! rustieee logic a.json --not b.json -o out.json
//! ```

use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand};
use rustieee::api::{self, ApiClient};
use rustieee::chromium::BrowserOptions;
use rustieee::export::{change_extension, write_json, write_spreadsheet};
use rustieee::logic::{self, LogicRequest, SetOperator};
use rustieee::query::{add_data_field, DataField, YearRange};
use rustieee::scrape::{self, ScrapeOptions};
use rustieee::{IeeeError, Record};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// IEEE Xplore search and result set algebra
#[derive(Parser)]
#[command(name = "rustieee")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Show extra info (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search IEEE Xplore and save the results as JSON
    Search(SearchArgs),

    /// Combine saved result files with MERGE, AND, OR and NOT
    Logic(LogicArgs),
}

#[derive(Args)]
#[command(group(ArgGroup::new("field").multiple(false)))]
struct SearchArgs {
    /// Search query, IEEE command syntax allowed
    query: String,

    /// File where to save results as JSON
    #[arg(short, long)]
    output: PathBuf,

    /// Year range; a single value searches from that year to date
    #[arg(short, long, required = true, num_args = 1)]
    year: Vec<i32>,

    /// Searches "Full Text & Metadata"
    #[arg(short = 'f', long, group = "field", help_heading = "IEEE Data Fields")]
    full_text_and_metadata: bool,

    /// Searches "Full Text Only"
    #[arg(short = 't', long, group = "field", help_heading = "IEEE Data Fields")]
    text_only: bool,

    /// Searches "Publication Title"
    #[arg(short = 'p', long, group = "field", help_heading = "IEEE Data Fields")]
    publication_title: bool,

    /// Searches "All Metadata"
    #[arg(short = 'm', long, group = "field", help_heading = "IEEE Data Fields")]
    metadata: bool,

    /// Searches "IEEE Terms"
    #[arg(short = 'i', long, group = "field", help_heading = "IEEE Data Fields")]
    ieee_terms: bool,

    /// Also save results as a spreadsheet (CSV)
    #[arg(short, long)]
    excel: bool,

    /// Use the IEEE API instead of scraping
    #[arg(short, long)]
    api: bool,

    /// IEEE API key (required with --api)
    #[arg(long, env = "APIKEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chrome/Chromium binary used for scraping
    #[arg(long, env = "CHROME_PATH")]
    chrome: Option<PathBuf>,

    /// Show the browser window while scraping
    #[arg(long)]
    headful: bool,
}

impl SearchArgs {
    fn data_field(&self) -> Option<DataField> {
        [
            (self.full_text_and_metadata, DataField::FullTextAndMetadata),
            (self.text_only, DataField::TextOnly),
            (self.publication_title, DataField::PublicationTitle),
            (self.metadata, DataField::Metadata),
            (self.ieee_terms, DataField::IeeeTerms),
        ]
        .into_iter()
        .find_map(|(set, field)| set.then_some(field))
    }
}

#[derive(Args)]
#[command(group(ArgGroup::new("operator").multiple(false)))]
struct LogicArgs {
    /// Input file for NOT when no other operator is used
    files: Vec<PathBuf>,

    /// Output file of the operation
    #[arg(short, long)]
    output: PathBuf,

    /// Combines different files into a single one
    #[arg(short, long, num_args = 1.., group = "operator")]
    merge: Vec<PathBuf>,

    /// Logical AND operator
    #[arg(short = 'A', long, num_args = 1.., group = "operator")]
    and: Vec<PathBuf>,

    /// Logical OR operator
    #[arg(short = 'O', long, num_args = 1.., group = "operator")]
    or: Vec<PathBuf>,

    /// Logical NOT operator: removes this file's records from the result
    #[arg(short = 'N', long)]
    not: Option<PathBuf>,

    /// Also save the result as a spreadsheet (CSV)
    #[arg(short, long)]
    excel: bool,
}

impl LogicArgs {
    fn into_request(self) -> LogicRequest {
        let (operator, mut inputs) = if !self.merge.is_empty() {
            (Some(SetOperator::Merge), self.merge)
        } else if !self.and.is_empty() {
            (Some(SetOperator::And), self.and)
        } else if !self.or.is_empty() {
            (Some(SetOperator::Or), self.or)
        } else {
            (None, Vec::new())
        };
        inputs.extend(self.files);

        LogicRequest {
            operator,
            inputs,
            not: self.not,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Commands::Search(args) => run_search(args).await,
        Commands::Logic(args) => run_logic(args),
    };

    if let Err(e) = outcome {
        // Reported once, on stderr, whatever the log level
        eprintln!("{}", failure_message(&e));
        std::process::exit(failure_exit_code(&e));
    }
}

fn failure_message(e: &anyhow::Error) -> String {
    format!("Error: {:#}", e)
}

fn failure_exit_code(e: &anyhow::Error) -> i32 {
    e.downcast_ref::<IeeeError>()
        .map(IeeeError::exit_code)
        .unwrap_or(1)
}

// ============================================================================
// Search
// ============================================================================

async fn run_search(args: SearchArgs) -> Result<()> {
    let years = YearRange::from_years_now(&args.year)?;
    let field = args.data_field();
    let query = add_data_field(&args.query, field);

    let api_key = match (args.api, args.api_key.as_deref()) {
        (true, None) | (true, Some("")) => {
            return Err(IeeeError::Validation(
                "No APIKEY key provided. Set APIKEY environment variable".to_string(),
            )
            .into())
        }
        (true, Some(key)) => Some(key.to_string()),
        (false, _) => None,
    };

    println!("Searching for: {}", args.query);
    println!("Between {} and {}", years.start, years.end);
    println!(
        "Using: {}",
        field.map(DataField::label).unwrap_or("No data fields")
    );

    let json_path = change_extension(&args.output, "json");
    let sheet_path = args.excel.then(|| change_extension(&args.output, "csv"));

    match api_key {
        Some(key) => {
            let client = ApiClient::new(key)?;
            let envelope = client.search(&query, Some(years)).await?;

            println!("Found {} results", envelope.total_records);
            if api::is_capped(&envelope) {
                warn!(total_records = envelope.total_records, "API results capped");
                eprintln!(
                    "WARNING: API searches are limited to fetching {} results",
                    api::MAX_RECORDS
                );
                eprintln!("\t Consider using scraping or narrowing your search");
            }

            if envelope.total_records > 0 {
                save_api_results(&json_path, sheet_path.as_deref(), &envelope.articles)?;
            }
        }
        None => {
            let options = ScrapeOptions {
                years: Some(years),
                browser: BrowserOptions {
                    headless: !args.headful,
                    chrome_path: args.chrome,
                },
                ..Default::default()
            };
            let envelope = scrape::scrape(&query, &options).await?;

            println!("Found {} results", envelope.total_records);
            if envelope.total_records > 0 {
                save_json(&json_path, &envelope.articles)?;
                if let Some(sheet_path) = &sheet_path {
                    save_spreadsheet(sheet_path, &envelope.articles)?;
                }
            }
        }
    }

    Ok(())
}

/// Write API articles as received; they are only normalized for the spreadsheet.
fn save_api_results(
    json_path: &Path,
    sheet_path: Option<&Path>,
    articles: &[serde_json::Value],
) -> Result<()> {
    save_json(json_path, articles)?;
    if let Some(sheet_path) = sheet_path {
        let records = api::to_records(articles)?;
        save_spreadsheet(sheet_path, &records)?;
    }
    Ok(())
}

fn save_json<T: Serialize>(path: &Path, articles: &[T]) -> Result<()> {
    write_json(path, articles)?;
    println!("Saved: {}", path.display());
    Ok(())
}

fn save_spreadsheet(path: &Path, records: &[Record]) -> Result<()> {
    write_spreadsheet(path, records)?;
    println!("Saved: {}", path.display());
    Ok(())
}

// ============================================================================
// Logic
// ============================================================================

fn run_logic(args: LogicArgs) -> Result<()> {
    let output = args.output.clone();
    let excel = args.excel;
    let request = args.into_request();

    info!(
        operator = ?request.operator,
        inputs = request.inputs.len(),
        not = ?request.not,
        "Combining files"
    );
    let records = logic::combine_files(&request)?;

    let json_path = change_extension(&output, "json");
    write_json(&json_path, &records)?;
    println!("{} records saved to {}", records.len(), json_path.display());

    if excel {
        save_spreadsheet(&change_extension(&output, "csv"), &records)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_report() {
        let e = anyhow::Error::from(IeeeError::MissingFile(PathBuf::from("a.json")));
        assert_eq!(failure_message(&e), "Error: a.json: no such file or directory");
        assert_eq!(failure_exit_code(&e), rustieee::error::EXIT_MISSING_INPUT);

        let other = anyhow::anyhow!("unexpected");
        assert_eq!(failure_exit_code(&other), 1);
    }

    #[test]
    fn test_api_results_without_spreadsheet_are_not_normalized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let json_path = dir.path().join("search.json");
        let articles = vec![json!({"title": ["unexpected", "shape"], "article_number": "1"})];

        save_api_results(&json_path, None, &articles).expect("raw articles are written as-is");

        let written: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&json_path).expect("read"))
                .expect("parse");
        assert_eq!(written, articles);
    }

    #[test]
    fn test_api_results_with_spreadsheet_are_normalized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let json_path = dir.path().join("search.json");
        let sheet_path = dir.path().join("search.csv");
        let articles = vec![json!({
            "article_number": "8123456",
            "title": "Nano optics",
            "publication_year": 2019
        })];

        save_api_results(&json_path, Some(&sheet_path), &articles).expect("save");

        let sheet = std::fs::read_to_string(&sheet_path).expect("read sheet");
        assert!(sheet.contains("Nano optics"));
        assert!(sheet.contains("8123456"));
    }
}
