use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use hla_score::input::{self, CurationRecord};
use hla_score::output::{self, CurationReport};
use hla_score::scoring::{self, CurationType, FieldError, PointsTable, ScoringError};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_REJECTED: i32 = 2;
const EXIT_FRAMEWORK: i32 = 3;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score every curation in a file, with a per-evidence breakdown
    Score {
        /// YAML file of curations
        file: PathBuf,
    },
    /// Check curations for field errors and classifications that do not fit their score
    Validate {
        /// YAML file of curations
        file: PathBuf,
    },
    /// Print the framework's points catalogue
    Framework,
}

#[derive(Parser, Debug)]
#[command(name = "hla-score")]
#[command(
    about = "Evidence scoring and classification checks for HLA curations",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Serialize)]
struct ValidationResult {
    curation: String,
    errors: Vec<FieldError>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // A broken table must fail before anything is scored
    let table = match scoring::framework() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Scoring framework error: {}", e);
            std::process::exit(EXIT_FRAMEWORK);
        }
    };

    let result = match &cli.command {
        Commands::Score { file } => run_score(file, table, &cli),
        Commands::Validate { file } => run_validate(file, &cli),
        Commands::Framework => {
            println!("{}", output::format_framework(table, output::should_use_colors()));
            Ok(EXIT_SUCCESS)
        }
    };

    let code = match result {
        Ok(code) => code,
        Err(e) if e.downcast_ref::<ScoringError>().is_some() => {
            eprintln!("Scoring framework error: {:#}", e);
            EXIT_FRAMEWORK
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_INPUT
        }
    };

    std::process::exit(code);
}

/// Log to stderr. RUST_LOG wins; otherwise --verbose shows per-step scoring.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "hla_score=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_records(file: &Path, verbose: bool) -> Result<Vec<CurationRecord>> {
    let document = input::load_document(file)?;
    if verbose {
        eprintln!(
            "Loaded {} curations from {}",
            document.curations.len(),
            file.display()
        );
    }
    Ok(document.curations)
}

/// Heading for a curation that may not have converted cleanly.
fn record_title(record: &CurationRecord) -> String {
    let marker = match record.curation_type {
        CurationType::Allele => record.allele.as_ref().map(|a| a.name.as_str()),
        CurationType::Haplotype => record.haplotype.as_ref().map(|h| h.name.as_str()),
    }
    .unwrap_or("(no marker)");

    match record.id {
        Some(id) => format!("#{} {}", id, marker),
        None => marker.to_string(),
    }
}

fn run_score(file: &Path, table: &PointsTable, cli: &Cli) -> Result<i32> {
    let records = load_records(file, cli.verbose)?;
    let use_colors = output::should_use_colors();

    let mut reports = Vec::new();
    let mut code = EXIT_SUCCESS;

    for record in records {
        let title = record_title(&record);
        match record.into_curation() {
            Ok(curation) => reports.push(CurationReport::build(&curation, table)?),
            Err(errors) => {
                // Unreadable curations are skipped; the rest still get scored
                eprintln!("{}", output::format_field_errors(&title, &errors, false));
                code = EXIT_INPUT;
            }
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        let rendered: Vec<String> = reports
            .iter()
            .map(|r| output::format_curation_report(r, use_colors))
            .collect();
        println!("{}", rendered.join("\n\n"));
    }

    if cli.verbose {
        eprintln!();
        eprintln!("Scored {} curations", reports.len());
    }

    Ok(code)
}

fn run_validate(file: &Path, cli: &Cli) -> Result<i32> {
    let records = load_records(file, cli.verbose)?;
    let use_colors = output::should_use_colors();

    let mut results = Vec::new();
    for record in records {
        let title = record_title(&record);
        let errors = match record.into_curation() {
            Ok(curation) => scoring::validate_curation(&curation)?,
            Err(errors) => errors,
        };
        results.push(ValidationResult {
            curation: title,
            errors,
        });
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            println!(
                "{}",
                output::format_field_errors(&result.curation, &result.errors, use_colors)
            );
        }
    }

    let rejected = results.iter().filter(|r| !r.errors.is_empty()).count();
    if cli.verbose {
        eprintln!();
        eprintln!("{} of {} curations rejected", rejected, results.len());
    }

    Ok(if rejected > 0 { EXIT_REJECTED } else { EXIT_SUCCESS })
}
