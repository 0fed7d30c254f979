//! CLI entry point for the customer cleaning and analysis pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use customer_processing::cleaner::remove_duplicates;
use customer_processing::{
    AnalysisConfig, AnalysisReport, AnalyticalStore, CleaningSummary, Pipeline, QuerySetReport,
    ReportGenerator, SchemaNormalizer, missing_value_counts, run_all,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Customer dataset cleaning and analysis",
    long_about = "Cleans a raw customer CSV into a fixed canonical schema and runs the four \
                  analytical queries over the result.\n\n\
                  EXAMPLES:\n  \
                  # Clean, query and export to ./output\n  \
                  customer-processing -i customers.csv\n\n  \
                  # Preview the header mapping and data problems\n  \
                  customer-processing -i customers.csv --dry-run\n\n  \
                  # Print everything as JSON without writing files\n  \
                  customer-processing -i customers.csv --json --no-save"
)]
struct Args {
    /// Path to the CSV file to process
    #[arg(short, long)]
    input: String,

    /// Output directory for the cleaned table and query results
    #[arg(short, long, default_value = "./output")]
    output: String,

    /// Base name for exported files (without extension)
    ///
    /// If not specified, uses "customers"
    #[arg(long)]
    output_name: Option<String>,

    /// Preview the header mapping, missing values and duplicates without cleaning
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only the final report is written to stdout.
    #[arg(long)]
    json: bool,

    /// Do not write the cleaned table or report to disk
    #[arg(long)]
    no_save: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let mut config_builder = AnalysisConfig::builder()
        .output_dir(&args.output)
        .save_to_disk(!args.no_save && !args.dry_run);

    if let Some(ref name) = args.output_name {
        config_builder = config_builder.output_name(name);
    }

    let config = config_builder.build()?;

    info!("Loading dataset from: {}", args.input);
    let data = load_csv(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    if args.dry_run {
        return run_dry_run(&args, &data);
    }

    let pipeline = build_pipeline(&args);
    run_pipeline(&pipeline, &args, &config, data)
}

fn build_pipeline(args: &Args) -> Pipeline {
    let mut builder = Pipeline::builder();

    if !args.quiet {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    builder.build()
}

/// Clean, load the store, run the queries and hand the results to the output side.
fn run_pipeline(
    pipeline: &Pipeline,
    args: &Args,
    config: &AnalysisConfig,
    data: DataFrame,
) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting customer cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let original_shape = data.shape();
    let outcome = pipeline.process(data).map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed [{}]: {}", e.error_code(), e)
    })?;

    let store = AnalyticalStore::load(&outcome.table).context("Failed to load analytical store")?;
    let queries = run_all(&store).context("Failed to run analytical queries")?;
    drop(store);

    let generator = ReportGenerator::from_config(config);
    let mut cleaned_table_file: Option<PathBuf> = None;

    if config.save_to_disk && config.export_cleaned_table {
        cleaned_table_file = Some(generator.write_cleaned_table(&outcome.table)?);
    }

    let report = ReportGenerator::build_report(
        &args.input,
        cleaned_table_file.as_deref(),
        &outcome.summary,
        &queries,
    );

    if config.save_to_disk {
        let report_path = generator.write_report(&report)?;
        debug!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report, original_shape, config);
    Ok(())
}

/// Preview what the pipeline would do without cleaning anything.
///
/// Uses `println!` for user-facing output, independent of the log level.
fn run_dry_run(args: &Args, data: &DataFrame) -> Result<()> {
    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of cleaning");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input);
    println!("  Rows: {}", data.height());
    println!("  Columns: {}", data.width());
    println!();

    println!("HEADER MAPPING");
    println!("{}", "-".repeat(40));
    println!("{:<30} {:<20} {:<10}", "Raw header", "Canonical", "Type");
    println!("{}", "-".repeat(62));

    let mappings = SchemaNormalizer.map_headers(data);
    for mapping in &mappings {
        match mapping.canonical {
            Some(col) => println!(
                "{:<30} {:<20} {:<10}",
                truncate_str(&mapping.raw, 29),
                col.name(),
                format!("{:?}", col.column_type())
            ),
            None => println!(
                "{:<30} {:<20} {:<10}",
                truncate_str(&mapping.raw, 29),
                format!("({})", mapping.normalized),
                "dropped"
            ),
        }
    }
    println!();

    if let Err(e) = SchemaNormalizer.normalize(data.clone()) {
        println!("  ERROR: {}", e);
        println!("  The pipeline would stop here.");
        println!();
    }

    println!("MISSING VALUES");
    println!("{}", "-".repeat(40));
    let missing: Vec<_> = missing_value_counts(data)
        .into_iter()
        .filter(|m| m.missing > 0)
        .collect();
    if missing.is_empty() {
        println!("  No missing values found");
    } else {
        for m in &missing {
            println!("  {:<30} {}", truncate_str(&m.column, 29), m.missing);
        }
    }
    println!();

    println!("DUPLICATES");
    println!("{}", "-".repeat(40));
    let (_, duplicate_count) = remove_duplicates(data.clone())?;
    if duplicate_count > 0 {
        println!("  Will remove {} duplicate rows", duplicate_count);
    } else {
        println!("  No duplicate rows found");
    }
    println!();

    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    if args.no_save {
        println!("  None (--no-save)");
    } else {
        let generator =
            ReportGenerator::new(PathBuf::from(&args.output), args.output_name.clone());
        println!("  - {}", generator.cleaned_table_path().display());
        println!("  - {}", generator.report_path().display());
    }
    println!();

    println!("{}", "=".repeat(80));
    println!("To execute the pipeline, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Print a human-readable summary of the cleaning and query results.
fn print_human_readable_summary(
    report: &AnalysisReport,
    original_shape: (usize, usize),
    config: &AnalysisConfig,
) {
    let summary = &report.cleaning;

    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, original_shape.0, original_shape.1
    );
    if let Some(ref output_file) = report.cleaned_table_file {
        println!("Output: {} ({} rows)", output_file, summary.rows_after);
    }
    println!();

    print_cleaning_summary(summary);
    print_query_results(&report.queries);

    if config.save_to_disk {
        println!("Report: {}", ReportGenerator::from_config(config).report_path().display());
    }
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

fn print_cleaning_summary(summary: &CleaningSummary) {
    println!("Cleaning Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} removed)",
        summary.rows_before,
        summary.rows_after,
        summary.total_rows_removed()
    );
    println!(
        "  Duplicates: {} removed, {} more after normalization",
        summary.duplicates_removed, summary.late_duplicates_removed
    );
    println!("  Age sentinels replaced: {}", summary.age_sentinels_replaced);
    println!("  Values imputed: {}", summary.total_values_imputed());

    for imputation in &summary.imputations {
        println!(
            "  - Filled {} missing '{}' values with {} '{}'",
            imputation.filled, imputation.column, imputation.strategy, imputation.fill_value
        );
    }
    println!();
}

fn print_query_results(queries: &QuerySetReport) {
    println!("Query Results:");

    let q1 = &queries.single_parent_high_income;
    println!(
        "  Q1 Single-person female households earning > 15000: {} ({}%)",
        q1.count, q1.percentage
    );

    let q2 = &queries.lawyers_above_engineer_baseline;
    match q2.engineer_baseline {
        Some(baseline) => println!(
            "  Q2 Lawyers above male-engineer experience ({:.2}): {}",
            baseline, q2.count
        ),
        None => println!("  Q2 Lawyers above male-engineer experience (no engineers): 0"),
    }

    println!("  Q3 Lawyer spending bands:");
    if queries.lawyer_spending_bands.is_empty() {
        println!("      (no lawyers with a spending score)");
    }
    for row in &queries.lawyer_spending_bands {
        println!(
            "      {:<10} {:<8} {}",
            row.gender.as_deref().unwrap_or("(missing)"),
            row.band,
            row.count
        );
    }

    println!("  Q4 Average spending score by profession:");
    for avg in &queries.profession_spending.averages {
        match avg.avg_spending_score {
            Some(score) => println!("      {:<20} {:.2}", truncate_str(&avg.profession, 19), score),
            None => println!("      {:<20} -", truncate_str(&avg.profession, 19)),
        }
    }
    println!();
}

/// Load the raw CSV. Blank fields are read as missing.
fn load_csv(path: &str) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .with_context(|| format!("Failed to read CSV: {}", path))
}
