//! Integration tests for the customer cleaning pipeline and query layer.
//!
//! These tests drive the public API end to end against CSV fixtures.

use customer_processing::{
    AnalysisConfig, AnalyticalStore, CleaningStage, Pipeline, PipelineError, ProgressUpdate,
    ReportGenerator, SpendingBand, clean, run_all,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    let path = fixtures_path().join(filename);
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "customer-processing-it-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

// ============================================================================
// Cleaning
// ============================================================================

#[test]
fn test_clean_sample_produces_canonical_schema() {
    let table = clean(load_csv("customers_sample.csv")).unwrap();

    let names: Vec<String> = table
        .df()
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "customer_id",
            "gender",
            "age",
            "annual_income",
            "spending_score",
            "profession",
            "work_experience",
            "family_size",
        ]
    );
    assert_eq!(table.height(), 12);
}

#[test]
fn test_clean_sample_summary() {
    let outcome = Pipeline::default()
        .process(load_csv("customers_sample.csv"))
        .unwrap();
    let summary = &outcome.summary;

    assert_eq!(summary.rows_before, 13);
    assert_eq!(summary.duplicates_removed, 1);
    assert_eq!(summary.rows_after_dedup, 12);
    assert_eq!(summary.late_duplicates_removed, 0);
    assert_eq!(summary.rows_after, 12);
    assert_eq!(summary.age_sentinels_replaced, 1);

    let fills: Vec<(String, String, usize)> = summary
        .imputations
        .iter()
        .map(|i| (i.column.to_string(), i.fill_value.clone(), i.filled))
        .collect();
    assert_eq!(
        fills,
        vec![
            ("profession".to_string(), "lawyer".to_string(), 1),
            ("age".to_string(), "27".to_string(), 1),
        ]
    );
}

#[test]
fn test_clean_sample_records() {
    let table = clean(load_csv("customers_sample.csv")).unwrap();
    let records = table.records().unwrap();

    // Customer 8 had age 0 and no profession
    let imputed = records.iter().find(|r| r.customer_id == "8").unwrap();
    assert_eq!(imputed.age, 27.0);
    assert_eq!(imputed.profession, "lawyer");

    let shouting = records.iter().find(|r| r.customer_id == "12").unwrap();
    assert_eq!(shouting.gender.as_deref(), Some("female"));
    assert_eq!(shouting.profession, "lawyer");

    assert!(records.iter().all(|r| r.age != 0.0));
}

#[test]
fn test_clean_is_idempotent() {
    let once = clean(load_csv("customers_sample.csv")).unwrap();
    let twice = clean(once.df().clone()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_missing_column_is_schema_error() {
    let err = clean(load_csv("customers_missing_column.csv")).unwrap_err();

    assert!(err.is_schema_error());
    match err {
        PipelineError::Schema { missing } => assert_eq!(missing, vec!["spending_score"]),
        other => panic!("Expected schema error, got {:?}", other),
    }
}

#[test]
fn test_non_numeric_age_is_data_type_error() {
    let err = clean(load_csv("customers_bad_age.csv")).unwrap_err();

    assert!(err.is_data_error());
    match err {
        PipelineError::DataType {
            column, row, value, ..
        } => {
            assert_eq!(column, "age");
            assert_eq!(row, 1);
            assert_eq!(value, "unknown");
        }
        other => panic!("Expected data type error, got {:?}", other),
    }
}

fn raw_with_ages(ages: [&str; 2]) -> DataFrame {
    df![
        "CustomerID" => ["1", "2"],
        "Gender" => ["Male", "Female"],
        "Age" => ages,
        "Annual Income ($)" => ["15000", "35000"],
        "Spending Score (1-100)" => ["39", "81"],
        "Profession" => ["Healthcare", "Engineer"],
        "Work Experience" => ["1", "3"],
        "Family Size" => ["4", "3"],
    ]
    .unwrap()
}

#[test]
fn test_formatted_ages_are_not_silently_coerced() {
    for ages in [["2,7", "1 9"], ["25%", "$30"]] {
        let err = clean(raw_with_ages(ages)).unwrap_err();
        match err {
            PipelineError::DataType { column, row, .. } => {
                assert_eq!(column, "age");
                assert_eq!(row, 0);
            }
            other => panic!("Expected data type error for {:?}, got {:?}", ages, other),
        }
    }
}

#[test]
fn test_grouped_thousands_income_is_accepted() {
    let mut raw = raw_with_ages(["19", "21"]);
    raw.replace(
        "Annual Income ($)",
        Series::new("Annual Income ($)".into(), &["15,000", "1,035,000"]),
    )
    .unwrap();

    let records = clean(raw).unwrap().records().unwrap();
    assert_eq!(records[1].annual_income, Some(1_035_000.0));
}

#[test]
fn test_progress_reporting_order() {
    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);

    Pipeline::builder()
        .on_progress(move |update| sink.lock().unwrap().push(update))
        .build()
        .process(load_csv("customers_sample.csv"))
        .unwrap();

    let updates = updates.lock().unwrap();
    let mut stages: Vec<CleaningStage> = updates.iter().map(|u| u.stage).collect();
    stages.dedup();
    assert_eq!(
        stages,
        vec![
            CleaningStage::SchemaNormalization,
            CleaningStage::Deduplication,
            CleaningStage::TypeCoercion,
            CleaningStage::CaseNormalization,
            CleaningStage::Imputation,
            CleaningStage::Finalizing,
            CleaningStage::Complete,
        ]
    );

    let progress: Vec<f32> = updates.iter().map(|u| u.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_queries_on_sample() {
    let table = clean(load_csv("customers_sample.csv")).unwrap();
    let store = AnalyticalStore::load(&table).unwrap();
    assert_eq!(store.row_count(), 12);

    let report = run_all(&store).unwrap();

    // Customers 3, 8, 10 and 12
    assert_eq!(report.single_parent_high_income.count, 4);
    assert_eq!(report.single_parent_high_income.percentage, 33);

    // Male engineers average (3 + 8) / 2; only customer 12 exceeds it
    let q2 = report.lawyers_above_engineer_baseline;
    assert_eq!(q2.engineer_baseline, Some(5.5));
    assert_eq!(q2.count, 1);

    let bands: Vec<(Option<String>, SpendingBand, i64)> = report
        .lawyer_spending_bands
        .iter()
        .map(|r| (r.gender.clone(), r.band, r.count))
        .collect();
    assert_eq!(
        bands,
        vec![
            (Some("female".to_string()), SpendingBand::UpTo20, 1),
            (Some("female".to_string()), SpendingBand::UpTo80, 2),
            (Some("female".to_string()), SpendingBand::UpTo100, 1),
            (Some("male".to_string()), SpendingBand::UpTo20, 1),
        ]
    );

    let averages: Vec<(String, Option<f64>)> = report
        .profession_spending
        .averages
        .iter()
        .map(|a| (a.profession.clone(), a.avg_spending_score))
        .collect();
    assert_eq!(
        averages,
        vec![
            ("artist".to_string(), Some(76.0)),
            ("lawyer".to_string(), Some(51.2)),
            ("engineer".to_string(), Some(47.33)),
            ("entertainment".to_string(), Some(40.0)),
            ("healthcare".to_string(), Some(22.5)),
        ]
    );
    assert_eq!(report.profession_spending.scores.len(), 12);
    assert_eq!(report.profession_spending.scores[0].profession, "healthcare");
    assert_eq!(report.profession_spending.scores[0].spending_score, 39.0);
}

#[test]
fn test_queries_are_repeatable() {
    let table = clean(load_csv("customers_sample.csv")).unwrap();
    let store = AnalyticalStore::load(&table).unwrap();

    assert_eq!(run_all(&store).unwrap(), run_all(&store).unwrap());
}

// ============================================================================
// Reporting
// ============================================================================

#[test]
fn test_export_round_trip_through_csv() {
    let dir = scratch_dir("export");
    let config = AnalysisConfig::builder()
        .output_dir(&dir)
        .output_name("sample")
        .build()
        .unwrap();

    let outcome = Pipeline::default()
        .process(load_csv("customers_sample.csv"))
        .unwrap();
    let generator = ReportGenerator::from_config(&config);
    let path = generator.write_cleaned_table(&outcome.table).unwrap();
    assert_eq!(path, dir.join("sample_cleaned.csv"));

    // Re-reading the export and cleaning it again yields the same answers
    let reread = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path))
        .unwrap()
        .finish()
        .unwrap();
    let again = clean(reread).unwrap();
    assert_eq!(again.height(), outcome.table.height());

    let first = run_all(&AnalyticalStore::load(&outcome.table).unwrap()).unwrap();
    let second = run_all(&AnalyticalStore::load(&again).unwrap()).unwrap();
    assert_eq!(first, second);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_report_json_shape() {
    let outcome = Pipeline::default()
        .process(load_csv("customers_sample.csv"))
        .unwrap();
    let queries = run_all(&AnalyticalStore::load(&outcome.table).unwrap()).unwrap();
    let report =
        ReportGenerator::build_report("customers_sample.csv", None, &outcome.summary, &queries);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["cleaning"]["rows_after"], 12);
    assert_eq!(json["queries"]["single_parent_high_income"]["count"], 4);
    assert_eq!(json["queries"]["lawyer_spending_bands"][0]["band"], "0-20");
}
