//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the fixed customer cleaning sequence.

use crate::cleaner::{
    TypeCoercer, lowercase_columns, missing_value_counts, remove_duplicates,
    translate_age_sentinel,
};
use crate::error::{Result, ResultExt};
use crate::imputers::StatisticalImputer;
use crate::pipeline::progress::{
    CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::schema::{CanonicalColumn, SchemaNormalizer};
use crate::types::{CleanedTable, CleaningOutcome, CleaningSummary};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Columns lowercased during case normalization.
const CASE_FOLDED: [CanonicalColumn; 2] = [CanonicalColumn::Gender, CanonicalColumn::Profession];

/// The customer cleaning pipeline.
///
/// Steps run in a fixed order; each consumes the previous step's frame:
///
/// 1. normalize schema
/// 2. remove exact duplicates
/// 3. coerce types
/// 4. lowercase `gender` and `profession`
/// 5. impute `profession` (mode)
/// 6. translate the `age` sentinel `0` to missing
/// 7. impute `age` (mode)
/// 8. remove duplicates introduced by steps 4-7
///
/// Any failure aborts the run; no partially cleaned table is returned.
///
/// # Example
///
/// ```rust,ignore
/// use customer_processing::Pipeline;
///
/// let outcome = Pipeline::builder()
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()
///     .process(dataframe)?;
///
/// println!("{} rows after cleaning", outcome.table.height());
/// ```
pub struct Pipeline {
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    normalizer: SchemaNormalizer,
    type_coercer: TypeCoercer,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Default for Pipeline {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Clean a raw table, returning only the cleaned table.
    pub fn clean(&self, df: DataFrame) -> Result<CleanedTable> {
        self.process(df).map(|outcome| outcome.table)
    }

    /// Clean a raw table, returning the cleaned table and a run summary.
    pub fn process(&self, df: DataFrame) -> Result<CleaningOutcome> {
        match self.process_internal(df) {
            Ok(outcome) => {
                self.report_progress(ProgressUpdate::complete("Cleaning completed successfully"));
                Ok(outcome)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, df: DataFrame) -> Result<CleaningOutcome> {
        let start_time = Instant::now();
        let mut summary = CleaningSummary {
            rows_before: df.height(),
            ..Default::default()
        };

        info!("Starting cleaning pipeline on {} rows...", df.height());

        // Step 1: Schema normalization
        info!("Step 1: Normalizing schema...");
        self.report_progress(ProgressUpdate::new(
            CleaningStage::SchemaNormalization,
            0.0,
            "Mapping headers to canonical columns",
        ));
        let df = self.normalizer.normalize(df)?;
        summary
            .processing_steps
            .push(format!("Normalized {} canonical columns", df.width()));

        // Step 2: Deduplication on normalized raw values
        info!("Step 2: Removing duplicate rows...");
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Deduplication,
            0.0,
            "Removing exact duplicate rows",
        ));
        let (df, removed) = remove_duplicates(df).context("Deduplication failed")?;
        summary.duplicates_removed = removed;
        summary.rows_after_dedup = df.height();
        summary.processing_steps.push(format!(
            "Removed {} duplicate rows ({} remain)",
            removed,
            df.height()
        ));

        // Step 3: Type coercion
        info!("Step 3: Coercing column types...");
        self.report_progress(ProgressUpdate::new(
            CleaningStage::TypeCoercion,
            0.0,
            "Coercing columns to declared types",
        ));
        let (df, coercion_steps) = self.type_coercer.coerce_column_types(df)?;
        summary.processing_steps.extend(coercion_steps);

        // Step 4: Case normalization
        info!("Step 4: Lowercasing gender and profession...");
        self.report_progress(ProgressUpdate::new(
            CleaningStage::CaseNormalization,
            0.0,
            "Lowercasing categorical values",
        ));
        let mut df = lowercase_columns(df, &CASE_FOLDED)?;
        summary
            .processing_steps
            .push("Lowercased 'gender' and 'profession'".to_string());

        summary.missing_before_imputation = missing_value_counts(&df);
        for count in summary.missing_before_imputation.iter().filter(|c| c.missing > 0) {
            debug!("  '{}' has {} missing values", count.column, count.missing);
        }

        // Step 5: Profession imputation
        info!("Step 5: Imputing profession...");
        self.report_progress(ProgressUpdate::with_items(
            CleaningStage::Imputation,
            "Column: profession",
            0,
            3,
            "Filling missing professions with the mode",
        ));
        let record = StatisticalImputer::apply_mode_imputation(&mut df, CanonicalColumn::Profession)?;
        summary.processing_steps.push(format!(
            "Filled {} missing values in 'profession' with mode '{}'",
            record.filled, record.fill_value
        ));
        summary.imputations.push(record);

        // Step 6: Age sentinel translation
        info!("Step 6: Translating age sentinel values...");
        self.report_progress(ProgressUpdate::with_items(
            CleaningStage::Imputation,
            "Age sentinel",
            1,
            3,
            "Treating age 0 as missing",
        ));
        let (mut df, sentinels) = translate_age_sentinel(df)?;
        summary.age_sentinels_replaced = sentinels;
        summary
            .processing_steps
            .push(format!("Marked {} zero ages as missing", sentinels));

        // Step 7: Age imputation
        info!("Step 7: Imputing age...");
        self.report_progress(ProgressUpdate::with_items(
            CleaningStage::Imputation,
            "Column: age",
            2,
            3,
            "Filling missing ages with the mode",
        ));
        let record = StatisticalImputer::apply_mode_imputation(&mut df, CanonicalColumn::Age)?;
        summary.processing_steps.push(format!(
            "Filled {} missing values in 'age' with mode '{}'",
            record.filled, record.fill_value
        ));
        summary.imputations.push(record);

        // Step 8: Case folding and imputation can make rows identical
        info!("Step 8: Finalizing cleaned table...");
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Finalizing,
            0.0,
            "Removing duplicates introduced by cleaning",
        ));
        let (df, late_removed) = remove_duplicates(df).context("Final deduplication failed")?;
        summary.late_duplicates_removed = late_removed;
        if late_removed > 0 {
            summary.processing_steps.push(format!(
                "Removed {} rows that became duplicates during cleaning",
                late_removed
            ));
        }

        let table = CleanedTable::new(df);
        summary.rows_after = table.height();
        summary.column_types = table.column_types();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Cleaning complete: {} -> {} rows in {}ms",
            summary.rows_before, summary.rows_after, summary.duration_ms
        );

        Ok(CleaningOutcome { table, summary })
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set a progress reporter for receiving updates during processing.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use customer_processing::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct MyReporter;
    ///
    /// impl ProgressReporter for MyReporter {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         println!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(MyReporter))
    ///     .build();
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Pipeline {
        Pipeline {
            progress_reporter: self.progress_reporter,
            normalizer: SchemaNormalizer,
            type_coercer: TypeCoercer,
        }
    }
}

/// Clean a raw customer table with a default pipeline.
pub fn clean(df: DataFrame) -> Result<CleanedTable> {
    Pipeline::default().clean(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raw_customers() -> DataFrame {
        df![
            "CustomerID" => [1i64, 2, 3, 3, 4, 5],
            "Gender" => ["Male", "Female", "FEMALE", "FEMALE", "Male", "Female"],
            "Age" => [19i64, 0, 27, 27, 27, 35],
            "Annual Income ($)" => [15000i64, 35000, 86000, 86000, 59000, 38000],
            "Spending Score (1-100)" => [39i64, 81, 6, 6, 77, 40],
            "Profession" => [Some("Healthcare"), Some("Engineer"), None, None, Some("Lawyer"), Some("engineer")],
            "Work Experience" => [1i64, 3, 1, 1, 0, 2],
            "Family Size" => [4i64, 3, 1, 1, 2, 6],
        ]
        .unwrap()
    }

    #[test]
    fn test_pipeline_builder_with_progress_callback() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |_update| {
                call_count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        pipeline.report_progress(ProgressUpdate::new(CleaningStage::Deduplication, 0.5, "Test"));

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_process_reports_every_stage() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        Pipeline::builder()
            .on_progress(move |update| {
                stages_clone.lock().unwrap().push(update.stage);
            })
            .build()
            .process(raw_customers())
            .unwrap();

        let stages = stages.lock().unwrap();
        assert_eq!(stages.first(), Some(&CleaningStage::SchemaNormalization));
        assert_eq!(stages.last(), Some(&CleaningStage::Complete));
        assert!(stages.contains(&CleaningStage::Imputation));
    }

    #[test]
    fn test_process_summary() {
        let outcome = Pipeline::default().process(raw_customers()).unwrap();
        let summary = &outcome.summary;

        assert_eq!(summary.rows_before, 6);
        assert_eq!(summary.duplicates_removed, 1);
        assert_eq!(summary.rows_after_dedup, 5);
        assert_eq!(summary.age_sentinels_replaced, 1);
        assert_eq!(summary.imputations.len(), 2);
        assert_eq!(summary.imputations[0].column, CanonicalColumn::Profession);
        assert_eq!(summary.imputations[0].fill_value, "engineer");
        assert_eq!(summary.imputations[1].column, CanonicalColumn::Age);
        assert_eq!(summary.imputations[1].fill_value, "27");
        assert_eq!(summary.column_types.len(), 8);

        let profession_missing = summary
            .missing_before_imputation
            .iter()
            .find(|c| c.column == "profession")
            .unwrap();
        assert_eq!(profession_missing.missing, 1);
    }

    #[test]
    fn test_clean_fills_age_sentinel_with_mode() {
        let table = clean(raw_customers()).unwrap();
        let records = table.records().unwrap();

        let customer_2 = records.iter().find(|r| r.customer_id == "2").unwrap();
        assert_eq!(customer_2.age, 27.0);
        assert!(records.iter().all(|r| r.age != 0.0));
    }

    #[test]
    fn test_clean_lowercases_categoricals() {
        let table = clean(raw_customers()).unwrap();

        for record in table.records().unwrap() {
            assert_eq!(record.profession, record.profession.to_lowercase());
            if let Some(gender) = &record.gender {
                assert_eq!(gender, &gender.to_lowercase());
            }
        }
    }

    #[test]
    fn test_clean_is_idempotent() {
        let once = clean(raw_customers()).unwrap();
        let twice = clean(once.df().clone()).unwrap();
        assert!(once == twice);
    }

    #[test]
    fn test_late_duplicates_are_removed() {
        let df = df![
            "customer_id" => ["7", "7"],
            "gender" => ["Male", "male"],
            "age" => [30.0, 30.0],
            "annual_income" => [1000.0, 1000.0],
            "spending_score" => [50.0, 50.0],
            "profession" => ["artist", "artist"],
            "work_experience" => [1.0, 1.0],
            "family_size" => [2i64, 2],
        ]
        .unwrap();

        let outcome = Pipeline::default().process(df).unwrap();
        assert_eq!(outcome.summary.duplicates_removed, 0);
        assert_eq!(outcome.summary.late_duplicates_removed, 1);
        assert_eq!(outcome.table.height(), 1);
    }

    #[test]
    fn test_schema_error_reports_failed_stage() {
        let failed = Arc::new(AtomicUsize::new(0));
        let failed_clone = failed.clone();

        let df = raw_customers().drop("Age").unwrap();
        let result = Pipeline::builder()
            .on_progress(move |update| {
                if update.stage == CleaningStage::Failed {
                    failed_clone.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
            .process(df);

        assert!(matches!(result, Err(PipelineError::Schema { .. })));
        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_all_zero_ages_is_empty_column_error() {
        let mut df = raw_customers();
        df.replace("Age", Series::new("Age".into(), &[0i64, 0, 0, 0, 0, 0]))
            .unwrap();

        let err = clean(df).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyColumn(ref c) if c == "age"));
    }
}
