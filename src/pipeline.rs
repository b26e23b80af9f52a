use std::path::Path;

use tracing::{debug, info, instrument};

use crate::aggregate::aggregate;
use crate::coerce::{filter_operation_rows, filter_survey_rows};
use crate::error::Result;
use crate::io::{csv_write, excel_read, excel_write};
use crate::join::{OperationIndex, left_join};
use crate::metrics::{VatRate, enrich};
use crate::model::{AggregateTable, EnrichedRecord, OperationalRecord, SurveyRecord};
use crate::schema::{OPERATION_SHEET, OperationField, SURVEY_SHEET, SurveyField, normalize_sheet};

/// Settings of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PipelineConfig {
    pub vat_rate: VatRate,
    /// Join the `operation` sheet and derive per-km and per-vehicle yield.
    pub join_operations: bool,
}

/// Cleaned records of one workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub survey: Vec<SurveyRecord>,
    /// `None` when the operation sheet was not requested.
    pub operations: Option<Vec<OperationalRecord>>,
}

/// Reads, normalizes and filters the survey sheet, plus the operation sheet
/// when `with_operations` is set.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), with_operations = with_operations)
)]
pub fn load_dataset(input: &Path, with_operations: bool) -> Result<Dataset> {
    let names: &[&str] = if with_operations {
        &[SURVEY_SHEET, OPERATION_SHEET]
    } else {
        &[SURVEY_SHEET]
    };
    let mut sheets = excel_read::read_sheets(input, names)?.into_iter();

    let survey = match sheets.next() {
        Some(sheet) => {
            let rows = normalize_sheet::<SurveyField>(sheet)?;
            filter_survey_rows(&rows).records
        }
        None => Vec::new(),
    };

    let operations = match sheets.next() {
        Some(sheet) => {
            let rows = normalize_sheet::<OperationField>(sheet)?;
            Some(filter_operation_rows(&rows).records)
        }
        None => None,
    };

    info!(
        survey_rows = survey.len(),
        operation_rows = operations.as_ref().map(Vec::len),
        "loaded dataset"
    );
    Ok(Dataset { survey, operations })
}

/// Loads only the cleaned survey records.
pub fn load_survey(input: &Path) -> Result<Vec<SurveyRecord>> {
    Ok(load_dataset(input, false)?.survey)
}

/// Loads only the cleaned operational records.
pub fn load_operations(input: &Path) -> Result<Vec<OperationalRecord>> {
    let mut sheets = excel_read::read_sheets(input, &[OPERATION_SHEET])?;
    let rows = match sheets.pop() {
        Some(sheet) => normalize_sheet::<OperationField>(sheet)?,
        None => Vec::new(),
    };
    Ok(filter_operation_rows(&rows).records)
}

/// Joins (when operations are given) and derives metrics for every record.
pub fn enrich_records(
    survey: Vec<SurveyRecord>,
    operations: Option<&[OperationalRecord]>,
    vat: VatRate,
) -> Vec<EnrichedRecord> {
    match operations {
        Some(operations) => {
            let index = OperationIndex::build(operations);
            left_join(survey, &index)
                .into_iter()
                .map(|(record, operational)| enrich(record, operational, vat))
                .collect()
        }
        None => survey
            .into_iter()
            .map(|record| enrich(record, None, vat))
            .collect(),
    }
}

/// Runs the in-memory part of the pipeline on an already loaded dataset.
pub fn process(dataset: Dataset, config: PipelineConfig) -> AggregateTable {
    let operations = if config.join_operations {
        Some(dataset.operations.unwrap_or_default())
    } else {
        None
    };
    let enriched = enrich_records(dataset.survey, operations.as_deref(), config.vat_rate);
    debug!(rows = enriched.len(), "derived metrics");
    aggregate(&enriched, config.join_operations)
}

/// Runs the full pipeline on a workbook and returns the aggregate table.
#[instrument(level = "info", skip_all, fields(input = %input.display(), ?config))]
pub fn run(input: &Path, config: PipelineConfig) -> Result<AggregateTable> {
    let dataset = load_dataset(input, config.join_operations)?;
    let table = process(dataset, config);
    info!(buckets = table.buckets.len(), "aggregation complete");
    Ok(table)
}

/// Runs the pipeline and writes the aggregate CSV.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn export_csv(input: &Path, output: &Path, config: PipelineConfig) -> Result<AggregateTable> {
    let table = run(input, config)?;
    csv_write::write_aggregate_file(output, &table)?;
    info!(rows = table.buckets.len(), "wrote aggregate CSV");
    Ok(table)
}

/// Writes an already computed aggregate table as an `.xlsx` report.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn export_report(table: &AggregateTable, output: &Path) -> Result<()> {
    excel_write::write_aggregate_report(output, table)?;
    debug!(rows = table.buckets.len(), "wrote aggregate report");
    Ok(())
}
