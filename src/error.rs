use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error type covering the failures that abort a whole pipeline run.
///
/// Row-level problems (missing or unparseable cells) are not represented
/// here; they are reported through [`crate::coerce::RowRejection`] and only
/// exclude the affected rows.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when reading or writing CSV fails.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a sheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a sheet does not carry the expected number of columns.
    #[error("sheet '{sheet}' has {found} columns, expected {expected}")]
    SchemaMismatch {
        sheet: String,
        expected: usize,
        found: usize,
    },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the CSV splitter is asked for empty chunks.
    #[error("chunk size must be at least 1")]
    InvalidChunkSize,

    /// Raised when the configured VAT rate is outside `[0, 1)`.
    #[error("VAT rate must be a finite value in [0, 1), got {0}")]
    InvalidVatRate(f64),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl PipelineError {
    /// Stable, machine-readable identifier of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Io(_) => "io",
            PipelineError::Json(_) => "json",
            PipelineError::Csv(_) => "csv",
            PipelineError::ExcelWrite(_) => "excel_write",
            PipelineError::ExcelRead(_) => "excel_read",
            PipelineError::InvalidWorkbook(_) => "invalid_workbook",
            PipelineError::SchemaMismatch { .. } => "schema_mismatch",
            PipelineError::MissingInput(_) => "missing_input",
            PipelineError::InvalidChunkSize => "invalid_chunk_size",
            PipelineError::InvalidVatRate(_) => "invalid_vat_rate",
            PipelineError::Logging(_) => "logging",
        }
    }
}
