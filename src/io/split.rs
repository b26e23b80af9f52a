//! Splits a CSV file into numbered chunk files of bounded row count.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::error::{PipelineError, Result};

/// Rows per chunk used by the command line when none is given.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Writes `dataset_part_{n}.csv` files (n from 1) into `output_dir`, each
/// holding the input header and at most `chunk_size` data rows. The output
/// directory is created when missing. Returns the written paths in order.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output_dir = %output_dir.display(), chunk_size = chunk_size)
)]
pub fn split_csv(input: &Path, output_dir: &Path, chunk_size: usize) -> Result<Vec<PathBuf>> {
    if chunk_size == 0 {
        return Err(PipelineError::InvalidChunkSize);
    }
    if !input.exists() {
        return Err(PipelineError::MissingInput(input.to_path_buf()));
    }
    fs::create_dir_all(output_dir)?;

    let mut reader = csv::Reader::from_path(input)?;
    let headers = reader.headers()?.clone();

    let mut written = Vec::new();
    let mut writer: Option<csv::Writer<fs::File>> = None;
    let mut rows_in_chunk = 0usize;

    for record in reader.records() {
        let record = record?;
        if writer.is_none() || rows_in_chunk == chunk_size {
            if let Some(mut full) = writer.take() {
                full.flush()?;
                info!(rows = rows_in_chunk, path = %written_last(&written), "saved chunk");
            }
            let path = output_dir.join(format!("dataset_part_{}.csv", written.len() + 1));
            let mut next = csv::Writer::from_path(&path)?;
            next.write_record(&headers)?;
            written.push(path);
            writer = Some(next);
            rows_in_chunk = 0;
        }
        if let Some(active) = writer.as_mut() {
            active.write_record(&record)?;
        }
        rows_in_chunk += 1;
    }

    if let Some(mut last) = writer.take() {
        last.flush()?;
        info!(rows = rows_in_chunk, path = %written_last(&written), "saved chunk");
    }

    info!(chunks = written.len(), "split complete");
    Ok(written)
}

fn written_last(written: &[PathBuf]) -> String {
    written
        .last()
        .map(|path| path.display().to_string())
        .unwrap_or_default()
}
