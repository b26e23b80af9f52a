use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::model::RawCell;
use crate::schema::RawSheet;

/// Reads the named sheets from an `.xlsx` workbook, in the order requested.
///
/// The first non-empty row of each sheet is taken as the header row. Cell
/// positions stay absolute: when the used range does not start in column A
/// the leading columns are filled with [`RawCell::Empty`].
pub fn read_sheets(path: &Path, names: &[&str]) -> Result<Vec<RawSheet>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }

    let mut workbook: Xlsx<_> = open_workbook(path)?;
    names
        .iter()
        .map(|name| {
            let range = read_required_sheet(&mut workbook, name)?;
            Ok(range_to_sheet(name, &range))
        })
        .collect()
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| PipelineError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(PipelineError::from)?;
    Ok(range)
}

fn range_to_sheet(name: &str, range: &Range<DataType>) -> RawSheet {
    let (start_row, start_col) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or_default();

    let mut rows = range.rows().map(|row| {
        let mut cells = vec![RawCell::Empty; start_col];
        cells.extend(row.iter().map(to_raw_cell));
        cells
    });

    let headers = rows
        .next()
        .map(|cells| cells.iter().map(header_text).collect())
        .unwrap_or_default();

    // Sheet rows are 1-based and the header occupies the first used row.
    let rows: Vec<(usize, Vec<RawCell>)> = rows
        .enumerate()
        .map(|(offset, cells)| (start_row + offset + 2, cells))
        .collect();

    debug!(sheet = name, rows = rows.len(), "read worksheet");
    RawSheet {
        name: name.to_string(),
        headers,
        rows,
    }
}

fn to_raw_cell(cell: &DataType) -> RawCell {
    match cell {
        DataType::String(value) => RawCell::Text(value.clone()),
        DataType::Float(value) => RawCell::Number(*value),
        DataType::Int(value) => RawCell::Number(*value as f64),
        DataType::Bool(value) => RawCell::Bool(*value),
        DataType::DateTime(value) => RawCell::DateTime(*value),
        DataType::Error(error) => RawCell::Error(error.to_string()),
        DataType::Empty => RawCell::Empty,
        other => RawCell::Text(other.to_string()),
    }
}

fn header_text(cell: &RawCell) -> String {
    match cell {
        RawCell::Text(value) => value.clone(),
        RawCell::Number(value) => value.to_string(),
        RawCell::Bool(value) => value.to_string(),
        RawCell::DateTime(value) => value.to_string(),
        RawCell::Error(code) => code.clone(),
        RawCell::Empty => String::new(),
    }
}
