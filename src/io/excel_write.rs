use std::path::Path;

use rust_xlsxwriter::{Table, TableColumn, Workbook};

use crate::error::Result;
use crate::model::AggregateTable;

/// Sheet name of the aggregate report workbook.
pub const AGGREGATE_SHEET: &str = "aggregate";

/// Writes the aggregate table to a single-sheet workbook laid out as an
/// Excel table with autofilter. Undefined means are left blank.
pub fn write_aggregate_report(path: &Path, table: &AggregateTable) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(AGGREGATE_SHEET)?;

    let columns = table.columns();
    for (col_idx, header) in columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, *header)?;
    }

    for (row_idx, bucket) in table.buckets.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        worksheet.write_number(row, 0, bucket.route_id as f64)?;
        if let Some(slot) = &bucket.time_slot {
            worksheet.write_string(row, 1, slot)?;
        }
        if let Some(age) = &bucket.age_group {
            worksheet.write_string(row, 2, age)?;
        }
        worksheet.write_number(row, 3, bucket.total_revenue)?;
        worksheet.write_number(row, 4, bucket.total_yield)?;
        worksheet.write_number(row, 5, bucket.total_trips as f64)?;
        worksheet.write_number(row, 6, bucket.avg_yield_per_trip)?;
        if table.includes_operations {
            if let Some(value) = bucket.avg_yield_per_km {
                worksheet.write_number(row, 7, value)?;
            }
            if let Some(value) = bucket.avg_yield_per_vehicle {
                worksheet.write_number(row, 8, value)?;
            }
        }
    }

    let table_columns: Vec<TableColumn> = columns
        .iter()
        .map(|header| TableColumn::new().set_header(*header))
        .collect();
    let mut excel_table = Table::new();
    excel_table
        .set_columns(&table_columns)
        .set_autofilter(true);
    let col_end = (columns.len() as u16).saturating_sub(1);
    // A table needs at least one data row, even when it stays empty.
    let row_end = table.buckets.len().max(1) as u32;
    worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;

    workbook.save(path)?;
    Ok(())
}
