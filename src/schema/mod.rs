//! Positional column normalization for the survey and operation sheets.
//!
//! Header text is never matched: the source workbook uses localized,
//! free-form headers, so a sheet is accepted purely on its column count and
//! each position is mapped to a canonical field.

use std::fmt;

use crate::error::{PipelineError, Result};
use crate::model::RawCell;

/// Sheet name holding the survey responses.
pub const SURVEY_SHEET: &str = "survey";
/// Sheet name holding the per-route operational statistics.
pub const OPERATION_SHEET: &str = "operation";

/// Whether a missing or invalid value excludes the whole row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    Required,
    Optional,
    /// Carried through normalization but not read by any later stage.
    Unused,
}

/// A canonical field of a positional sheet.
pub trait CanonicalField: Copy + fmt::Debug + 'static {
    /// All fields in column order.
    const ALL: &'static [Self];

    /// Canonical snake_case name.
    fn name(self) -> &'static str;

    /// Cleaning policy applied by the row filter.
    fn policy(self) -> FieldPolicy;

    /// Zero-based column position.
    fn index(self) -> usize;
}

/// Columns of the `survey` sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SurveyField {
    Timestamp,
    TimeSlot,
    Station,
    RouteId,
    TicketType,
    UsedLines,
    TripPurpose,
    MainTripPurpose,
    TripCount,
    TripDays,
    Gender,
    AgeGroup,
    PricePaid,
    TicketEn,
}

impl CanonicalField for SurveyField {
    const ALL: &'static [Self] = &[
        SurveyField::Timestamp,
        SurveyField::TimeSlot,
        SurveyField::Station,
        SurveyField::RouteId,
        SurveyField::TicketType,
        SurveyField::UsedLines,
        SurveyField::TripPurpose,
        SurveyField::MainTripPurpose,
        SurveyField::TripCount,
        SurveyField::TripDays,
        SurveyField::Gender,
        SurveyField::AgeGroup,
        SurveyField::PricePaid,
        SurveyField::TicketEn,
    ];

    fn name(self) -> &'static str {
        match self {
            SurveyField::Timestamp => "timestamp",
            SurveyField::TimeSlot => "time_slot",
            SurveyField::Station => "station",
            SurveyField::RouteId => "route_id",
            SurveyField::TicketType => "ticket_type",
            SurveyField::UsedLines => "used_lines",
            SurveyField::TripPurpose => "trip_purpose",
            SurveyField::MainTripPurpose => "main_trip_purpose",
            SurveyField::TripCount => "trip_count",
            SurveyField::TripDays => "trip_days",
            SurveyField::Gender => "gender",
            SurveyField::AgeGroup => "age_group",
            SurveyField::PricePaid => "price_paid",
            SurveyField::TicketEn => "ticket_en",
        }
    }

    fn policy(self) -> FieldPolicy {
        match self {
            SurveyField::RouteId | SurveyField::PricePaid | SurveyField::TripCount => {
                FieldPolicy::Required
            }
            SurveyField::Timestamp
            | SurveyField::TimeSlot
            | SurveyField::TicketType
            | SurveyField::TripPurpose
            | SurveyField::Gender
            | SurveyField::AgeGroup => FieldPolicy::Optional,
            SurveyField::Station
            | SurveyField::UsedLines
            | SurveyField::MainTripPurpose
            | SurveyField::TripDays
            | SurveyField::TicketEn => FieldPolicy::Unused,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Columns of the `operation` sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationField {
    RouteId,
    KilometersOperated,
    VehicleCount,
}

impl CanonicalField for OperationField {
    const ALL: &'static [Self] = &[
        OperationField::RouteId,
        OperationField::KilometersOperated,
        OperationField::VehicleCount,
    ];

    fn name(self) -> &'static str {
        match self {
            OperationField::RouteId => "route_id",
            OperationField::KilometersOperated => "kilometers_operated",
            OperationField::VehicleCount => "vehicle_count",
        }
    }

    fn policy(self) -> FieldPolicy {
        match self {
            OperationField::RouteId => FieldPolicy::Required,
            OperationField::KilometersOperated | OperationField::VehicleCount => {
                FieldPolicy::Optional
            }
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A sheet as read from the workbook: header row plus positional data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub headers: Vec<String>,
    /// Data rows paired with their 1-based row number in the sheet.
    pub rows: Vec<(usize, Vec<RawCell>)>,
}

/// Mapping from header position to canonical field.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping<F: CanonicalField> {
    pub columns: Vec<(usize, F)>,
}

/// A data row addressed by canonical field instead of by position.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow<F: CanonicalField> {
    /// 1-based row number in the source sheet, kept for diagnostics.
    pub row_number: usize,
    cells: Vec<RawCell>,
    _field: std::marker::PhantomData<F>,
}

impl<F: CanonicalField> NormalizedRow<F> {
    /// Builds a row from cells already in canonical order. Short rows are
    /// padded with empty cells and surplus cells are discarded.
    pub fn new(row_number: usize, mut cells: Vec<RawCell>) -> Self {
        cells.resize(F::ALL.len(), RawCell::Empty);
        Self {
            row_number,
            cells,
            _field: std::marker::PhantomData,
        }
    }

    pub fn get(&self, field: F) -> &RawCell {
        &self.cells[field.index()]
    }
}

/// Maps header positions to canonical fields. Fails with
/// [`PipelineError::SchemaMismatch`] unless the header count matches
/// exactly; no partial mapping is ever returned.
pub fn map_columns<F: CanonicalField>(
    sheet: &str,
    headers: &[String],
) -> Result<ColumnMapping<F>> {
    if headers.len() != F::ALL.len() {
        return Err(PipelineError::SchemaMismatch {
            sheet: sheet.to_string(),
            expected: F::ALL.len(),
            found: headers.len(),
        });
    }

    let columns = F::ALL
        .iter()
        .enumerate()
        .map(|(position, field)| (position, *field))
        .collect();
    Ok(ColumnMapping { columns })
}

/// Validates the sheet layout and re-addresses every row by canonical field.
pub fn normalize_sheet<F: CanonicalField>(sheet: RawSheet) -> Result<Vec<NormalizedRow<F>>> {
    let mapping = map_columns::<F>(&sheet.name, &sheet.headers)?;

    let rows = sheet
        .rows
        .into_iter()
        .map(|(row_number, cells)| {
            let mut ordered = vec![RawCell::Empty; F::ALL.len()];
            for (position, field) in &mapping.columns {
                if let Some(cell) = cells.get(*position) {
                    ordered[field.index()] = cell.clone();
                }
            }
            NormalizedRow::new(row_number, ordered)
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(count: usize) -> Vec<String> {
        (0..count).map(|idx| format!("col {idx}")).collect()
    }

    #[test]
    fn survey_mapping_is_positional() {
        let mapping = map_columns::<SurveyField>(SURVEY_SHEET, &headers(14)).unwrap();
        assert_eq!(mapping.columns.len(), 14);
        assert_eq!(mapping.columns[3], (3, SurveyField::RouteId));
        assert_eq!(mapping.columns[8], (8, SurveyField::TripCount));
        assert_eq!(mapping.columns[12], (12, SurveyField::PricePaid));
    }

    #[test]
    fn wrong_column_count_is_a_schema_mismatch() {
        let error = map_columns::<OperationField>(OPERATION_SHEET, &headers(4)).unwrap_err();
        match error {
            PipelineError::SchemaMismatch {
                sheet,
                expected,
                found,
            } => {
                assert_eq!(sheet, OPERATION_SHEET);
                assert_eq!(expected, 3);
                assert_eq!(found, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_rows_are_padded() {
        let sheet = RawSheet {
            name: OPERATION_SHEET.to_string(),
            headers: headers(3),
            rows: vec![(2, vec![RawCell::Number(22.0)])],
        };
        let rows = normalize_sheet::<OperationField>(sheet).unwrap();
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].get(OperationField::RouteId), &RawCell::Number(22.0));
        assert_eq!(rows[0].get(OperationField::VehicleCount), &RawCell::Empty);
    }

    #[test]
    fn required_fields_follow_policy_table() {
        let required: Vec<&str> = SurveyField::ALL
            .iter()
            .filter(|field| field.policy() == FieldPolicy::Required)
            .map(|field| field.name())
            .collect();
        assert_eq!(required, vec!["route_id", "trip_count", "price_paid"]);
    }
}
