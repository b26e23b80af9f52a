//! Row filtering and typed coercion of normalized sheet rows.
//!
//! Every field goes through a typed conversion returning
//! `Result<_, CoercionError>`. What happens on failure is decided by the
//! field's [`FieldPolicy`]: required fields reject the row, optional fields
//! degrade to `None`.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{OperationalRecord, RawCell, RouteId, SurveyRecord};
use crate::schema::{CanonicalField, FieldPolicy, NormalizedRow, OperationField, SurveyField};

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

/// Why a single cell could not be converted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("value is missing")]
    Missing,
    #[error("'{0}' is not a number")]
    NotNumeric(String),
    #[error("{0} is not a whole number")]
    NotIntegral(f64),
    #[error("{0} is negative")]
    Negative(f64),
    #[error("{0} is out of range")]
    OutOfRange(f64),
}

/// Why a row was excluded from downstream processing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowRejection {
    #[error("required field '{field}' is missing")]
    MissingRequiredField { field: &'static str },
    #[error("required field '{field}' could not be coerced: {reason}")]
    CoercionFailure {
        field: &'static str,
        reason: CoercionError,
    },
}

/// A row that did not survive the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub row_number: usize,
    pub reason: RowRejection,
}

/// Records that passed the filter, plus the rejected rows for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Filtered<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RejectedRow>,
}

/// Coerces every survey row, keeping only rows whose required fields are
/// present and valid.
pub fn filter_survey_rows(rows: &[NormalizedRow<SurveyField>]) -> Filtered<SurveyRecord> {
    filter_rows("survey", rows, coerce_survey_row)
}

/// Coerces every operation row; rows without a valid route id are dropped.
pub fn filter_operation_rows(
    rows: &[NormalizedRow<OperationField>],
) -> Filtered<OperationalRecord> {
    filter_rows("operation", rows, coerce_operation_row)
}

fn filter_rows<F, T>(
    sheet: &str,
    rows: &[NormalizedRow<F>],
    coerce: fn(&NormalizedRow<F>) -> Result<T, RowRejection>,
) -> Filtered<T>
where
    F: CanonicalField,
{
    let mut records = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for row in rows {
        match coerce(row) {
            Ok(record) => records.push(record),
            Err(reason) => {
                debug!(sheet, row = row.row_number, %reason, "dropping row");
                rejected.push(RejectedRow {
                    row_number: row.row_number,
                    reason,
                });
            }
        }
    }

    info!(
        sheet,
        kept = records.len(),
        dropped = rejected.len(),
        "filtered sheet rows"
    );
    Filtered { records, rejected }
}

/// Converts one normalized survey row into a [`SurveyRecord`].
pub fn coerce_survey_row(row: &NormalizedRow<SurveyField>) -> Result<SurveyRecord, RowRejection> {
    // Absence is reported ahead of any parse failure.
    check_present(row)?;

    let route_id = required(row, SurveyField::RouteId, integer)?;
    let price_paid = required(row, SurveyField::PricePaid, non_negative)?;
    let trip_count = required(row, SurveyField::TripCount, count)?;

    Ok(SurveyRecord {
        timestamp: optional(row, SurveyField::Timestamp, timestamp),
        time_slot: optional(row, SurveyField::TimeSlot, text),
        route_id,
        ticket_type: optional(row, SurveyField::TicketType, text),
        price_paid,
        gender: optional(row, SurveyField::Gender, text),
        age_group: optional(row, SurveyField::AgeGroup, text),
        trip_purpose: optional(row, SurveyField::TripPurpose, text),
        trip_count,
    })
}

/// Converts one normalized operation row into an [`OperationalRecord`].
pub fn coerce_operation_row(
    row: &NormalizedRow<OperationField>,
) -> Result<OperationalRecord, RowRejection> {
    check_present(row)?;

    Ok(OperationalRecord {
        route_id: required(row, OperationField::RouteId, integer)?,
        kilometers_operated: optional(row, OperationField::KilometersOperated, non_negative),
        vehicle_count: optional(row, OperationField::VehicleCount, count),
    })
}

fn check_present<F: CanonicalField>(row: &NormalizedRow<F>) -> Result<(), RowRejection> {
    for field in F::ALL {
        if field.policy() == FieldPolicy::Required && row.get(*field).is_missing() {
            return Err(RowRejection::MissingRequiredField {
                field: field.name(),
            });
        }
    }
    Ok(())
}

fn required<F, T>(
    row: &NormalizedRow<F>,
    field: F,
    convert: fn(&RawCell) -> Result<T, CoercionError>,
) -> Result<T, RowRejection>
where
    F: CanonicalField,
{
    convert(row.get(field)).map_err(|reason| match reason {
        CoercionError::Missing => RowRejection::MissingRequiredField {
            field: field.name(),
        },
        reason => RowRejection::CoercionFailure {
            field: field.name(),
            reason,
        },
    })
}

fn optional<F, T>(
    row: &NormalizedRow<F>,
    field: F,
    convert: fn(&RawCell) -> Result<T, CoercionError>,
) -> Option<T>
where
    F: CanonicalField,
{
    match convert(row.get(field)) {
        Ok(value) => Some(value),
        Err(CoercionError::Missing) => None,
        Err(reason) => {
            debug!(field = field.name(), %reason, "optional field treated as missing");
            None
        }
    }
}

/// Parses a finite number from a numeric or textual cell.
pub fn number(cell: &RawCell) -> Result<f64, CoercionError> {
    let value = match cell {
        RawCell::Empty => return Err(CoercionError::Missing),
        RawCell::Number(value) => *value,
        RawCell::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(CoercionError::Missing);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| CoercionError::NotNumeric(trimmed.to_string()))?
        }
        RawCell::Bool(value) => return Err(CoercionError::NotNumeric(value.to_string())),
        RawCell::DateTime(value) => return Err(CoercionError::NotNumeric(value.to_string())),
        RawCell::Error(code) => return Err(CoercionError::NotNumeric(code.clone())),
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoercionError::NotNumeric(value.to_string()))
    }
}

/// Parses a finite, non-negative number.
pub fn non_negative(cell: &RawCell) -> Result<f64, CoercionError> {
    let value = number(cell)?;
    if value < 0.0 {
        return Err(CoercionError::Negative(value));
    }
    Ok(value)
}

/// Parses a whole number; decimals are accepted only without a fraction.
pub fn integer(cell: &RawCell) -> Result<RouteId, CoercionError> {
    let value = number(cell)?;
    if value.fract() != 0.0 {
        return Err(CoercionError::NotIntegral(value));
    }
    if value < RouteId::MIN as f64 || value >= RouteId::MAX as f64 {
        return Err(CoercionError::OutOfRange(value));
    }
    Ok(value as RouteId)
}

/// Parses a non-negative whole number.
pub fn count(cell: &RawCell) -> Result<u32, CoercionError> {
    let value = integer(cell)?;
    if value < 0 {
        return Err(CoercionError::Negative(value as f64));
    }
    u32::try_from(value).map_err(|_| CoercionError::OutOfRange(value as f64))
}

/// Renders a cell as trimmed text; blank cells are missing.
pub fn text(cell: &RawCell) -> Result<String, CoercionError> {
    let value = match cell {
        RawCell::Empty => return Err(CoercionError::Missing),
        RawCell::Text(raw) => raw.trim().to_string(),
        RawCell::Number(value) if value.fract() == 0.0 && value.is_finite() => {
            format!("{}", *value as i64)
        }
        RawCell::Number(value) => value.to_string(),
        RawCell::Bool(value) => value.to_string(),
        RawCell::DateTime(serial) => match excel_serial_to_datetime(*serial) {
            Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => serial.to_string(),
        },
        RawCell::Error(code) => return Err(CoercionError::NotNumeric(code.clone())),
    };

    if value.is_empty() {
        Err(CoercionError::Missing)
    } else {
        Ok(value)
    }
}

/// Parses a date-time from an Excel serial or a common textual layout.
pub fn timestamp(cell: &RawCell) -> Result<NaiveDateTime, CoercionError> {
    match cell {
        RawCell::DateTime(serial) | RawCell::Number(serial) => excel_serial_to_datetime(*serial)
            .ok_or_else(|| CoercionError::OutOfRange(*serial)),
        RawCell::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(CoercionError::Missing);
            }
            TIMESTAMP_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                .ok_or_else(|| CoercionError::NotNumeric(trimmed.to_string()))
        }
        RawCell::Empty => Err(CoercionError::Missing),
        RawCell::Bool(value) => Err(CoercionError::NotNumeric(value.to_string())),
        RawCell::Error(code) => Err(CoercionError::NotNumeric(code.clone())),
    }
}

fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    // 2_958_465 is 9999-12-31, the last date Excel can represent.
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}
