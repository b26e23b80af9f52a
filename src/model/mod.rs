use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Integer identifier of a transit route. It is the join key between the
/// survey and the operational sheets.
pub type RouteId = i64;

/// A single spreadsheet cell, decoupled from the workbook reader so the
/// cleaning stages can be exercised without an `.xlsx` file.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// Blank cell, or a cell beyond the end of a short row.
    Empty,
    /// Text literal as stored in the sheet.
    Text(String),
    /// Numeric literal. Integers are widened to floats.
    Number(f64),
    /// Boolean literal.
    Bool(bool),
    /// Excel date serial (days since 1899-12-30, fractional part is time).
    DateTime(f64),
    /// Cell holding a spreadsheet error such as `#N/A`.
    Error(String),
}

impl RawCell {
    /// Returns `true` when the cell holds no value at all.
    pub fn is_missing(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }
}

/// One ridership survey response after coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub time_slot: Option<String>,
    #[serde(rename = "bus_line")]
    pub route_id: RouteId,
    pub ticket_type: Option<String>,
    pub price_paid: f64,
    pub gender: Option<String>,
    pub age_group: Option<String>,
    pub trip_purpose: Option<String>,
    #[serde(rename = "trips")]
    pub trip_count: u32,
}

/// Operational statistics of one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalRecord {
    #[serde(rename = "bus_line")]
    pub route_id: RouteId,
    #[serde(rename = "kilometers")]
    pub kilometers_operated: Option<f64>,
    #[serde(rename = "vehicles")]
    pub vehicle_count: Option<u32>,
}

/// A survey record joined with at most one operational record, carrying the
/// derived revenue metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub survey: SurveyRecord,
    pub operational: Option<OperationalRecord>,
    pub revenue: f64,
    pub yield_amount: f64,
    /// `None` when no operational row matched or the divisor is missing or zero.
    pub yield_per_km: Option<f64>,
    /// `None` when no operational row matched or the divisor is missing or zero.
    pub yield_per_vehicle: Option<f64>,
}

/// Group-by result for one `(route, time slot, age group)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    #[serde(rename = "bus_line")]
    pub route_id: RouteId,
    pub time_slot: Option<String>,
    pub age_group: Option<String>,
    pub total_revenue: f64,
    pub total_yield: f64,
    pub total_trips: u64,
    /// Row-level mean of yield, not `total_yield / total_trips`.
    pub avg_yield_per_trip: f64,
    pub avg_yield_per_km: Option<f64>,
    pub avg_yield_per_vehicle: Option<f64>,
}

/// The complete aggregation output of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTable {
    /// Whether the operational join ran, which decides if the per-km and
    /// per-vehicle columns are part of the exported schema.
    pub includes_operations: bool,
    /// Buckets sorted ascending by key.
    pub buckets: Vec<AggregateBucket>,
}

impl AggregateTable {
    /// Column names of the exported table, in order.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = vec![
            "bus_line",
            "time_slot",
            "age_group",
            "total_revenue",
            "total_yield",
            "total_trips",
            "avg_yield_per_trip",
        ];
        if self.includes_operations {
            columns.extend(["avg_yield_per_km", "avg_yield_per_vehicle"]);
        }
        columns
    }
}
