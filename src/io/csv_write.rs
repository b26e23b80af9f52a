//! Aggregate table serialization to CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::model::{AggregateBucket, AggregateTable, RouteId};

/// Row layout of the survey-only variant, without the operational means.
#[derive(Serialize)]
struct BaseRow<'a> {
    bus_line: RouteId,
    time_slot: Option<&'a str>,
    age_group: Option<&'a str>,
    total_revenue: f64,
    total_yield: f64,
    total_trips: u64,
    avg_yield_per_trip: f64,
}

impl<'a> From<&'a AggregateBucket> for BaseRow<'a> {
    fn from(bucket: &'a AggregateBucket) -> Self {
        Self {
            bus_line: bucket.route_id,
            time_slot: bucket.time_slot.as_deref(),
            age_group: bucket.age_group.as_deref(),
            total_revenue: bucket.total_revenue,
            total_yield: bucket.total_yield,
            total_trips: bucket.total_trips,
            avg_yield_per_trip: bucket.avg_yield_per_trip,
        }
    }
}

/// Writes the aggregate table as CSV to any writer. The header row is
/// always written, even for an empty table.
pub fn write_aggregate<W: Write>(writer: W, table: &AggregateTable) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(table.columns())?;

    for bucket in &table.buckets {
        if table.includes_operations {
            csv_writer.serialize(bucket)?;
        } else {
            csv_writer.serialize(BaseRow::from(bucket))?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes the aggregate table to a CSV file, replacing any existing file.
pub fn write_aggregate_file(path: &Path, table: &AggregateTable) -> Result<()> {
    let file = File::create(path)?;
    write_aggregate(BufWriter::new(file), table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(per_km: Option<f64>) -> AggregateBucket {
        AggregateBucket {
            route_id: 22,
            time_slot: Some("07:00-10:00".into()),
            age_group: None,
            total_revenue: 5.0,
            total_yield: 4.0,
            total_trips: 3,
            avg_yield_per_trip: 2.0,
            avg_yield_per_km: per_km,
            avg_yield_per_vehicle: None,
        }
    }

    fn render(table: &AggregateTable) -> String {
        let mut buffer = Vec::new();
        write_aggregate(&mut buffer, table).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn survey_only_layout_omits_operational_columns() {
        let table = AggregateTable {
            includes_operations: false,
            buckets: vec![bucket(Some(1.0))],
        };
        assert_eq!(
            render(&table),
            "bus_line,time_slot,age_group,total_revenue,total_yield,total_trips,\
             avg_yield_per_trip\n\
             22,07:00-10:00,,5.0,4.0,3,2.0\n"
        );
    }

    #[test]
    fn joined_layout_leaves_undefined_means_blank() {
        let table = AggregateTable {
            includes_operations: true,
            buckets: vec![bucket(Some(0.25))],
        };
        let rendered = render(&table);
        let mut lines = rendered.lines();
        assert_eq!(
            lines.next(),
            Some(
                "bus_line,time_slot,age_group,total_revenue,total_yield,total_trips,\
                 avg_yield_per_trip,avg_yield_per_km,avg_yield_per_vehicle"
            )
        );
        assert_eq!(lines.next(), Some("22,07:00-10:00,,5.0,4.0,3,2.0,0.25,"));
    }

    #[test]
    fn empty_table_still_has_header() {
        let table = AggregateTable {
            includes_operations: false,
            buckets: Vec::new(),
        };
        assert_eq!(render(&table).lines().count(), 1);
    }
}
