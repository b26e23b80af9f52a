//! Group-by aggregation keyed on `(route, time slot, age group)`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{AggregateBucket, AggregateTable, EnrichedRecord, RouteId};

/// Composite grouping key. Missing labels sort before present ones and form
/// their own group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    pub route_id: RouteId,
    pub time_slot: Option<String>,
    pub age_group: Option<String>,
}

impl BucketKey {
    pub fn of(record: &EnrichedRecord) -> Self {
        Self {
            route_id: record.survey.route_id,
            time_slot: record.survey.time_slot.clone(),
            age_group: record.survey.age_group.clone(),
        }
    }
}

/// Running mean that only counts the values it is given.
#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn push_defined(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.push(value);
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    total_revenue: f64,
    total_yield: f64,
    total_trips: u64,
    yield_per_row: Mean,
    yield_per_km: Mean,
    yield_per_vehicle: Mean,
}

impl Accumulator {
    fn add(&mut self, record: &EnrichedRecord) {
        self.total_revenue += record.revenue;
        self.total_yield += record.yield_amount;
        self.total_trips += u64::from(record.survey.trip_count);
        self.yield_per_row.push(record.yield_amount);
        self.yield_per_km.push_defined(record.yield_per_km);
        self.yield_per_vehicle.push_defined(record.yield_per_vehicle);
    }

    fn into_bucket(self, key: BucketKey) -> AggregateBucket {
        AggregateBucket {
            route_id: key.route_id,
            time_slot: key.time_slot,
            age_group: key.age_group,
            total_revenue: self.total_revenue,
            total_yield: self.total_yield,
            total_trips: self.total_trips,
            // Every bucket holds at least one row.
            avg_yield_per_trip: self.yield_per_row.value().unwrap_or_default(),
            avg_yield_per_km: self.yield_per_km.value(),
            avg_yield_per_vehicle: self.yield_per_vehicle.value(),
        }
    }
}

/// Aggregates enriched rows into one bucket per distinct key, sorted by key.
///
/// `avg_yield_per_trip` is the mean of the per-row yields, so rows with many
/// trips weigh the same as rows with one. Per-km and per-vehicle means skip
/// rows where the metric is undefined and are `None` when no row defines it.
pub fn aggregate(records: &[EnrichedRecord], includes_operations: bool) -> AggregateTable {
    let mut groups: BTreeMap<BucketKey, Accumulator> = BTreeMap::new();
    for record in records {
        groups.entry(BucketKey::of(record)).or_default().add(record);
    }

    debug!(
        rows = records.len(),
        buckets = groups.len(),
        "aggregated enriched rows"
    );

    let buckets = groups
        .into_iter()
        .map(|(key, accumulator)| accumulator.into_bucket(key))
        .collect();

    AggregateTable {
        includes_operations,
        buckets,
    }
}
