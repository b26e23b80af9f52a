//! Left outer join of survey records onto operational records.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, warn};

use crate::model::{OperationalRecord, RouteId, SurveyRecord};

/// Operational records indexed by route. When a route appears more than
/// once, the first record in sheet order is kept.
#[derive(Debug, Clone, Default)]
pub struct OperationIndex {
    by_route: HashMap<RouteId, OperationalRecord>,
    duplicates: usize,
}

impl OperationIndex {
    pub fn build(records: &[OperationalRecord]) -> Self {
        let mut index = Self::default();
        for record in records {
            match index.by_route.entry(record.route_id) {
                Entry::Vacant(slot) => {
                    slot.insert(record.clone());
                }
                Entry::Occupied(_) => {
                    debug!(route_id = record.route_id, "ignoring duplicate operational row");
                    index.duplicates += 1;
                }
            }
        }
        if index.duplicates > 0 {
            warn!(
                duplicates = index.duplicates,
                "operation sheet lists some routes more than once; first rows win"
            );
        }
        index
    }

    pub fn get(&self, route_id: RouteId) -> Option<&OperationalRecord> {
        self.by_route.get(&route_id)
    }

    /// Number of rows ignored because their route was already indexed.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.by_route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_route.is_empty()
    }
}

/// Pairs each survey record with the operational record of its route.
/// The output has exactly one entry per input survey record, in input order.
pub fn left_join(
    survey: Vec<SurveyRecord>,
    index: &OperationIndex,
) -> Vec<(SurveyRecord, Option<OperationalRecord>)> {
    let mut unmatched = 0usize;
    let joined: Vec<_> = survey
        .into_iter()
        .map(|record| {
            let operational = index.get(record.route_id).cloned();
            if operational.is_none() {
                unmatched += 1;
            }
            (record, operational)
        })
        .collect();

    debug!(rows = joined.len(), unmatched, "joined survey with operations");
    joined
}
