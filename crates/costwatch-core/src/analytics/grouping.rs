//! Series grouping
//!
//! Partitions a flat record stream into per-dimension time series.

use std::collections::BTreeMap;

use crate::models::record::{CostRecord, DimensionKey};

/// Group records into per-dimension series, each sorted ascending by
/// timestamp.
///
/// No records are dropped; untagged records fall into the "default"
/// project bucket. Pure function, no side effects. The BTreeMap keeps
/// dimension iteration order deterministic.
pub fn group_by_dimension(records: &[CostRecord]) -> BTreeMap<DimensionKey, Vec<CostRecord>> {
    let mut series: BTreeMap<DimensionKey, Vec<CostRecord>> = BTreeMap::new();

    for record in records {
        series
            .entry(DimensionKey::from_record(record))
            .or_default()
            .push(record.clone());
    }

    for records in series.values_mut() {
        records.sort_by_key(|r| r.timestamp);
    }

    series
}
