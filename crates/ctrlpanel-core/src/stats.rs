//! Per-day grouping of statistics results.

use std::collections::BTreeMap;

use ctrlpanel_api_models::{Event, StatisticsBucket};

/// Count `events` per calendar day of `eventTime`, ordered by date.
#[must_use]
pub fn group_by_day(events: &[Event]) -> Vec<StatisticsBucket> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for event in events {
        *counts.entry(day_of(&event.event_time)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(date, count)| StatisticsBucket {
            date: date.to_string(),
            count,
        })
        .collect()
}

fn day_of(timestamp: &str) -> &str {
    let timestamp = timestamp.trim();
    timestamp
        .split_once(['T', ' '])
        .map_or(timestamp, |(date, _)| date)
}
