// Downsampling of raw readings into calendar buckets (hour/day/week/month).
// Pure functions only: no I/O, no state kept between calls.

pub mod calendar;
pub mod reducers;

use chrono::{DateTime, Utc, Weekday};
use tracing::debug;

use crate::error::AggregationError;
use crate::models::{AggregatedRecord, AggregatorKind, PropertyMap, Reading};

pub use calendar::{CalendarGranularity, Granularity};

/// Aggregates readings into one record per non-empty bucket, ascending by bucket start.
/// Input order does not matter; readings with equal timestamps keep their relative order.
pub fn aggregate(
    readings: &[Reading],
    granularity: Granularity,
    week_start: Weekday,
) -> Result<Vec<AggregatedRecord>, AggregationError> {
    let calendar = granularity.calendar(week_start);
    aggregate_with(readings, calendar.as_ref())
}

/// Same as [`aggregate`], with the granularity given by name ("hourly", "daily", ...).
pub fn aggregate_by_name(
    readings: &[Reading],
    granularity: &str,
    week_start: Weekday,
) -> Result<Vec<AggregatedRecord>, AggregationError> {
    let granularity: Granularity = granularity.parse()?;
    aggregate(readings, granularity, week_start)
}

/// Aggregates against an arbitrary calendar.
pub fn aggregate_with(
    readings: &[Reading],
    cal: &dyn CalendarGranularity,
) -> Result<Vec<AggregatedRecord>, AggregationError> {
    if readings.is_empty() {
        return Ok(Vec::new());
    }

    let mut timed = readings
        .iter()
        .map(|r| Ok((calendar::parse_instant(&r.datetime)?, r)))
        .collect::<Result<Vec<(DateTime<Utc>, &Reading)>, AggregationError>>()?;
    timed.sort_by_key(|(t, _)| *t);

    let (Some(&(earliest, _)), Some(&(latest, _))) = (timed.first(), timed.last()) else {
        return Ok(Vec::new());
    };
    let range_start = cal.bucket_start(earliest);
    let range_end = cal.bucket_end(latest);

    let mut out = Vec::new();
    let mut rest = timed.as_slice();
    let mut buckets_visited: usize = 0;

    for bucket_start in calendar::each_bucket(cal, range_start, range_end) {
        buckets_visited += 1;
        // `rest` is sorted and starts at or after bucket_start, so members form a prefix.
        let n = rest.partition_point(|(t, _)| cal.contains(*t, bucket_start));
        let (members, tail) = rest.split_at(n);
        rest = tail;
        if let Some(record) = aggregate_bucket(bucket_start, members) {
            out.push(record);
        }
    }

    debug!(
        readings = readings.len(),
        buckets_visited,
        records = out.len(),
        "aggregated readings"
    );
    Ok(out)
}

/// One record from the readings of a bucket; None when the bucket is empty.
/// Property set and metadata come from the first member; members missing a property are skipped.
fn aggregate_bucket(
    bucket_start: DateTime<Utc>,
    members: &[(DateTime<Utc>, &Reading)],
) -> Option<AggregatedRecord> {
    let (_, first) = members.first()?;

    let properties: PropertyMap = first
        .properties
        .iter()
        .map(|(key, entry)| {
            let values: Vec<f64> = members
                .iter()
                .filter_map(|(_, r)| r.properties.get(key).map(|e| e.value))
                .collect();
            let value = reduce(entry.aggregator_kind(), &values);
            (key.clone(), entry.with_value(value))
        })
        .collect();

    Some(AggregatedRecord {
        datetime: calendar::format_instant(bucket_start),
        properties,
    })
}

/// Applies the property's reducer. Unknown aggregators yield 0.
pub fn reduce(kind: AggregatorKind, values: &[f64]) -> f64 {
    match kind {
        AggregatorKind::Sum => reducers::sum(values),
        AggregatorKind::Median => reducers::median(values),
        AggregatorKind::Unknown => 0.0,
    }
}
