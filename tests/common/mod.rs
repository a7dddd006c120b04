// Shared test helpers
#![allow(dead_code)]

use sensorboard::models::*;

/// Name as it appears in stored readings; `Unknown` stands in for "avg".
pub fn aggregator_name(kind: AggregatorKind) -> &'static str {
    match kind {
        AggregatorKind::Sum => "sum",
        AggregatorKind::Median => "median",
        AggregatorKind::Unknown => "avg",
    }
}

pub fn entry(value: f64, aggregator: AggregatorKind) -> PropertyEntry {
    PropertyEntry {
        value,
        aggregator: Some(aggregator_name(aggregator).into()),
        label: "Label".into(),
        chart_style: ChartStyle {
            kind: Some("line".into()),
            fill: Some(false),
            extra: Default::default(),
        },
        name: "Sensor_1".into(),
        is_float: true,
        extra: Default::default(),
    }
}

pub fn reading(datetime: &str, props: &[(&str, f64, AggregatorKind)]) -> Reading {
    props
        .iter()
        .fold(Reading::new(datetime), |r, (key, value, aggregator)| {
            r.with_property(*key, entry(*value, *aggregator))
        })
}

/// Value of `key` in each record, in output order.
pub fn values(records: &[AggregatedRecord], key: &str) -> Vec<f64> {
    records
        .iter()
        .map(|r| r.properties[key].value)
        .collect()
}

pub fn datetimes(records: &[AggregatedRecord]) -> Vec<&str> {
    records.iter().map(|r| r.datetime.as_str()).collect()
}
