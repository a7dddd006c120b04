// Simulated sensor data: uniform random values on a fixed sampling step.

use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use rand::Rng;

use crate::aggregation::calendar::format_instant;
use crate::config::PropertySettings;
use crate::models::{PropertyEntry, Reading};

/// Uniform value in [min, max). Floats are rounded to 2 decimals, integers are floored.
pub fn random_value<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64, is_float: bool) -> f64 {
    let value = rng.r#gen::<f64>() * (max - min) + min;
    if is_float {
        (value * 100.0).round() / 100.0
    } else {
        value.floor()
    }
}

/// Display name of the n-th sensor (zero-based), e.g. "Sensor_1".
pub fn sensor_name(sensor_no: u32) -> String {
    format!("Sensor_{}", sensor_no + 1)
}

/// One reading every `step` from `start` through `end` (inclusive).
pub fn generate_sensor_data<R: Rng + ?Sized>(
    rng: &mut R,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    properties: &IndexMap<String, PropertySettings>,
    sensor_no: u32,
    step: TimeDelta,
) -> Vec<Reading> {
    let mut readings = Vec::new();
    if step <= TimeDelta::zero() {
        return readings;
    }
    let name = sensor_name(sensor_no);
    let mut current = start;

    while current <= end {
        let mut reading = Reading::new(format_instant(current));
        for (key, settings) in properties {
            let [min, max] = settings.range;
            reading.properties.insert(
                key.clone(),
                PropertyEntry {
                    value: random_value(rng, min, max, settings.is_float),
                    aggregator: settings.aggregator.clone(),
                    label: settings.label.clone().unwrap_or_else(|| key.clone()),
                    chart_style: settings.chart_style.clone(),
                    name: name.clone(),
                    is_float: settings.is_float,
                    extra: settings.extra.clone(),
                },
            );
        }
        readings.push(reading);
        current += step;
    }

    readings
}

/// One series per sensor, all sharing the same time range.
pub fn generate_for_sensors<R: Rng + ?Sized>(
    rng: &mut R,
    number_of_sensors: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    properties: &IndexMap<String, PropertySettings>,
    step: TimeDelta,
) -> Vec<Vec<Reading>> {
    (0..number_of_sensors)
        .map(|sensor_no| generate_sensor_data(rng, start, end, properties, sensor_no, step))
        .collect()
}
