// Model serialization tests (JSON shape of readings and aggregated records)

use sensorboard::models::*;

const READING_JSON: &str = r#"{
    "datetime": "2023-12-01T00:00:00.000Z",
    "temperature": {
        "value": 21.5,
        "aggregator": "median",
        "label": "Temperature (°C)",
        "chartStyle": {"type": "line", "fill": false},
        "name": "Sensor_1",
        "isFloat": true
    },
    "kWh": {
        "value": 3,
        "aggregator": "sum",
        "label": "kWh",
        "chartStyle": {"type": "bar", "fill": true},
        "name": "Sensor_1"
    }
}"#;

#[test]
fn test_reading_deserializes_flattened_properties() {
    let reading: Reading = serde_json::from_str(READING_JSON).unwrap();
    assert_eq!(reading.datetime, "2023-12-01T00:00:00.000Z");
    let keys: Vec<&str> = reading.properties.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["temperature", "kWh"]);

    let temp = &reading.properties["temperature"];
    assert_eq!(temp.value, 21.5);
    assert_eq!(temp.aggregator_kind(), AggregatorKind::Median);
    assert_eq!(temp.chart_style.kind.as_deref(), Some("line"));
    assert_eq!(temp.chart_style.fill, Some(false));
    assert!(temp.is_float);

    let kwh = &reading.properties["kWh"];
    assert_eq!(kwh.value, 3.0);
    assert_eq!(kwh.aggregator_kind(), AggregatorKind::Sum);
    assert!(!kwh.is_float);
}

#[test]
fn test_reading_serializes_camel_case() {
    let reading: Reading = serde_json::from_str(READING_JSON).unwrap();
    let json = serde_json::to_value(&reading).unwrap();
    assert_eq!(json["datetime"], "2023-12-01T00:00:00.000Z");
    assert_eq!(json["temperature"]["chartStyle"]["type"], "line");
    assert_eq!(json["temperature"]["isFloat"], true);
    assert_eq!(json["kWh"]["aggregator"], "sum");
}

#[test]
fn test_unrecognized_or_missing_aggregator_is_unknown() {
    let entry: PropertyEntry =
        serde_json::from_str(r#"{"value": 1, "aggregator": "avg"}"#).unwrap();
    assert_eq!(entry.aggregator_kind(), AggregatorKind::Unknown);
    assert_eq!(entry.aggregator.as_deref(), Some("avg"));
    let entry: PropertyEntry = serde_json::from_str(r#"{"value": 1}"#).unwrap();
    assert_eq!(entry.aggregator_kind(), AggregatorKind::Unknown);
    assert_eq!(entry.aggregator, None);
    assert_eq!(entry.chart_style, ChartStyle::default());
}

#[test]
fn test_aggregator_from_name() {
    assert_eq!(AggregatorKind::from_name("sum"), AggregatorKind::Sum);
    assert_eq!(AggregatorKind::from_name("median"), AggregatorKind::Median);
    // Names are matched exactly.
    assert_eq!(AggregatorKind::from_name("SUM"), AggregatorKind::Unknown);
    assert_eq!(AggregatorKind::from_name("Median"), AggregatorKind::Unknown);
    assert_eq!(AggregatorKind::from_name("average"), AggregatorKind::Unknown);
}

#[test]
fn test_with_value_keeps_metadata() {
    let reading: Reading = serde_json::from_str(READING_JSON).unwrap();
    let temp = &reading.properties["temperature"];
    let replaced = temp.with_value(-3.25);
    assert_eq!(replaced.value, -3.25);
    assert_eq!(replaced.label, temp.label);
    assert_eq!(replaced.chart_style, temp.chart_style);
    assert_eq!(replaced.name, temp.name);
    assert_eq!(replaced.aggregator, temp.aggregator);
}

#[test]
fn test_unknown_fields_round_trip() {
    let json = r##"{
        "value": 2,
        "aggregator": "avg",
        "unit": "C",
        "chartStyle": {"type": "line", "borderColor": "#f00", "tension": 0.4}
    }"##;
    let entry: PropertyEntry = serde_json::from_str(json).unwrap();
    assert_eq!(entry.extra["unit"], "C");
    assert_eq!(entry.chart_style.extra["borderColor"], "#f00");

    let back = serde_json::to_value(entry.with_value(5.0)).unwrap();
    assert_eq!(back["value"], 5.0);
    assert_eq!(back["aggregator"], "avg");
    assert_eq!(back["unit"], "C");
    assert_eq!(back["chartStyle"]["type"], "line");
    assert_eq!(back["chartStyle"]["borderColor"], "#f00");
    assert_eq!(back["chartStyle"]["tension"], 0.4);
    assert!(back["chartStyle"].get("fill").is_none());
}

#[test]
fn test_aggregated_record_has_reading_shape() {
    let reading: Reading = serde_json::from_str(READING_JSON).unwrap();
    let record = AggregatedRecord {
        datetime: reading.datetime.clone(),
        properties: reading.properties.clone(),
    };
    let json = serde_json::to_string(&record).unwrap();
    let back: Reading = serde_json::from_str(&json).unwrap();
    assert_eq!(back, reading);
}
