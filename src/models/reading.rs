// One timestamped sample carrying several named properties (temperature, humidity, kWh, ...).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property name -> entry, in the order the properties were first seen.
pub type PropertyMap = IndexMap<String, PropertyEntry>;

/// Reduction applied to a property's values inside one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorKind {
    Sum,
    Median,
    /// Any other name, or none at all. Aggregates to 0.
    Unknown,
}

impl AggregatorKind {
    /// Exact, case-sensitive match on "sum" / "median"; everything else is Unknown.
    pub fn from_name(s: &str) -> Self {
        match s {
            "sum" => AggregatorKind::Sum,
            "median" => AggregatorKind::Median,
            _ => AggregatorKind::Unknown,
        }
    }
}

/// Chart hints passed through to the presentation layer untouched.
/// `type` and `fill` are typed; any other styling key is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyEntry {
    pub value: f64,
    /// Reducer name exactly as supplied ("sum", "median", ...); absent stays absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregator: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub chart_style: ChartStyle,
    /// Originating sensor, e.g. "Sensor_1".
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_float: bool,
    /// Fields this crate does not know about, carried through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyEntry {
    pub fn aggregator_kind(&self) -> AggregatorKind {
        self.aggregator
            .as_deref()
            .map_or(AggregatorKind::Unknown, AggregatorKind::from_name)
    }

    /// Same metadata, new value.
    pub fn with_value(&self, value: f64) -> Self {
        PropertyEntry {
            value,
            aggregator: self.aggregator.clone(),
            label: self.label.clone(),
            chart_style: self.chart_style.clone(),
            name: self.name.clone(),
            is_float: self.is_float,
            extra: self.extra.clone(),
        }
    }
}

/// A raw reading. JSON shape: `{"datetime": "...", "temperature": {...}, "kWh": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// ISO-8601 instant, parsed only when aggregating.
    pub datetime: String,
    #[serde(flatten)]
    pub properties: PropertyMap,
}

impl Reading {
    pub fn new(datetime: impl Into<String>) -> Self {
        Reading {
            datetime: datetime.into(),
            properties: PropertyMap::new(),
        }
    }

    /// Builder-style insert used by the generator and tests.
    pub fn with_property(mut self, key: impl Into<String>, entry: PropertyEntry) -> Self {
        self.properties.insert(key.into(), entry);
        self
    }
}
