use chrono::{DateTime, TimeDelta, Utc, Weekday};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::aggregation::calendar::parse_instant;
use crate::models::{AggregatorKind, ChartStyle};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Simulated properties, keyed by property name (e.g. "temperature"). Order is kept.
    #[serde(default = "default_properties")]
    pub properties: IndexMap<String, PropertySettings>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    /// First simulated reading; ISO-8601, naive values are read as UTC.
    #[serde(default = "default_start_date")]
    pub start_date: String,
    #[serde(default = "default_number_of_sensors")]
    pub number_of_sensors: u32,
    /// Spacing between simulated readings.
    #[serde(default = "default_sample_interval_minutes")]
    pub sample_interval_minutes: u32,
    /// First day of a weekly bucket ("sunday", "mon", ...).
    #[serde(default = "default_week_starts_on")]
    pub week_starts_on: String,
    /// How often the refresh worker appends readings up to now.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            number_of_sensors: default_number_of_sensors(),
            sample_interval_minutes: default_sample_interval_minutes(),
            week_starts_on: default_week_starts_on(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

fn default_start_date() -> String {
    "2023-12-01T00:00:00".into()
}

fn default_number_of_sensors() -> u32 {
    5
}

fn default_sample_interval_minutes() -> u32 {
    30
}

fn default_week_starts_on() -> String {
    "sunday".into()
}

fn default_refresh_interval_secs() -> u64 {
    1800
}

impl DashboardConfig {
    pub fn start_date(&self) -> anyhow::Result<DateTime<Utc>> {
        Ok(parse_instant(&self.start_date)?)
    }

    pub fn week_start(&self) -> anyhow::Result<Weekday> {
        self.week_starts_on
            .parse::<Weekday>()
            .map_err(|_| anyhow::anyhow!("unknown weekday {:?}", self.week_starts_on))
    }

    pub fn sample_step(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.sample_interval_minutes))
    }
}

/// Generation range plus the metadata copied onto every reading of one property.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PropertySettings {
    /// [min, max) for the uniform generator.
    pub range: [f64; 2],
    /// Round to 2 decimals instead of flooring to an integer.
    #[serde(default)]
    pub is_float: bool,
    /// Display label; defaults to the property key.
    #[serde(default)]
    pub label: Option<String>,
    /// Reducer name copied onto readings; matched case-sensitively ("sum", "median").
    #[serde(default)]
    pub aggregator: Option<String>,
    #[serde(default)]
    pub chart_style: ChartStyle,
    /// Any other option (unit, color, ...) is copied onto every reading as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertySettings {
    pub fn aggregator_kind(&self) -> AggregatorKind {
        self.aggregator
            .as_deref()
            .map_or(AggregatorKind::Unknown, AggregatorKind::from_name)
    }
}

fn line_style() -> ChartStyle {
    ChartStyle {
        kind: Some("line".into()),
        fill: Some(false),
        extra: Map::new(),
    }
}

/// temperature / humidity / kWh, as shipped with the dashboard.
pub fn default_properties() -> IndexMap<String, PropertySettings> {
    let mut props = IndexMap::new();
    props.insert(
        "temperature".to_string(),
        PropertySettings {
            range: [-70.0, 70.0],
            is_float: true,
            label: Some("Temperature (°C)".into()),
            aggregator: Some("median".into()),
            chart_style: line_style(),
            extra: Map::new(),
        },
    );
    props.insert(
        "humidity".to_string(),
        PropertySettings {
            range: [0.0, 100.0],
            is_float: false,
            label: Some("Humidity (%)".into()),
            aggregator: Some("median".into()),
            chart_style: line_style(),
            extra: Map::new(),
        },
    );
    props.insert(
        "kWh".to_string(),
        PropertySettings {
            range: [0.0, 5.0],
            is_float: false,
            label: Some("kWh".into()),
            aggregator: Some("sum".into()),
            chart_style: ChartStyle {
                kind: Some("bar".into()),
                fill: Some(true),
                extra: Map::new(),
            },
            extra: Map::new(),
        },
    );
    props
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.dashboard.number_of_sensors > 0,
            "dashboard.number_of_sensors must be > 0, got {}",
            self.dashboard.number_of_sensors
        );
        anyhow::ensure!(
            self.dashboard.sample_interval_minutes > 0,
            "dashboard.sample_interval_minutes must be > 0, got {}",
            self.dashboard.sample_interval_minutes
        );
        anyhow::ensure!(
            self.dashboard.refresh_interval_secs > 0,
            "dashboard.refresh_interval_secs must be > 0, got {}",
            self.dashboard.refresh_interval_secs
        );
        if let Err(e) = self.dashboard.start_date() {
            anyhow::bail!("dashboard.start_date is invalid: {}", e);
        }
        if let Err(e) = self.dashboard.week_start() {
            anyhow::bail!("dashboard.week_starts_on is invalid: {}", e);
        }
        for (key, prop) in &self.properties {
            let [min, max] = prop.range;
            anyhow::ensure!(
                min < max,
                "properties.{}.range must have min < max, got [{}, {}]",
                key,
                min,
                max
            );
            if prop.aggregator_kind() == AggregatorKind::Unknown {
                tracing::warn!(
                    property = %key,
                    aggregator = ?prop.aggregator,
                    "unrecognized aggregator; buckets for this property will aggregate to 0"
                );
            }
        }
        Ok(())
    }
}
