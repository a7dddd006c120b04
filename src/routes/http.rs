// Handlers: version, settings, raw readings, aggregated series

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::aggregation::calendar::{format_instant, parse_instant, weeks_in_last_four_months};
use crate::aggregation::{self, Granularity};
use crate::error::AggregationError;
use crate::generator::sensor_name;
use crate::labels::format_label;
use crate::loader;
use crate::models::{AggregatedRecord, Reading};
use crate::version::{NAME, VERSION};

/// Error body: `{"error": "..."}` with the matching status.
pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::warn!(error = %e, "request failed");
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl From<AggregationError> for ApiError {
    fn from(e: AggregationError) -> Self {
        let status = match e {
            AggregationError::Config(_) => StatusCode::BAD_REQUEST,
            AggregationError::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        ApiError(status, e.to_string())
    }
}

fn unknown_sensor(index: u32) -> ApiError {
    ApiError(StatusCode::NOT_FOUND, format!("unknown sensor {}", index))
}

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/settings — resolved dashboard settings and property metadata.
pub(super) async fn settings_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "dashboard": state.config.dashboard,
        "properties": state.config.properties,
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct SensorInfo {
    index: u32,
    name: String,
    readings: i64,
}

/// GET /api/sensors — stored sensors with their reading counts.
pub(super) async fn sensors_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<SensorInfo>>, ApiError> {
    let sensors = state
        .repo
        .sensor_summaries()
        .await?
        .into_iter()
        .map(|s| SensorInfo {
            index: s.sensor,
            name: sensor_name(s.sensor),
            readings: s.readings,
        })
        .collect();
    Ok(Json(sensors))
}

/// GET /api/sensors/{index}/readings — raw readings, ascending by time.
pub(super) async fn sensor_readings_handler(
    State(state): State<AppState>,
    Path(index): Path<u32>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    let readings = state.repo.load_sensor_readings(index).await?;
    if readings.is_empty() {
        return Err(unknown_sensor(index));
    }
    Ok(Json(readings))
}

#[derive(Debug, Deserialize)]
pub(super) struct AggregatedQuery {
    granularity: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct LabeledRecord {
    label: String,
    record: AggregatedRecord,
}

#[derive(Debug, Serialize)]
pub(super) struct AggregatedResponse {
    sensor: u32,
    granularity: Granularity,
    records: Vec<LabeledRecord>,
}

/// GET /api/sensors/{index}/aggregated?granularity=daily — one record per non-empty bucket.
pub(super) async fn aggregated_handler(
    State(state): State<AppState>,
    Path(index): Path<u32>,
    Query(query): Query<AggregatedQuery>,
) -> Result<Json<AggregatedResponse>, ApiError> {
    let granularity: Granularity = query
        .granularity
        .as_deref()
        .unwrap_or("daily")
        .parse()?;
    let week_start = state.config.dashboard.week_start()?;

    let readings = state.repo.load_sensor_readings(index).await?;
    if readings.is_empty() {
        return Err(unknown_sensor(index));
    }

    // CPU-bound over the whole series; keep it off the async workers.
    let records = tokio::task::spawn_blocking(move || {
        aggregation::aggregate(&readings, granularity, week_start)
    })
    .await
    .map_err(anyhow::Error::from)??;

    let records = records
        .into_iter()
        .map(|record| LabeledRecord {
            label: format_label(&record.datetime, granularity),
            record,
        })
        .collect();

    Ok(Json(AggregatedResponse {
        sensor: index,
        granularity,
        records,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct WeeksQuery {
    date: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct WeekTick {
    start: String,
    label: String,
}

/// GET /api/calendar/weeks?date=2024-05-15 — week starts spanning the four months before
/// `date` (default: now) through the end of its month, for weekly chart axes.
pub(super) async fn weeks_handler(
    State(state): State<AppState>,
    Query(query): Query<WeeksQuery>,
) -> Result<Json<Vec<WeekTick>>, ApiError> {
    let at = match query.date.as_deref() {
        Some(date) => parse_instant(date)?,
        None => chrono::Utc::now(),
    };
    let week_start = state.config.dashboard.week_start()?;
    let ticks = weeks_in_last_four_months(at, week_start)
        .into_iter()
        .map(|start| {
            let start = format_instant(start);
            WeekTick {
                label: format_label(&start, Granularity::Weekly),
                start,
            }
        })
        .collect();
    Ok(Json(ticks))
}

/// POST /api/sensors/regenerate — regenerate and store every sensor's series up to now.
pub(super) async fn regenerate_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let data =
        loader::load_sensor_data(&state.repo, &state.config, chrono::Utc::now()).await?;
    let readings: usize = data.iter().map(Vec::len).sum();
    Ok(Json(serde_json::json!({
        "sensors": data.len(),
        "readings": readings,
    })))
}
