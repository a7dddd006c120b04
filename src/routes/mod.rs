// HTTP routes

mod http;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::readings_repo::ReadingsRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) repo: Arc<ReadingsRepo>,
    pub(crate) config: AppConfig,
}

pub fn app(repo: Arc<ReadingsRepo>, config: AppConfig) -> Router {
    let state = AppState { repo, config };
    Router::new()
        .route("/", get(|| async { "Hello from sensorboard!" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/settings", get(http::settings_handler)) // GET /api/settings
        .route("/api/sensors", get(http::sensors_handler)) // GET /api/sensors
        .route("/api/calendar/weeks", get(http::weeks_handler)) // GET /api/calendar/weeks?date=
        .route(
            "/api/sensors/regenerate",
            post(http::regenerate_handler),
        ) // POST /api/sensors/regenerate
        .route(
            "/api/sensors/{index}/readings",
            get(http::sensor_readings_handler),
        ) // GET /api/sensors/{index}/readings
        .route(
            "/api/sensors/{index}/aggregated",
            get(http::aggregated_handler),
        ) // GET /api/sensors/{index}/aggregated?granularity=daily
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
