// Startup load: regenerate every sensor's series from the configured start date and store it.

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::config::AppConfig;
use crate::generator;
use crate::models::Reading;
use crate::readings_repo::ReadingsRepo;

/// Replaces stored readings with a fresh series per sensor covering start_date..=now.
pub async fn load_sensor_data(
    repo: &ReadingsRepo,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<Vec<Reading>>> {
    let start = config.dashboard.start_date()?;
    let data = {
        let mut rng = StdRng::from_entropy();
        generator::generate_for_sensors(
            &mut rng,
            config.dashboard.number_of_sensors,
            start,
            now,
            &config.properties,
            config.dashboard.sample_step(),
        )
    };
    repo.replace_all(&data).await?;

    let total: usize = data.iter().map(Vec::len).sum();
    info!(sensors = data.len(), readings = total, "sensor data loaded");
    Ok(data)
}
