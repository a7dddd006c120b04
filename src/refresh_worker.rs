// Background worker: every refresh_interval_secs, extend each stored series up to now
// so the dashboard keeps receiving simulated readings while running.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument, warn};

use crate::config::PropertySettings;
use crate::generator;
use crate::readings_repo::ReadingsRepo;

/// Config for the refresh worker.
#[derive(Debug, Clone)]
pub struct RefreshWorkerConfig {
    pub refresh_interval_secs: u64,
    pub sample_step: TimeDelta,
    pub properties: IndexMap<String, PropertySettings>,
}

/// Spawns the refresh worker. Exits when `shutdown_rx` fires or its sender is dropped.
pub fn spawn(
    repo: Arc<ReadingsRepo>,
    config: RefreshWorkerConfig,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(repo, config, shutdown_rx).await;
    })
}

#[instrument(
    skip(repo, config, shutdown_rx),
    fields(interval_secs = config.refresh_interval_secs)
)]
async fn run(
    repo: Arc<ReadingsRepo>,
    config: RefreshWorkerConfig,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) {
    let mut tick = tokio::time::interval(Duration::from_secs(config.refresh_interval_secs));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(e) = run_one_tick(&repo, &config, Utc::now()).await {
                    warn!(error = %e, "refresh tick failed");
                }
            }
            _ = &mut shutdown_rx => {
                info!("refresh worker shutting down");
                break;
            }
        }
    }
}

/// Appends readings from (latest stored + step) through `now` for every stored sensor.
/// Returns the number of readings appended. Holds the repo's write guard throughout, so a
/// concurrent regenerate either runs before the tick reads or after it has appended.
pub async fn run_one_tick(
    repo: &ReadingsRepo,
    config: &RefreshWorkerConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<usize> {
    let _guard = repo.write_guard().await;
    let mut appended: usize = 0;

    for summary in repo.sensor_summaries().await? {
        let Some(latest_ms) = repo.latest_created_at(summary.sensor).await? else {
            continue;
        };
        let Some(latest) = DateTime::from_timestamp_millis(latest_ms) else {
            warn!(sensor = summary.sensor, latest_ms, "stored timestamp out of range");
            continue;
        };
        let readings = {
            let mut rng = StdRng::from_entropy();
            generator::generate_sensor_data(
                &mut rng,
                latest + config.sample_step,
                now,
                &config.properties,
                summary.sensor,
                config.sample_step,
            )
        };
        if readings.is_empty() {
            continue;
        }
        repo.save_sensor_readings(summary.sensor, &readings).await?;
        appended += readings.len();
    }

    if appended > 0 {
        info!(appended, "appended simulated readings");
    }
    Ok(appended)
}
