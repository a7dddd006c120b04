// Loader and refresh worker tests against a temporary SQLite database

use chrono::{DateTime, Utc};
use sensorboard::aggregation::calendar::parse_instant;
use sensorboard::config::AppConfig;
use sensorboard::loader::load_sensor_data;
use sensorboard::readings_repo::ReadingsRepo;
use sensorboard::refresh_worker::{self, RefreshWorkerConfig};
use tempfile::TempDir;

const TEST_CONFIG: &str = r#"
[server]
port = 8081
host = "127.0.0.1"

[database]
path = "unused.db"

[dashboard]
start_date = "2024-01-01T00:00:00Z"
number_of_sensors = 2
sample_interval_minutes = 30
"#;

fn at(s: &str) -> DateTime<Utc> {
    parse_instant(s).unwrap()
}

async fn open_repo(dir: &TempDir) -> ReadingsRepo {
    let path = dir.path().join("sensors.db");
    let repo = ReadingsRepo::connect(path.to_str().unwrap()).await.unwrap();
    repo.init().await.unwrap();
    repo
}

fn worker_config(config: &AppConfig) -> RefreshWorkerConfig {
    RefreshWorkerConfig {
        refresh_interval_secs: 3600,
        sample_step: config.dashboard.sample_step(),
        properties: config.properties.clone(),
    }
}

#[tokio::test]
async fn loader_generates_and_stores_every_sensor() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();

    let data = load_sensor_data(&repo, &config, at("2024-01-01T01:00:00Z"))
        .await
        .unwrap();
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|s| s.len() == 3));
    assert_eq!(repo.load_all().await.unwrap(), data);
}

#[tokio::test]
async fn loader_replaces_previous_data() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();

    load_sensor_data(&repo, &config, at("2024-01-02T00:00:00Z"))
        .await
        .unwrap();
    let data = load_sensor_data(&repo, &config, at("2024-01-01T00:30:00Z"))
        .await
        .unwrap();
    let summaries = repo.sensor_summaries().await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert!(summaries.iter().all(|s| s.readings == 2));
    assert_eq!(repo.load_all().await.unwrap(), data);
}

#[tokio::test]
async fn refresh_tick_appends_up_to_now() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();
    load_sensor_data(&repo, &config, at("2024-01-01T01:00:00Z"))
        .await
        .unwrap();

    let appended =
        refresh_worker::run_one_tick(&repo, &worker_config(&config), at("2024-01-01T02:10:00Z"))
            .await
            .unwrap();
    // 01:30 and 02:00 for each of the two sensors.
    assert_eq!(appended, 4);

    let readings = repo.load_sensor_readings(1).await.unwrap();
    let times: Vec<&str> = readings.iter().map(|r| r.datetime.as_str()).collect();
    assert_eq!(
        times,
        vec![
            "2024-01-01T00:00:00.000Z",
            "2024-01-01T00:30:00.000Z",
            "2024-01-01T01:00:00.000Z",
            "2024-01-01T01:30:00.000Z",
            "2024-01-01T02:00:00.000Z",
        ]
    );
    assert_eq!(readings[4].properties["kWh"].name, "Sensor_2");

    // Nothing new until another step has elapsed.
    let again =
        refresh_worker::run_one_tick(&repo, &worker_config(&config), at("2024-01-01T02:10:00Z"))
            .await
            .unwrap();
    assert_eq!(again, 0);
}

#[tokio::test]
async fn refresh_worker_stops_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let repo = std::sync::Arc::new(open_repo(&dir).await);
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    let handle = refresh_worker::spawn(repo, worker_config(&config), rx);
    tx.send(()).unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("worker exits")
        .unwrap();
}

#[tokio::test]
async fn refresh_tick_and_regenerate_do_not_interleave() {
    let dir = TempDir::new().unwrap();
    let repo = std::sync::Arc::new(open_repo(&dir).await);
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();
    load_sensor_data(&repo, &config, at("2024-01-01T01:00:00Z"))
        .await
        .unwrap();

    let guard = repo.write_guard().await;
    let tick = {
        let repo = repo.clone();
        let worker = worker_config(&config);
        tokio::spawn(async move {
            refresh_worker::run_one_tick(&repo, &worker, at("2024-01-01T03:00:00Z")).await
        })
    };
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let regenerate = {
        let repo = repo.clone();
        let config = config.clone();
        tokio::spawn(async move {
            load_sensor_data(&repo, &config, at("2024-01-01T03:00:00Z")).await
        })
    };
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!tick.is_finished());
    assert!(!regenerate.is_finished());

    drop(guard);
    tick.await.unwrap().unwrap();
    regenerate.await.unwrap().unwrap();

    for sensor in 0..2 {
        let readings = repo.load_sensor_readings(sensor).await.unwrap();
        let times: Vec<&str> = readings.iter().map(|r| r.datetime.as_str()).collect();
        let mut unique = times.clone();
        unique.dedup();
        assert_eq!(unique, times, "sensor {sensor} has duplicate timestamps");
        assert_eq!(times.len(), 7);
    }
}
