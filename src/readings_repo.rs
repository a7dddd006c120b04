// SQLite store for raw readings. One row per reading; the reading itself is kept as JSON
// so pass-through metadata survives unchanged. created_at (ms) is only used for ordering.

use crate::aggregation::calendar::parse_instant;
use crate::models::Reading;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::sync::{Mutex, MutexGuard};
use tracing::instrument;

/// Row count per stored sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSummary {
    pub sensor: u32,
    pub readings: i64,
}

pub struct ReadingsRepo {
    pool: SqlitePool,
    /// Serializes writers that derive new rows from what is already stored.
    writer: Mutex<()>,
}

impl ReadingsRepo {
    pub async fn connect(path: &str) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Ok(Self {
            pool,
            writer: Mutex::new(()),
        })
    }

    /// Exclusive write access. Hold it across a read-then-append sequence;
    /// `replace_all` takes it on its own.
    pub async fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sensor_readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sensor INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_readings_sensor_created_at \
             ON sensor_readings(sensor, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Appends readings for one sensor in a single transaction.
    #[instrument(
        skip(self, readings),
        fields(
            repo = "readings",
            operation = "save_sensor_readings",
            readings_count = readings.len()
        )
    )]
    pub async fn save_sensor_readings(
        &self,
        sensor: u32,
        readings: &[Reading],
    ) -> anyhow::Result<()> {
        if readings.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for r in readings {
            insert_reading(&mut tx, sensor, r).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Drops every stored reading and stores `series[i]` as sensor i.
    #[instrument(
        skip(self, series),
        fields(repo = "readings", operation = "replace_all", sensors = series.len())
    )]
    pub async fn replace_all(&self, series: &[Vec<Reading>]) -> anyhow::Result<()> {
        let _guard = self.write_guard().await;
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM sensor_readings")
            .execute(&mut *tx)
            .await?;
        for (sensor, readings) in series.iter().enumerate() {
            for r in readings {
                insert_reading(&mut tx, sensor as u32, r).await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    /// Readings of one sensor, ascending by time (insertion order for ties).
    #[instrument(skip(self), fields(repo = "readings", operation = "load_sensor_readings"))]
    pub async fn load_sensor_readings(&self, sensor: u32) -> anyhow::Result<Vec<Reading>> {
        let rows = sqlx::query(
            "SELECT data FROM sensor_readings WHERE sensor = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(i64::from(sensor))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_reading_row(&row)?);
        }
        Ok(out)
    }

    /// Every stored series, ordered by sensor index.
    #[instrument(skip(self), fields(repo = "readings", operation = "load_all"))]
    pub async fn load_all(&self) -> anyhow::Result<Vec<Vec<Reading>>> {
        let rows = sqlx::query(
            "SELECT sensor, data FROM sensor_readings ORDER BY sensor ASC, created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out: Vec<Vec<Reading>> = Vec::new();
        let mut current: Option<i64> = None;
        for row in rows {
            let sensor: i64 = row.try_get("sensor")?;
            if current != Some(sensor) {
                out.push(Vec::new());
                current = Some(sensor);
            }
            let reading = Self::parse_reading_row(&row)?;
            if let Some(series) = out.last_mut() {
                series.push(reading);
            }
        }
        Ok(out)
    }

    pub async fn sensor_summaries(&self) -> anyhow::Result<Vec<SensorSummary>> {
        let rows = sqlx::query(
            "SELECT sensor, COUNT(*) AS readings FROM sensor_readings \
             GROUP BY sensor ORDER BY sensor ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let sensor: i64 = row.try_get("sensor")?;
            out.push(SensorSummary {
                sensor: u32::try_from(sensor)?,
                readings: row.try_get("readings")?,
            });
        }
        Ok(out)
    }

    /// Latest stored instant (ms since epoch) for a sensor.
    pub async fn latest_created_at(&self, sensor: u32) -> anyhow::Result<Option<i64>> {
        let row = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(created_at) FROM sensor_readings WHERE sensor = $1",
        )
        .bind(i64::from(sensor))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[instrument(skip(self), fields(repo = "readings", operation = "clear"))]
    pub async fn clear(&self) -> anyhow::Result<u64> {
        let r = sqlx::query("DELETE FROM sensor_readings")
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }

    fn parse_reading_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Reading> {
        let data: String = row.try_get("data")?;
        Ok(serde_json::from_str(&data)?)
    }
}

async fn insert_reading(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    sensor: u32,
    reading: &Reading,
) -> anyhow::Result<()> {
    let created_at = parse_instant(&reading.datetime)?.timestamp_millis();
    let data = serde_json::to_string(reading)?;
    sqlx::query("INSERT INTO sensor_readings (sensor, created_at, data) VALUES ($1, $2, $3)")
        .bind(i64::from(sensor))
        .bind(created_at)
        .bind(&data)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
