use async_trait::async_trait;
use loam_core::AggregatedPoint;
use sqlx::postgres::PgPool;
use sqlx::Row;
use thiserror::Error;

use super::{AggregateQuery, MeasurementStore};

/// Measurement log backed by Postgres. The log is append-only and owned
/// by the ingestion side; this backend only runs the bounded grouped
/// aggregation.
#[derive(Clone)]
pub struct PgMeasurementLog {
    pool: PgPool,
}

#[derive(Debug, Error)]
pub enum PgLogError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl PgMeasurementLog {
    pub async fn connect(url: &str) -> Result<Self, PgLogError> {
        let pool = PgPool::connect(url).await?;
        Ok(Self { pool })
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MeasurementStore for PgMeasurementLog {
    type Error = PgLogError;

    async fn aggregate(
        &self,
        query: &AggregateQuery,
    ) -> Result<Vec<AggregatedPoint>, Self::Error> {
        // Truncation is pinned to UTC so the bucket starts match the
        // in-process truncation regardless of the session timezone.
        let rows = sqlx::query(
            r#"
            SELECT
                CAST(EXTRACT(EPOCH FROM date_trunc($6, to_timestamp(ts) AT TIME ZONE 'UTC')) AS BIGINT) AS bucket_start,
                AVG(temperature) AS avg_temperature,
                AVG(humidity) AS avg_humidity,
                COUNT(*) AS total_count,
                COUNT(*) FILTER (WHERE status = 'ok') AS ok_count,
                COUNT(*) FILTER (WHERE status = 'error') AS error_count
            FROM device_measurements
            WHERE env = $1
              AND tenant_id = $2
              AND device_id = $3
              AND ts BETWEEN $4 AND $5
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(&query.env)
        .bind(&query.tenant_id)
        .bind(&query.device_id)
        .bind(query.from)
        .bind(query.to)
        .bind(query.bucket.sql_unit())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(AggregatedPoint {
                    bucket_start: row.try_get("bucket_start")?,
                    avg_temperature: row.try_get("avg_temperature")?,
                    avg_humidity: row.try_get("avg_humidity")?,
                    total_count: row.try_get("total_count")?,
                    ok_count: row.try_get("ok_count")?,
                    error_count: row.try_get("error_count")?,
                })
            })
            .collect()
    }
}
