use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use loam_core::{AggregatedPoint, Measurement, MeasurementStatus};
use thiserror::Error;

use super::{AggregateQuery, MeasurementStore};

/// In-memory measurement log. Primarily intended for testing and as a
/// reference implementation of the aggregation semantics the SQL backend
/// delegates to the database.
#[derive(Clone, Default)]
pub struct InMemoryMeasurementLog {
    measurements: Arc<Mutex<Vec<Measurement>>>,
}

#[derive(Debug, Error)]
pub enum MemoryLogError {
    #[error("internal error: {0}")]
    Internal(String),
}

impl InMemoryMeasurementLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record, as the external producer would.
    pub fn record(&self, measurement: Measurement) -> Result<(), MemoryLogError> {
        let mut measurements = self
            .measurements
            .lock()
            .map_err(|_| MemoryLogError::Internal("measurements mutex poisoned".into()))?;
        measurements.push(measurement);
        Ok(())
    }

    pub fn record_batch(
        &self,
        batch: impl IntoIterator<Item = Measurement>,
    ) -> Result<(), MemoryLogError> {
        let mut measurements = self
            .measurements
            .lock()
            .map_err(|_| MemoryLogError::Internal("measurements mutex poisoned".into()))?;
        measurements.extend(batch);
        Ok(())
    }
}

#[derive(Default)]
struct BucketAccumulator {
    temp_sum: f64,
    temp_count: i64,
    humidity_sum: f64,
    humidity_count: i64,
    total: i64,
    ok: i64,
    error: i64,
}

impl BucketAccumulator {
    fn push(&mut self, m: &Measurement) {
        if let Some(t) = m.temperature {
            self.temp_sum += t;
            self.temp_count += 1;
        }
        if let Some(h) = m.humidity {
            self.humidity_sum += h;
            self.humidity_count += 1;
        }
        self.total += 1;
        match m.status {
            MeasurementStatus::Ok => self.ok += 1,
            MeasurementStatus::Error => self.error += 1,
        }
    }

    fn finish(self, bucket_start: i64) -> AggregatedPoint {
        AggregatedPoint {
            bucket_start,
            avg_temperature: (self.temp_count > 0)
                .then(|| self.temp_sum / self.temp_count as f64),
            avg_humidity: (self.humidity_count > 0)
                .then(|| self.humidity_sum / self.humidity_count as f64),
            total_count: self.total,
            ok_count: self.ok,
            error_count: self.error,
        }
    }
}

#[async_trait]
impl MeasurementStore for InMemoryMeasurementLog {
    type Error = MemoryLogError;

    async fn aggregate(
        &self,
        query: &AggregateQuery,
    ) -> Result<Vec<AggregatedPoint>, Self::Error> {
        let measurements = self
            .measurements
            .lock()
            .map_err(|_| MemoryLogError::Internal("measurements mutex poisoned".into()))?;

        // BTreeMap keeps buckets in ascending order; buckets with no
        // matching record are never materialized.
        let mut buckets: BTreeMap<i64, BucketAccumulator> = BTreeMap::new();

        for m in measurements.iter() {
            if m.env != query.env
                || m.tenant_id != query.tenant_id
                || m.device_id != query.device_id
            {
                continue;
            }
            if m.ts < query.from || m.ts > query.to {
                continue;
            }
            buckets
                .entry(query.bucket.truncate(m.ts))
                .or_default()
                .push(m);
        }

        Ok(buckets
            .into_iter()
            .map(|(bucket_start, acc)| acc.finish(bucket_start))
            .collect())
    }
}
