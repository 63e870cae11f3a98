//! Time-bucketed aggregation over the historical measurement log.
//!
//! Aggregation always runs as a single bounded query over a resolved
//! `[from, to]` range; the range defaults are a property of the bucket
//! granularity and determine the default query cost downstream, so they
//! are fixed here and must not drift.

use async_trait::async_trait;
use loam_core::AggregatedPoint;
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryMeasurementLog, MemoryLogError};
pub use postgres::{PgLogError, PgMeasurementLog};

const HOUR_SECS: i64 = 3_600;
const DAY_SECS: i64 = 86_400;
const WEEK_SECS: i64 = 7 * DAY_SECS;

/// Truncation granularity for historical aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricsBucket {
    Hour,
    Day,
    Week,
}

impl MetricsBucket {
    /// Unit name understood by SQL `date_trunc`.
    pub fn sql_unit(&self) -> &'static str {
        match self {
            MetricsBucket::Hour => "hour",
            MetricsBucket::Day => "day",
            MetricsBucket::Week => "week",
        }
    }

    /// Default query lookback when the caller gives no usable range:
    /// 24 hours of hourly buckets, 30 days of daily ones, 26 weeks of
    /// weekly ones.
    pub fn default_lookback_secs(&self) -> i64 {
        match self {
            MetricsBucket::Hour => 24 * HOUR_SECS,
            MetricsBucket::Day => 30 * DAY_SECS,
            MetricsBucket::Week => 26 * WEEK_SECS,
        }
    }

    /// Truncate an epoch-second instant to the start of its bucket, in
    /// UTC. Weeks start on Monday, matching SQL `date_trunc`.
    pub fn truncate(&self, ts: i64) -> i64 {
        match self {
            MetricsBucket::Hour => ts - ts.rem_euclid(HOUR_SECS),
            MetricsBucket::Day => ts - ts.rem_euclid(DAY_SECS),
            MetricsBucket::Week => {
                let day = ts.div_euclid(DAY_SECS);
                // epoch day 0 is a Thursday, three days after a Monday
                let monday = day - (day + 3).rem_euclid(7);
                monday * DAY_SECS
            }
        }
    }
}

/// Resolve the query range. Explicit bounds are used verbatim when both
/// are present and ordered; anything else falls back to
/// `[now - lookback(bucket), now]`.
pub fn resolve_range(
    bucket: MetricsBucket,
    from: Option<i64>,
    to: Option<i64>,
    now: i64,
) -> (i64, i64) {
    if let (Some(from), Some(to)) = (from, to)
        && from < to
    {
        return (from, to);
    }
    (now - bucket.default_lookback_secs(), now)
}

/// A fully-resolved aggregation request. Bounds are always concrete, so
/// backends never see an unbounded scan.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    pub env: String,
    pub tenant_id: String,
    pub device_id: String,
    pub bucket: MetricsBucket,
    /// Inclusive lower bound, epoch seconds.
    pub from: i64,
    /// Inclusive upper bound, epoch seconds.
    pub to: i64,
}

/// Bounded, grouped aggregation over the measurement log.
///
/// Results are one point per non-empty bucket in ascending bucket order;
/// averages ignore null values per column, counts split the records by
/// status.
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn aggregate(&self, query: &AggregateQuery)
    -> Result<Vec<AggregatedPoint>, Self::Error>;
}

/// Entry point for device metric trends. Unlike the snapshot readers,
/// a backend failure here is fatal to the single request and surfaces as
/// an error, distinct from a legitimate empty result.
pub struct MetricsReader<M: MeasurementStore> {
    measurements: M,
}

impl<M: MeasurementStore> MetricsReader<M> {
    pub fn new(measurements: M) -> Self {
        Self { measurements }
    }

    pub async fn device_metrics(
        &self,
        env: &str,
        tenant_id: &str,
        device_id: &str,
        bucket: MetricsBucket,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<Vec<AggregatedPoint>, M::Error> {
        let now = jiff::Timestamp::now().as_second();
        let (from, to) = resolve_range(bucket, from, to, now);

        let query = AggregateQuery {
            env: env.to_string(),
            tenant_id: tenant_id.to_string(),
            device_id: device_id.to_string(),
            bucket,
            from,
            to,
        };

        self.measurements.aggregate(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn explicit_ordered_bounds_are_used_verbatim() {
        for bucket in [MetricsBucket::Hour, MetricsBucket::Day, MetricsBucket::Week] {
            assert_eq!(
                resolve_range(bucket, Some(1_000), Some(2_000), NOW),
                (1_000, 2_000)
            );
        }
    }

    #[test]
    fn missing_bounds_fall_back_per_bucket() {
        assert_eq!(
            resolve_range(MetricsBucket::Hour, None, None, NOW),
            (NOW - 24 * 3_600, NOW)
        );
        assert_eq!(
            resolve_range(MetricsBucket::Day, None, None, NOW),
            (NOW - 30 * 86_400, NOW)
        );
        assert_eq!(
            resolve_range(MetricsBucket::Week, None, None, NOW),
            (NOW - 26 * 7 * 86_400, NOW)
        );
    }

    #[test]
    fn half_open_or_inverted_bounds_fall_back() {
        let hour = MetricsBucket::Hour;
        let default = (NOW - 24 * 3_600, NOW);

        assert_eq!(resolve_range(hour, Some(1_000), None, NOW), default);
        assert_eq!(resolve_range(hour, None, Some(2_000), NOW), default);
        assert_eq!(resolve_range(hour, Some(2_000), Some(2_000), NOW), default);
        assert_eq!(resolve_range(hour, Some(3_000), Some(2_000), NOW), default);
    }

    #[test]
    fn hour_and_day_truncation() {
        // 2023-07-22T05:46:40Z
        let ts = 1_690_004_800;
        assert_eq!(MetricsBucket::Hour.truncate(ts), 1_690_002_000);
        assert_eq!(MetricsBucket::Day.truncate(ts), 1_689_984_000);
        assert_eq!(MetricsBucket::Hour.truncate(1_690_002_000), 1_690_002_000);
    }

    #[test]
    fn week_truncation_lands_on_mondays() {
        // epoch day 0 was a Thursday; its week starts 1969-12-29
        assert_eq!(MetricsBucket::Week.truncate(0), -3 * 86_400);
        // 1970-01-05 was a Monday and truncates to itself
        assert_eq!(MetricsBucket::Week.truncate(4 * 86_400), 4 * 86_400);
        // the following Sunday still belongs to that week
        assert_eq!(
            MetricsBucket::Week.truncate(10 * 86_400 + 7_200),
            4 * 86_400
        );
        // 2023-07-22 was a Saturday; week starts Monday 2023-07-17
        assert_eq!(MetricsBucket::Week.truncate(1_690_004_800), 1_689_552_000);
    }

    #[test]
    fn bucket_serializes_with_uppercase_wire_tags() {
        assert_eq!(
            serde_json::to_string(&MetricsBucket::Hour).unwrap(),
            "\"HOUR\""
        );
        let parsed: MetricsBucket = serde_json::from_str("\"WEEK\"").unwrap();
        assert_eq!(parsed, MetricsBucket::Week);
    }
}
