use serde::{Deserialize, Serialize};

pub mod fields;

/// Latest known state of one field device, as read from the snapshot
/// store. Every field is independently nullable because each is written
/// by a possibly-lagging producer; no single field is authoritative for
/// liveness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub device_id: String,
    pub env: String,
    pub tenant_id: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    /// Epoch seconds of the last humidity/temperature update.
    pub ts_ht: Option<i64>,
    pub rssi: Option<i64>,
    pub snr: Option<f64>,
    pub battery: Option<f64>,
    pub online: Option<bool>,
    /// Epoch seconds of the last online/state update.
    pub ts_state: Option<i64>,
}

impl DeviceSnapshot {
    /// Most recent of the two producer timestamps, 0 when both are
    /// absent.
    pub fn last_seen(&self) -> i64 {
        self.ts_ht.unwrap_or(0).max(self.ts_state.unwrap_or(0))
    }
}

/// Tenant-wide rolling-window rollup, maintained by an external writer
/// over a fixed window. Read-only here; a missing record maps to
/// [`RecentSummary::empty`], not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSummary {
    pub env: String,
    pub tenant_id: String,
    pub window_seconds: u32,
    pub total_devices: u32,
    pub online_devices: u32,
    pub offline_devices: u32,
    pub avg_temp: Option<f64>,
    pub avg_humidity: Option<f64>,
}

impl RecentSummary {
    pub fn empty(env: &str, tenant_id: &str, window_seconds: u32) -> Self {
        Self {
            env: env.to_string(),
            tenant_id: tenant_id.to_string(),
            window_seconds,
            total_devices: 0,
            online_devices: 0,
            offline_devices: 0,
            avg_temp: None,
            avg_humidity: None,
        }
    }
}

/// Per-device consecutive low-humidity counter. Created and reset by the
/// external writer; this layer only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroughtStreak {
    pub env: String,
    pub tenant_id: String,
    pub device_id: String,
    pub threshold: Option<f64>,
    /// Epoch seconds of the last observation.
    pub last_ts: Option<i64>,
    /// Epoch seconds of the last observation at or above the threshold.
    pub last_ok_ts: Option<i64>,
    /// Consecutive days below threshold; fractional, as the producer
    /// writes it.
    pub streak_days: Option<f64>,
    pub last_humidity: Option<f64>,
}

/// Tenant-wide drought rollup derived from the per-device streak
/// records. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroughtSummary {
    pub env: String,
    pub tenant_id: String,
    pub threshold: Option<f64>,
    pub devices_in_drought: u32,
    pub max_streak_days: f64,
    pub max_device_id: Option<String>,
}

impl DroughtSummary {
    pub fn empty(env: &str, tenant_id: &str) -> Self {
        Self {
            env: env.to_string(),
            tenant_id: tenant_id.to_string(),
            threshold: None,
            devices_in_drought: 0,
            max_streak_days: 0.0,
            max_device_id: None,
        }
    }
}

/// Outcome recorded with each historical measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementStatus {
    Ok,
    Error,
}

impl MeasurementStatus {
    /// Wire string stored in the measurement log.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementStatus::Ok => "ok",
            MeasurementStatus::Error => "error",
        }
    }
}

/// One append-only record of the historical measurement log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub env: String,
    pub tenant_id: String,
    pub device_id: String,
    /// Epoch seconds.
    pub ts: i64,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub status: MeasurementStatus,
}

/// Aggregate of the measurements falling into one time bucket.
/// The counts stay internal to the aggregation layer; the externally
/// visible metrics point carries only the start instant and the two
/// averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPoint {
    /// Bucket start, epoch seconds, truncated to the bucket unit.
    pub bucket_start: i64,
    pub avg_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub total_count: i64,
    pub ok_count: i64,
    pub error_count: i64,
}
