//! External response shapes.
//!
//! Pure shape conversion for the HTTP layer sitting above this crate:
//! camelCase field names, nulls propagated as-is, and the one width
//! narrowing the wire contract asks for (`rssi` is stored wide but
//! displayed as a 32-bit integer). No business logic lives here.

use loam_core::{
    AggregatedPoint, DeviceSnapshot, DroughtStreak, DroughtSummary, RecentSummary,
};
use serde::{Deserialize, Serialize};

use crate::metrics::MetricsBucket;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStateResponse {
    pub device_id: String,
    pub env: String,
    pub tenant_id: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub h: Option<f64>,
    pub t: Option<f64>,
    pub ts_ht: Option<i64>,
    pub rssi: Option<i32>,
    pub snr: Option<f64>,
    pub bat: Option<f64>,
    pub online: Option<bool>,
    pub ts_state: Option<i64>,
}

impl From<DeviceSnapshot> for DeviceStateResponse {
    fn from(s: DeviceSnapshot) -> Self {
        Self {
            device_id: s.device_id,
            env: s.env,
            tenant_id: s.tenant_id,
            lat: s.lat,
            lon: s.lon,
            h: s.humidity,
            t: s.temperature,
            ts_ht: s.ts_ht,
            rssi: s.rssi.map(|v| v as i32),
            snr: s.snr,
            bat: s.battery,
            online: s.online,
            ts_state: s.ts_state,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentDeviceSnapshotResponse {
    pub device_id: String,
    pub last_seen_ts: i64,
    pub t: Option<f64>,
    pub h: Option<f64>,
    pub online: Option<bool>,
    pub rssi: Option<i32>,
    pub snr: Option<f64>,
    pub bat: Option<f64>,
}

impl From<DeviceSnapshot> for RecentDeviceSnapshotResponse {
    fn from(s: DeviceSnapshot) -> Self {
        let last_seen_ts = s.last_seen();
        Self {
            device_id: s.device_id,
            last_seen_ts,
            t: s.temperature,
            h: s.humidity,
            online: s.online,
            rssi: s.rssi.map(|v| v as i32),
            snr: s.snr,
            bat: s.battery,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsPointResponse {
    pub ts: i64,
    pub t_avg: Option<f64>,
    pub h_avg: Option<f64>,
}

impl From<AggregatedPoint> for MetricsPointResponse {
    fn from(p: AggregatedPoint) -> Self {
        Self {
            ts: p.bucket_start,
            t_avg: p.avg_temperature,
            h_avg: p.avg_humidity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetricsResponse {
    pub device_id: String,
    pub bucket: MetricsBucket,
    pub points: Vec<MetricsPointResponse>,
}

impl DeviceMetricsResponse {
    pub fn new(
        device_id: impl Into<String>,
        bucket: MetricsBucket,
        points: Vec<AggregatedPoint>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            bucket,
            points: points.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSummaryResponse {
    pub env: String,
    pub tenant_id: String,
    pub window_seconds: u32,
    pub total_devices: u32,
    pub online_devices: u32,
    pub offline_devices: u32,
    pub avg_temp: Option<f64>,
    pub avg_humidity: Option<f64>,
}

impl From<RecentSummary> for RecentSummaryResponse {
    fn from(s: RecentSummary) -> Self {
        Self {
            env: s.env,
            tenant_id: s.tenant_id,
            window_seconds: s.window_seconds,
            total_devices: s.total_devices,
            online_devices: s.online_devices,
            offline_devices: s.offline_devices,
            avg_temp: s.avg_temp,
            avg_humidity: s.avg_humidity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroughtStreakResponse {
    pub env: String,
    pub tenant_id: String,
    pub device_id: String,
    pub threshold: Option<f64>,
    pub last_ts: Option<i64>,
    pub last_ok_ts: Option<i64>,
    pub streak_days: Option<f64>,
    pub last_h: Option<f64>,
}

impl From<DroughtStreak> for DroughtStreakResponse {
    fn from(s: DroughtStreak) -> Self {
        Self {
            env: s.env,
            tenant_id: s.tenant_id,
            device_id: s.device_id,
            threshold: s.threshold,
            last_ts: s.last_ts,
            last_ok_ts: s.last_ok_ts,
            streak_days: s.streak_days,
            last_h: s.last_humidity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroughtSummaryResponse {
    pub env: String,
    pub tenant_id: String,
    pub threshold: Option<f64>,
    pub devices_in_drought: u32,
    pub max_streak_days: f64,
    pub max_device_id: Option<String>,
}

impl From<DroughtSummary> for DroughtSummaryResponse {
    fn from(s: DroughtSummary) -> Self {
        Self {
            env: s.env,
            tenant_id: s.tenant_id,
            threshold: s.threshold,
            devices_in_drought: s.devices_in_drought,
            max_streak_days: s.max_streak_days,
            max_device_id: s.max_device_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn snapshot() -> DeviceSnapshot {
        DeviceSnapshot {
            device_id: "dev-1".into(),
            env: "prod".into(),
            tenant_id: "acme".into(),
            lat: Some(46.5),
            lon: Some(6.6),
            humidity: Some(55.2),
            temperature: Some(21.0),
            ts_ht: Some(1_690_000_000),
            rssi: Some(-80),
            snr: Some(9.5),
            battery: Some(3.7),
            online: Some(true),
            ts_state: Some(1_690_000_100),
        }
    }

    #[test]
    fn device_state_serializes_with_the_wire_field_names() {
        let value = serde_json::to_value(DeviceStateResponse::from(snapshot())).unwrap();
        assert_eq!(
            value,
            json!({
                "deviceId": "dev-1",
                "env": "prod",
                "tenantId": "acme",
                "lat": 46.5,
                "lon": 6.6,
                "h": 55.2,
                "t": 21.0,
                "tsHt": 1_690_000_000_i64,
                "rssi": -80,
                "snr": 9.5,
                "bat": 3.7,
                "online": true,
                "tsState": 1_690_000_100_i64,
            })
        );
    }

    #[test]
    fn recent_snapshot_carries_the_derived_last_seen() {
        let value =
            serde_json::to_value(RecentDeviceSnapshotResponse::from(snapshot())).unwrap();
        assert_eq!(value["lastSeenTs"], json!(1_690_000_100_i64));
        assert_eq!(value["deviceId"], json!("dev-1"));
        assert_eq!(value["bat"], json!(3.7));
    }

    #[test]
    fn nulls_propagate_into_the_response() {
        let mut s = snapshot();
        s.online = None;
        s.rssi = None;
        let value = serde_json::to_value(DeviceStateResponse::from(s)).unwrap();
        assert_eq!(value["online"], Value::Null);
        assert_eq!(value["rssi"], Value::Null);
    }

    #[test]
    fn metrics_response_tags_the_bucket_and_flattens_points() {
        let points = vec![AggregatedPoint {
            bucket_start: 1_690_002_000,
            avg_temperature: Some(21.5),
            avg_humidity: None,
            total_count: 4,
            ok_count: 3,
            error_count: 1,
        }];

        let response = DeviceMetricsResponse::new("dev-1", MetricsBucket::Hour, points);
        let value = serde_json::to_value(response).unwrap();

        assert_eq!(value["deviceId"], json!("dev-1"));
        assert_eq!(value["bucket"], json!("HOUR"));
        // counts stay internal to the aggregation layer
        assert_eq!(
            value["points"][0],
            json!({"ts": 1_690_002_000_i64, "tAvg": 21.5, "hAvg": Value::Null})
        );
    }

    #[test]
    fn summary_responses_use_the_wire_field_names() {
        let summary = RecentSummary {
            env: "prod".into(),
            tenant_id: "acme".into(),
            window_seconds: 600,
            total_devices: 3,
            online_devices: 2,
            offline_devices: 1,
            avg_temp: Some(19.0),
            avg_humidity: None,
        };
        let value = serde_json::to_value(RecentSummaryResponse::from(summary)).unwrap();
        assert_eq!(value["windowSeconds"], json!(600));
        assert_eq!(value["totalDevices"], json!(3));
        assert_eq!(value["avgHumidity"], Value::Null);

        let drought = DroughtSummary {
            env: "prod".into(),
            tenant_id: "acme".into(),
            threshold: Some(30.0),
            devices_in_drought: 2,
            max_streak_days: 3.5,
            max_device_id: Some("d1".into()),
        };
        let value = serde_json::to_value(DroughtSummaryResponse::from(drought)).unwrap();
        assert_eq!(value["devicesInDrought"], json!(2));
        assert_eq!(value["maxStreakDays"], json!(3.5));
        assert_eq!(value["maxDeviceId"], json!("d1"));
    }

    #[test]
    fn streak_response_passes_fields_through() {
        let streak = DroughtStreak {
            env: "prod".into(),
            tenant_id: "acme".into(),
            device_id: "dev-1".into(),
            threshold: Some(30.0),
            last_ts: Some(1_690_000_000),
            last_ok_ts: None,
            streak_days: Some(2.0),
            last_humidity: Some(24.5),
        };
        let value = serde_json::to_value(DroughtStreakResponse::from(streak)).unwrap();
        assert_eq!(value["streakDays"], json!(2.0));
        assert_eq!(value["lastOkTs"], Value::Null);
        assert_eq!(value["lastH"], json!(24.5));
    }
}
