//! Live per-device state reads.
//!
//! Every lookup is soft-failing: a record that is absent, empty, or
//! unreachable is treated as "no snapshot" and never aborts a sibling
//! lookup. Malformed fields are coerced to `None` by the field parsers.

use std::collections::HashMap;

use futures::future;
use futures::stream::StreamExt;
use loam_core::{DeviceSnapshot, fields};

use crate::keys;
use crate::store::HashStore;

pub struct LiveStateReader<S: HashStore> {
    store: S,
}

impl<S: HashStore> LiveStateReader<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Latest snapshot of one device, `None` when the record is absent,
    /// empty, or the store cannot be reached for this key.
    pub async fn device(
        &self,
        env: &str,
        tenant_id: &str,
        device_id: &str,
    ) -> Option<DeviceSnapshot> {
        let key = keys::device_state(env, tenant_id, device_id);
        let record = match self.store.fetch(&key).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "state fetch failed, treating as absent");
                return None;
            }
        };
        if record.is_empty() {
            return None;
        }
        Some(snapshot_from_record(env, tenant_id, device_id, &record))
    }

    /// All snapshots of a tenant. Devices whose record cannot be read
    /// are omitted; enumeration is partial rather than failing.
    pub async fn devices(&self, env: &str, tenant_id: &str) -> Vec<DeviceSnapshot> {
        let device_ids = self.scan_device_ids(env, tenant_id).await;

        let fetches = device_ids
            .iter()
            .map(|device_id| self.device(env, tenant_id, device_id));

        future::join_all(fetches).await.into_iter().flatten().collect()
    }

    /// Snapshots of the devices seen within the last `window_seconds`.
    /// A device missing both producer timestamps has `last_seen == 0`
    /// and is excluded by any positive window.
    pub async fn recent(
        &self,
        env: &str,
        tenant_id: &str,
        window_seconds: u32,
    ) -> Vec<DeviceSnapshot> {
        let cutoff = jiff::Timestamp::now().as_second() - i64::from(window_seconds);

        self.devices(env, tenant_id)
            .await
            .into_iter()
            .filter(|snapshot| snapshot.last_seen() >= cutoff)
            .collect()
    }

    async fn scan_device_ids(&self, env: &str, tenant_id: &str) -> Vec<String> {
        let pattern = keys::device_state_pattern(env, tenant_id);
        let mut stream = self.store.scan(&pattern);

        let mut device_ids = Vec::new();
        while let Some(next) = stream.next().await {
            match next {
                Ok(key) => {
                    if let Some(device_id) = keys::device_id_from_state_key(&key) {
                        device_ids.push(device_id.to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "key scan interrupted");
                    break;
                }
            }
        }
        device_ids
    }
}

fn snapshot_from_record(
    env: &str,
    tenant_id: &str,
    device_id: &str,
    record: &HashMap<String, String>,
) -> DeviceSnapshot {
    let field = |name: &str| record.get(name).map(String::as_str);

    DeviceSnapshot {
        device_id: device_id.to_string(),
        env: env.to_string(),
        tenant_id: tenant_id.to_string(),
        lat: fields::parse_f64(field("lat")),
        lon: fields::parse_f64(field("lon")),
        humidity: fields::parse_f64(field("h")),
        temperature: fields::parse_f64(field("t")),
        ts_ht: fields::parse_i64(field("ts_ht")),
        rssi: fields::parse_i64(field("rssi")),
        snr: fields::parse_f64(field("snr")),
        battery: fields::parse_f64(field("bat")),
        online: fields::parse_bool(field("online")),
        ts_state: fields::parse_i64(field("ts_state")),
    }
}
