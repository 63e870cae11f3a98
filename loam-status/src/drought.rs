//! Drought-streak reads and the tenant-wide drought rollup.

use std::collections::HashMap;

use futures::future;
use futures::stream::StreamExt;
use loam_core::{DroughtStreak, DroughtSummary, fields};

use crate::keys;
use crate::store::HashStore;

pub struct DroughtReader<S: HashStore> {
    store: S,
}

impl<S: HashStore> DroughtReader<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Streak record of one device. `None` when the record is absent or
    /// unreachable; a present record with `streak_days: 0` is a distinct,
    /// populated result.
    pub async fn streak(
        &self,
        env: &str,
        tenant_id: &str,
        device_id: &str,
    ) -> Option<DroughtStreak> {
        let key = keys::drought_streak(env, tenant_id, device_id);
        let record = match self.store.fetch(&key).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "streak fetch failed, treating as absent");
                return None;
            }
        };
        if record.is_empty() {
            return None;
        }
        Some(streak_from_record(env, tenant_id, device_id, &record))
    }

    /// Tenant-wide drought rollup over every readable streak record.
    ///
    /// The representative threshold is the first non-null one
    /// encountered in key order; records are expected, not guaranteed,
    /// to share a threshold, and no reconciliation is attempted when
    /// they diverge. Unreadable or empty records are skipped, as are
    /// records without a parsable `streak_days`.
    pub async fn summary(&self, env: &str, tenant_id: &str) -> DroughtSummary {
        let streak_keys = self.scan_streak_keys(env, tenant_id).await;

        let fetches = streak_keys.iter().map(|key| async move {
            match self.store.fetch(key).await {
                Ok(record) => Some((key.as_str(), record)),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "streak fetch failed, skipping record");
                    None
                }
            }
        });

        let mut summary = DroughtSummary::empty(env, tenant_id);

        for (key, record) in future::join_all(fetches).await.into_iter().flatten() {
            if record.is_empty() {
                continue;
            }

            if summary.threshold.is_none() {
                summary.threshold = fields::parse_f64(record.get("threshold").map(String::as_str));
            }

            let Some(days) = fields::parse_f64(record.get("streak_days").map(String::as_str))
            else {
                continue;
            };

            if days > 0.0 {
                summary.devices_in_drought += 1;
            }
            if days > summary.max_streak_days {
                summary.max_streak_days = days;
                summary.max_device_id =
                    keys::device_id_from_streak_key(key).map(str::to_string);
            }
        }

        summary
    }

    async fn scan_streak_keys(&self, env: &str, tenant_id: &str) -> Vec<String> {
        let pattern = keys::drought_streak_pattern(env, tenant_id);
        let mut stream = self.store.scan(&pattern);

        let mut streak_keys = Vec::new();
        while let Some(next) = stream.next().await {
            match next {
                Ok(key) => streak_keys.push(key),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "key scan interrupted");
                    break;
                }
            }
        }
        streak_keys
    }
}

fn streak_from_record(
    env: &str,
    tenant_id: &str,
    device_id: &str,
    record: &HashMap<String, String>,
) -> DroughtStreak {
    let field = |name: &str| record.get(name).map(String::as_str);

    DroughtStreak {
        env: env.to_string(),
        tenant_id: tenant_id.to_string(),
        device_id: device_id.to_string(),
        threshold: fields::parse_f64(field("threshold")),
        last_ts: fields::parse_i64(field("last_ts")),
        last_ok_ts: fields::parse_i64(field("last_ok_ts")),
        streak_days: fields::parse_f64(field("streak_days")),
        last_humidity: fields::parse_f64(field("last_h")),
    }
}
