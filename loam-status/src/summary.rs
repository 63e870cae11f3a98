//! Tenant-wide rolling summary reads.

use loam_core::{RecentSummary, fields};

use crate::keys;
use crate::store::HashStore;

/// Window length the external writer maintains the rollup over.
pub const RECENT_WINDOW_SECONDS: u32 = 600;

/// Reads the precomputed tenant rollup. This component trusts the
/// external writer entirely and never recomputes the summary from the
/// per-device snapshots; a missing or unreachable record maps to the
/// zero-filled default.
pub struct RecentSummaryReader<S: HashStore> {
    store: S,
}

impl<S: HashStore> RecentSummaryReader<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn summary(&self, env: &str, tenant_id: &str) -> RecentSummary {
        let key = keys::tenant_rollup(env, tenant_id);

        let record = match self.store.fetch(&key).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "rollup fetch failed, returning empty summary");
                return RecentSummary::empty(env, tenant_id, RECENT_WINDOW_SECONDS);
            }
        };
        if record.is_empty() {
            return RecentSummary::empty(env, tenant_id, RECENT_WINDOW_SECONDS);
        }

        let field = |name: &str| record.get(name).map(String::as_str);

        RecentSummary {
            env: env.to_string(),
            tenant_id: tenant_id.to_string(),
            window_seconds: RECENT_WINDOW_SECONDS,
            total_devices: count_field(field("totalDevices")),
            online_devices: count_field(field("onlineDevices")),
            offline_devices: count_field(field("offlineDevices")),
            avg_temp: fields::parse_f64(field("avgTemp")),
            avg_humidity: fields::parse_f64(field("avgHumidity")),
        }
    }
}

/// Device counters default to zero on blank, malformed, or negative
/// input; averages stay nullable.
fn count_field(value: Option<&str>) -> u32 {
    fields::parse_i64(value)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}
