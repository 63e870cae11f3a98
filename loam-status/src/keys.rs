//! Key schema shared with the external writer.
//!
//! Snapshot records are string-valued hashes keyed by environment,
//! tenant, and device id. The writer owns these formats; readers build
//! the same keys and extract device ids from scanned ones. A key that
//! does not follow the scheme extracts to `None` and is skipped by the
//! scanning readers.

const DEVICE_SEGMENT: &str = ":device:";
const STATE_SUFFIX: &str = ":state";
const STREAK_SUFFIX: &str = ":humidity_low_streak";

pub fn device_state(env: &str, tenant_id: &str, device_id: &str) -> String {
    format!("pvz:{env}:{tenant_id}:device:{device_id}:state")
}

pub fn device_state_pattern(env: &str, tenant_id: &str) -> String {
    format!("pvz:{env}:{tenant_id}:device:*:state")
}

pub fn drought_streak(env: &str, tenant_id: &str, device_id: &str) -> String {
    format!("pvz:{env}:{tenant_id}:device:{device_id}:humidity_low_streak")
}

pub fn drought_streak_pattern(env: &str, tenant_id: &str) -> String {
    format!("pvz:{env}:{tenant_id}:device:*:humidity_low_streak")
}

/// The tenant rollup record lives outside the `pvz:` namespace.
pub fn tenant_rollup(env: &str, tenant_id: &str) -> String {
    format!("{env}:{tenant_id}")
}

pub fn device_id_from_state_key(key: &str) -> Option<&str> {
    device_id_between(key, STATE_SUFFIX)
}

pub fn device_id_from_streak_key(key: &str) -> Option<&str> {
    device_id_between(key, STREAK_SUFFIX)
}

fn device_id_between<'a>(key: &'a str, suffix: &str) -> Option<&'a str> {
    let start = key.find(DEVICE_SEGMENT)? + DEVICE_SEGMENT.len();
    let end = key.rfind(suffix)?;
    if end <= start {
        return None;
    }
    Some(&key[start..end])
}
