//! Read and aggregation layer for field-device status.
//!
//! Live per-device snapshots, tenant rollups, and drought streaks come
//! from a loosely-typed key-value snapshot store; metric trends come
//! from a bounded, time-bucketed aggregation over the historical
//! measurement log. Both stores are owned by external writers; this
//! crate only reads.

pub mod config;
pub mod drought;
pub mod keys;
pub mod live;
pub mod metrics;
pub mod response;
pub mod store;
pub mod summary;

pub use drought::DroughtReader;
pub use live::LiveStateReader;
pub use metrics::{MetricsBucket, MetricsReader};
pub use summary::{RECENT_WINDOW_SECONDS, RecentSummaryReader};
