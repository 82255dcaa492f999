// vsxmon-core: Normalization, derived metrics and threshold evaluation
// between vsxmon-api and consumers (CLI).

pub mod calculate;
pub mod check;
pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod poller;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use calculate::CounterWindow;
pub use check::{
    CheckResult, Direction, Evaluator, LevelSpec, Metric, Service, ServiceItem, ServiceResult,
    State, Thresholds, discover,
};
pub use config::{DeviceConfig, TlsVerification};
pub use error::CoreError;
pub use normalize::NoData;
pub use poller::{FetchFailure, Fetched, Polled, Poller, build_metrics, build_snapshot};
pub use store::{FileSampleStore, MemorySampleStore, Sample, SampleStore};

pub use model::{
    CallDirection, CallStats, CalculatedStats, DeviceMetrics, DeviceSnapshot, MediaServer,
    MediaStatus, RawSections, RealtimeStats, SystemMetrics, SystemStat, Trunk, TrunkId,
    TrunkMetrics,
};

pub use vsxmon_api::{Report, RetryPolicy};
