// ── Domain model ──
//
// Canonical types for one monitored VSX: raw report documents, normalized
// sections, the merged entity set and the derived metrics built from it.

pub mod fields;
pub mod media;
pub mod metrics;
pub mod system;
pub mod trunk;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use fields::{FieldMap, TrunkId};
pub use media::{MediaServer, MediaStatus};
pub use metrics::{
    CallDirection, CallStats, CalculatedStats, DeviceMetrics, RealtimeStats, SystemMetrics,
    TrunkMetrics,
};
pub use system::SystemStat;
pub use trunk::{EgressKind, EgressStat, RealtimeCounters, ResourceTrunk, Trunk};

/// The three report documents of one cycle, as fetched.
///
/// `None` means the report was not fetched or the fetch failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSections {
    pub resource: Option<Value>,
    pub realtime: Option<Value>,
    pub media_server: Option<Value>,
}

/// Normalized resource dump: every trunk the device has configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSection {
    pub trunks: BTreeMap<TrunkId, ResourceTrunk>,
}

/// Normalized realtime dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealtimeSection {
    pub system: Option<SystemStat>,
    /// Live rows of active trunks, `Group` roll-ups removed.
    pub trunks: BTreeMap<TrunkId, FieldMap>,
}

/// The merged entity set of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub trunks: Option<BTreeMap<TrunkId, Trunk>>,
    pub system: Option<SystemStat>,
    pub media_servers: Option<Vec<MediaServer>>,
}
