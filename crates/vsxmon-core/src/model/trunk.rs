// ── Trunk domain types ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::fields::{FieldMap, TrunkId};

/// Resource table carrying ingress counters.
pub const INGRESS_TABLE: &str = "ingress_stat";
/// Resource table carrying gateway egress counters.
pub const GW_EGRESS_TABLE: &str = "gw_egress_stat";
/// Resource table carrying plain egress counters (older firmware).
pub const EGRESS_TABLE: &str = "egress_stat";

/// Realtime counter field names, in device order.
pub const REALTIME_COUNTERS: [&str; 8] = [
    "numOrig",
    "numTerm",
    "cps",
    "numPeak",
    "totalCLZ",
    "numCLZCps",
    "totalLimit",
    "cpsLimit",
];

/// One trunk as enumerated by the resource dump, before merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTrunk {
    pub recid: Option<String>,
    pub alias: Option<String>,
    /// Table name -> first row seen for this trunk in that table.
    pub tables: BTreeMap<String, FieldMap>,
}

/// Live session counters for a trunk.
///
/// Every field defaults to zero: the device omits idle trunks from the
/// realtime dump, and an omitted trunk has no sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeCounters {
    #[serde(rename = "numOrig")]
    pub num_orig: u64,
    #[serde(rename = "numTerm")]
    pub num_term: u64,
    pub cps: u64,
    #[serde(rename = "numPeak")]
    pub num_peak: u64,
    #[serde(rename = "totalCLZ")]
    pub total_clz: u64,
    #[serde(rename = "numCLZCps")]
    pub num_clz_cps: u64,
    #[serde(rename = "totalLimit")]
    pub total_limit: u64,
    #[serde(rename = "cpsLimit")]
    pub cps_limit: u64,
}

impl RealtimeCounters {
    /// All eight counters at zero.
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// Read the eight known counters from a realtime row; absent or
    /// unparseable counters are zero.
    pub fn from_fields(fields: &FieldMap) -> Self {
        let get = |name: &str| fields.count(name).unwrap_or(0);
        Self {
            num_orig: get("numOrig"),
            num_term: get("numTerm"),
            cps: get("cps"),
            num_peak: get("numPeak"),
            total_clz: get("totalCLZ"),
            num_clz_cps: get("numCLZCps"),
            total_limit: get("totalLimit"),
            cps_limit: get("cpsLimit"),
        }
    }

    /// Counter values keyed by their device field names.
    pub fn as_pairs(&self) -> [(&'static str, u64); 8] {
        [
            ("numOrig", self.num_orig),
            ("numTerm", self.num_term),
            ("cps", self.cps),
            ("numPeak", self.num_peak),
            ("totalCLZ", self.total_clz),
            ("numCLZCps", self.num_clz_cps),
            ("totalLimit", self.total_limit),
            ("cpsLimit", self.cps_limit),
        ]
    }
}

/// Which resource table the egress counters came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EgressKind {
    /// `gw_egress_stat`
    Gateway,
    /// `egress_stat`
    Plain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgressStat {
    pub kind: EgressKind,
    pub counters: FieldMap,
}

/// The merged trunk entity: configuration, windowed counters and
/// realtime counters for one polling cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trunk {
    pub id: TrunkId,
    pub recid: Option<String>,
    pub alias: Option<String>,
    pub ingress_stat: Option<FieldMap>,
    pub egress_stat: Option<EgressStat>,
    pub realtime_stat: RealtimeCounters,
    /// `false` when the realtime counters were zero-filled.
    pub realtime_sampled: bool,
}

impl Trunk {
    /// Human-facing label: alias if the device has one, else the id.
    pub fn display_name(&self) -> &str {
        self.alias
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(self.id.as_str())
    }
}
