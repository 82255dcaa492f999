// ── Derived metric types ──
//
// Output of the calculator. Raw windowed counters are consumed while
// building these; only ratios, utilizations and session counts remain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use vsxmon_api::Report;

use super::fields::TrunkId;
use super::media::MediaServer;
use super::system::SystemStat;

/// Direction of a windowed call-counter group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallDirection {
    /// From `ingress_stat`.
    Ingress,
    /// From `egress_stat`.
    Egress,
    /// From `gw_egress_stat`.
    GwEgress,
}

impl CallDirection {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ingress => "Ingress",
            Self::Egress => "Egress",
            Self::GwEgress => "Gateway egress",
        }
    }
}

/// Ratios derived from one direction's counters over the selected window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallStats {
    pub avg_postdial_delay_sec: f64,
    pub avg_call_duration_sec: f64,
    pub failed_call_ratio_pct: f64,
    pub answer_seize_ratio_pct: f64,
}

/// Live session counts and capacity utilization for a trunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RealtimeStats {
    pub origination_sessions: u64,
    pub termination_sessions: u64,
    pub origination_utilization_pct: f64,
    pub termination_utilization_pct: f64,
}

/// Derived groups for one trunk.
///
/// A direction without call attempts in the window has no entry at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatedStats {
    #[serde(flatten)]
    pub calls: BTreeMap<CallDirection, CallStats>,
    pub realtime: RealtimeStats,
}

impl CalculatedStats {
    pub fn direction(&self, direction: CallDirection) -> Option<&CallStats> {
        self.calls.get(&direction)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrunkMetrics {
    pub id: TrunkId,
    pub recid: Option<String>,
    pub alias: Option<String>,
    /// Directions whose counter tables were present in the resource dump.
    pub reported_directions: Vec<CallDirection>,
    pub calculated_stats: CalculatedStats,
}

impl TrunkMetrics {
    pub fn display_name(&self) -> &str {
        self.alias
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(self.id.as_str())
    }
}

/// Derived system-wide figures plus the normalized counters they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// `100 - cpu_idle_percent`; `None` when the device omitted idle time.
    pub cpu_utilization_pct: Option<f64>,
    /// `None` when capacity is zero/unknown or active sessions are unknown.
    pub session_utilization_pct: Option<f64>,
    pub stat: SystemStat,
}

/// Everything the evaluator sees for one device and one cycle.
///
/// `None` sections had no usable data (fetch failure, malformed document
/// or not selected) and are reported as such rather than as zeroes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetrics {
    pub trunks: Option<BTreeMap<TrunkId, TrunkMetrics>>,
    pub system: Option<SystemMetrics>,
    pub media_servers: Option<Vec<MediaServer>>,
}

impl DeviceMetrics {
    /// Whether the section fed by `report` has data this cycle.
    pub fn has_section(&self, report: Report) -> bool {
        match report {
            Report::Resource => self.trunks.is_some(),
            Report::Realtime => self.system.is_some(),
            Report::MediaServer => self.media_servers.is_some(),
        }
    }
}
