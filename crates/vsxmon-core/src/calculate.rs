// ── Derived metric calculation ──
//
// Turns windowed call counters and live session counters into ratios and
// utilizations. Division is never attempted against a zero denominator:
// call groups without attempts are omitted, zero trunk capacity reads as
// zero utilization and unknown system capacity leaves the metric unset.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{
    CallDirection, CallStats, CalculatedStats, DeviceMetrics, DeviceSnapshot, EgressKind,
    FieldMap, RealtimeCounters, RealtimeStats, SystemMetrics, SystemStat, Trunk, TrunkMetrics,
};

/// Which of the device's rolling counter windows to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterWindow {
    /// The most recent complete 15-minute bucket (`1st15mins_*`).
    #[default]
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "24h")]
    Day,
}

impl CounterWindow {
    /// Field-name prefix of the window's counters.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::FifteenMinutes => "1st15mins_",
            Self::Hour => "1h_",
            Self::Day => "24h_",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FifteenMinutes => "15m",
            Self::Hour => "1h",
            Self::Day => "24h",
        }
    }
}

impl fmt::Display for CounterWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CounterWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "15m" | "15min" | "1st15mins" => Ok(Self::FifteenMinutes),
            "1h" => Ok(Self::Hour),
            "24h" | "1d" => Ok(Self::Day),
            other => Err(format!(
                "unknown counter window '{other}' (expected 15m, 1h or 24h)"
            )),
        }
    }
}

/// Round to one decimal place.
///
/// Rounds the exact binary value, ties to even: `0.25` gives `0.2` and
/// `0.35` (stored just below 0.35) gives `0.3`.
pub fn round1(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

// ── Per-trunk figures ──────────────────────────────────────────────

/// Ratios for one direction's counters, or `None` without call attempts.
pub fn call_stats(counters: &FieldMap, window: CounterWindow) -> Option<CallStats> {
    let read = |name: &str| {
        counters
            .number(&format!("{}{name}", window.prefix()))
            .unwrap_or(0.0)
    };

    let attempts = read("call_attempt");
    if attempts <= 0.0 {
        return None;
    }

    // Window counters are not sampled atomically; keep percentages in range.
    let pct = |part: f64| round1((part / attempts * 100.0).clamp(0.0, 100.0));

    Some(CallStats {
        avg_postdial_delay_sec: round1(read("pdd_ms") / attempts / 1000.0),
        avg_call_duration_sec: round1(read("call_durationSec") / attempts),
        failed_call_ratio_pct: pct(read("call_fail")),
        answer_seize_ratio_pct: pct(read("call_answer")),
    })
}

/// Session counts and capacity utilization. A zero `totalLimit` means the
/// trunk has no realtime cap and reads as 0% utilization.
#[allow(clippy::as_conversions, clippy::cast_precision_loss)]
pub fn realtime_stats(counters: &RealtimeCounters) -> RealtimeStats {
    let utilization = |sessions: u64| {
        if counters.total_limit == 0 {
            0.0
        } else {
            round1(sessions as f64 / counters.total_limit as f64 * 100.0)
        }
    };
    RealtimeStats {
        origination_sessions: counters.num_orig,
        termination_sessions: counters.num_term,
        origination_utilization_pct: utilization(counters.num_orig),
        termination_utilization_pct: utilization(counters.num_term),
    }
}

/// Derive a trunk's metrics; raw counters do not survive the conversion.
pub fn trunk_metrics(trunk: Trunk, window: CounterWindow) -> TrunkMetrics {
    let mut reported_directions = Vec::new();
    let mut calls = BTreeMap::new();

    let ingress = trunk
        .ingress_stat
        .as_ref()
        .map(|counters| (CallDirection::Ingress, counters));
    let egress = trunk.egress_stat.as_ref().map(|egress| {
        let direction = match egress.kind {
            EgressKind::Gateway => CallDirection::GwEgress,
            EgressKind::Plain => CallDirection::Egress,
        };
        (direction, &egress.counters)
    });

    for (direction, counters) in ingress.into_iter().chain(egress) {
        reported_directions.push(direction);
        if let Some(stats) = call_stats(counters, window) {
            calls.insert(direction, stats);
        }
    }

    let realtime = realtime_stats(&trunk.realtime_stat);
    TrunkMetrics {
        id: trunk.id,
        recid: trunk.recid,
        alias: trunk.alias,
        reported_directions,
        calculated_stats: CalculatedStats { calls, realtime },
    }
}

// ── System figures ─────────────────────────────────────────────────

/// Session utilization of the whole system.
///
/// `None` when either the active-session count or the licensed capacity is
/// unknown, or the capacity is zero. Zero active sessions is a real 0%.
#[allow(clippy::as_conversions, clippy::cast_precision_loss)]
pub fn session_utilization(stat: &SystemStat) -> Option<f64> {
    match (stat.sum_active_session, stat.max_session_allowed) {
        (Some(active), Some(max)) if max > 0 => {
            Some(round1(active as f64 / max as f64 * 100.0))
        }
        _ => None,
    }
}

pub fn system_metrics(stat: SystemStat) -> SystemMetrics {
    SystemMetrics {
        cpu_utilization_pct: stat.cpu_idle_percent.map(|idle| round1(100.0 - idle)),
        session_utilization_pct: session_utilization(&stat),
        stat,
    }
}

/// Derive every section of a merged snapshot.
pub fn calculate(snapshot: DeviceSnapshot, window: CounterWindow) -> DeviceMetrics {
    DeviceMetrics {
        trunks: snapshot.trunks.map(|trunks| {
            trunks
                .into_iter()
                .map(|(id, trunk)| (id, trunk_metrics(trunk, window)))
                .collect()
        }),
        system: snapshot.system.map(system_metrics),
        media_servers: snapshot.media_servers,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{EgressStat, TrunkId};

    fn counters(pairs: &[(&str, serde_json::Value)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    fn gw_egress() -> FieldMap {
        counters(&[
            ("1st15mins_call_attempt", json!("4")),
            ("1st15mins_call_answer", json!("3")),
            ("1st15mins_call_fail", json!("0")),
            ("1st15mins_call_durationSec", json!("272")),
            ("1st15mins_pdd_ms", json!("11560")),
            ("24h_call_attempt", json!("194")),
            ("24h_call_answer", json!("151")),
            ("24h_call_fail", json!("13")),
            ("24h_call_durationSec", json!("50323")),
            ("24h_pdd_ms", json!("510510")),
        ])
    }

    #[test]
    fn call_ratios_over_the_fifteen_minute_window() {
        let stats = call_stats(&gw_egress(), CounterWindow::FifteenMinutes).unwrap();
        assert_eq!(
            stats,
            CallStats {
                avg_postdial_delay_sec: 2.9,
                avg_call_duration_sec: 68.0,
                failed_call_ratio_pct: 0.0,
                answer_seize_ratio_pct: 75.0,
            }
        );
    }

    #[test]
    fn other_windows_use_their_prefix() {
        let stats = call_stats(&gw_egress(), CounterWindow::Day).unwrap();
        assert_eq!(stats.failed_call_ratio_pct, 6.7);
        assert_eq!(stats.answer_seize_ratio_pct, 77.8);
        assert_eq!(stats.avg_postdial_delay_sec, 2.6);
    }

    #[test]
    fn no_attempts_means_no_group() {
        let idle = counters(&[("1st15mins_call_attempt", json!("0"))]);
        assert_eq!(call_stats(&idle, CounterWindow::FifteenMinutes), None);
        assert_eq!(call_stats(&FieldMap::new(), CounterWindow::FifteenMinutes), None);
    }

    #[test]
    fn ratios_stay_within_percent_range() {
        let skewed = counters(&[
            ("1st15mins_call_attempt", json!(2)),
            ("1st15mins_call_fail", json!(3)),
            ("1st15mins_call_answer", json!(0)),
        ]);
        let stats = call_stats(&skewed, CounterWindow::FifteenMinutes).unwrap();
        assert_eq!(stats.failed_call_ratio_pct, 100.0);
        assert_eq!(stats.answer_seize_ratio_pct, 0.0);
    }

    #[test]
    fn realtime_utilization_guards_zero_capacity() {
        let capped = RealtimeCounters {
            num_orig: 0,
            num_term: 2,
            total_limit: 2000,
            ..RealtimeCounters::zeroed()
        };
        let stats = realtime_stats(&capped);
        assert_eq!(stats.termination_sessions, 2);
        assert_eq!(stats.termination_utilization_pct, 0.1);

        let uncapped = RealtimeCounters {
            num_orig: 12,
            ..RealtimeCounters::zeroed()
        };
        assert_eq!(realtime_stats(&uncapped).origination_utilization_pct, 0.0);
    }

    #[test]
    fn idle_ingress_has_no_calculated_key() {
        let trunk = Trunk {
            id: TrunkId::from("1"),
            recid: Some("1".into()),
            alias: Some("ATL-PHL VSXs".into()),
            ingress_stat: Some(counters(&[("1st15mins_call_attempt", json!("0"))])),
            egress_stat: Some(EgressStat {
                kind: EgressKind::Gateway,
                counters: gw_egress(),
            }),
            realtime_stat: RealtimeCounters::zeroed(),
            realtime_sampled: false,
        };
        let metrics = trunk_metrics(trunk, CounterWindow::FifteenMinutes);
        assert!(metrics.calculated_stats.direction(CallDirection::Ingress).is_none());
        assert!(metrics.calculated_stats.direction(CallDirection::GwEgress).is_some());
        assert_eq!(
            metrics.reported_directions,
            vec![CallDirection::Ingress, CallDirection::GwEgress]
        );

        let rendered = serde_json::to_value(&metrics.calculated_stats).unwrap();
        assert!(rendered.get("ingress").is_none());
        assert!(rendered.get("gw_egress").is_some());
        assert!(rendered.get("realtime").is_some());
    }

    #[test]
    fn cpu_utilization_from_idle() {
        let stat = SystemStat {
            cpu_idle_percent: Some(98.0),
            ..SystemStat::default()
        };
        assert_eq!(system_metrics(stat).cpu_utilization_pct, Some(2.0));
    }

    #[test]
    fn session_utilization_rounds_to_one_decimal() {
        let stat = SystemStat {
            sum_active_session: Some(18_000),
            max_session_allowed: Some(19_750),
            ..SystemStat::default()
        };
        assert_eq!(session_utilization(&stat), Some(91.1));
    }

    #[test]
    fn session_utilization_distinguishes_zero_from_unknown() {
        let idle = SystemStat {
            sum_active_session: Some(0),
            max_session_allowed: Some(19_750),
            ..SystemStat::default()
        };
        assert_eq!(session_utilization(&idle), Some(0.0));

        let unlicensed = SystemStat {
            sum_active_session: Some(10),
            max_session_allowed: Some(0),
            ..SystemStat::default()
        };
        assert_eq!(session_utilization(&unlicensed), None);

        let unknown = SystemStat {
            max_session_allowed: Some(19_750),
            ..SystemStat::default()
        };
        assert_eq!(session_utilization(&unknown), None);
    }

    #[test]
    fn one_decimal_rounding_is_half_even_on_the_stored_value() {
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(0.35), 0.3);
        assert_eq!(round1(2.25), 2.2);
        assert_eq!(round1(0.75), 0.8);
        assert_eq!(round1(83.333), 83.3);
        assert_eq!(round1(91.1 - 50.0), 41.1);
        assert_eq!(round1(-10.0), -10.0);
    }

    #[test]
    fn window_names_parse() {
        assert_eq!("1h".parse::<CounterWindow>(), Ok(CounterWindow::Hour));
        assert!("5m".parse::<CounterWindow>().is_err());
        assert_eq!(CounterWindow::default().prefix(), "1st15mins_");
    }
}
