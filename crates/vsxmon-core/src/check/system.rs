// ── VSX System service ──
//
// CPU and session utilization against absolute levels, plus the session
// drop detector: a fall in session utilization since the previous cycle
// larger than the drop levels escalates the session result even when the
// absolute level is fine.

use tracing::warn;

use super::levels::{Direction, SystemParams};
use super::result::{CheckResult, Metric, ServiceItem, ServiceResult, State};
use super::NO_DATA;
use crate::calculate::round1;
use crate::model::SystemMetrics;
use crate::store::CycleSamples;

/// Sample-store metric key of the drop detector's baseline.
pub const SESSION_UTILIZATION_KEY: &str = "system.session_utilization";

pub fn check_system(
    metrics: Option<&SystemMetrics>,
    params: &SystemParams,
    samples: &mut CycleSamples<'_>,
) -> ServiceResult {
    let Some(metrics) = metrics else {
        return ServiceResult::single(ServiceItem::System, CheckResult::new(State::Unknown, NO_DATA));
    };
    let mut service = ServiceResult::new(ServiceItem::System);

    match metrics.cpu_utilization_pct {
        Some(cpu) => {
            let state = params.cpu_levels.evaluate(cpu, Direction::Upper);
            service.push(CheckResult::new(state, format!("CPU at {cpu:.1}%.")));
            service.metric(
                Metric::new("cpu_utilization", cpu)
                    .with_levels(params.cpu_levels.pair())
                    .percent(),
            );
        }
        None => service.push(CheckResult::new(State::Unknown, "CPU idle time not reported.")),
    }

    match metrics.session_utilization_pct {
        Some(current) => check_sessions(&mut service, current, params, samples),
        None => service.push(CheckResult::new(State::Ok, "Session utilization unavailable.")),
    }

    service.push(CheckResult::new(State::Ok, String::new()).with_details(system_details(metrics)));
    service
}

fn check_sessions(
    service: &mut ServiceResult,
    current: f64,
    params: &SystemParams,
    samples: &mut CycleSamples<'_>,
) {
    let mut state = params.session_levels.evaluate(current, Direction::Upper);

    let drop = samples
        .previous(SESSION_UTILIZATION_KEY)
        .map(|previous| round1(previous.value - current));
    if let (Some(drop), Some((warn_drop, crit_drop))) = (drop, params.session_drop_levels.pair()) {
        if drop >= warn_drop && state == State::Ok {
            state = State::Warn;
        }
        if drop >= crit_drop {
            state = state.escalate(State::Crit);
        }
    }

    // The baseline moves every cycle, alerting or not.
    if let Err(e) = samples.record(SESSION_UTILIZATION_KEY, current) {
        warn!(scope = samples.scope(), error = %e, "failed to store session baseline");
        service.push(
            CheckResult::new(State::Unknown, "Session baseline could not be stored.")
                .with_details(e.to_string()),
        );
    }

    let mut summary = format!("Session Utilization at {current:.1}%.");
    if let Some(drop) = drop {
        summary.push_str(&format!(" Drop since last: {drop:.1}%."));
    }
    service.push(CheckResult::new(state, summary));

    service.metric(
        Metric::new("session_utilization", current)
            .with_levels(params.session_levels.pair())
            .percent(),
    );
    service.metric(
        Metric::new("session_utilization_drop", drop.unwrap_or(0.0))
            .with_levels(params.session_drop_levels.pair())
            .with_boundaries(None, None),
    );
}

fn system_details(metrics: &SystemMetrics) -> String {
    let stat = &metrics.stat;
    let or_unknown = |v: Option<String>| v.unwrap_or_else(|| "unknown".into());
    format!(
        "HA state: {} (previous: {}), current CPS: {} of {}, active sessions: {} of {}, peak: {}",
        or_unknown(stat.ha_current_state.clone()),
        or_unknown(stat.ha_pre_state.clone()),
        or_unknown(stat.current_cps.map(|v| v.to_string())),
        or_unknown(stat.max_cps_allowed.map(|v| v.to_string())),
        or_unknown(stat.sum_active_session.map(|v| v.to_string())),
        or_unknown(stat.max_session_allowed.map(|v| v.to_string())),
        or_unknown(stat.peak_active_session.map(|v| v.to_string())),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::SystemStat;
    use crate::store::{MemorySampleStore, Sample, SampleStore};

    fn metrics(cpu: Option<f64>, sessions: Option<f64>) -> SystemMetrics {
        SystemMetrics {
            cpu_utilization_pct: cpu,
            session_utilization_pct: sessions,
            stat: SystemStat {
                ha_current_state: Some("active".into()),
                ha_pre_state: Some("standby".into()),
                current_cps: Some(0),
                ..SystemStat::default()
            },
        }
    }

    fn run(store: &MemorySampleStore, m: &SystemMetrics) -> ServiceResult {
        let mut samples = CycleSamples::new(store, "vsx");
        check_system(Some(m), &SystemParams::default(), &mut samples)
    }

    fn metric(service: &ServiceResult, name: &str) -> Option<f64> {
        service.metrics.iter().find(|m| m.name == name).map(|m| m.value)
    }

    #[test]
    fn low_cpu_is_ok() {
        let store = MemorySampleStore::new();
        let service = run(&store, &metrics(Some(2.0), None));
        assert_eq!(service.results[0], CheckResult::new(State::Ok, "CPU at 2.0%."));
        assert_eq!(metric(&service, "cpu_utilization"), Some(2.0));
        assert_eq!(service.state(), State::Ok);
    }

    #[test]
    fn high_session_utilization_is_crit() {
        let store = MemorySampleStore::new();
        let service = run(&store, &metrics(Some(2.0), Some(91.1)));
        assert_eq!(service.state(), State::Crit);
        assert!(service.summary().contains("Session Utilization at 91.1%."));
    }

    #[test]
    fn first_run_reports_zero_drop_and_sets_baseline() {
        let store = MemorySampleStore::new();
        let service = run(&store, &metrics(Some(2.0), Some(50.0)));

        assert_eq!(metric(&service, "session_utilization_drop"), Some(0.0));
        assert_eq!(service.state(), State::Ok);
        assert!(!service.summary().contains("Drop since last"));
        assert_eq!(
            store.load("vsx:system.session_utilization").map(|s| s.value),
            Some(50.0)
        );
    }

    #[test]
    fn sharp_drop_is_crit_even_when_absolute_level_is_ok() {
        let store = MemorySampleStore::new();
        run(&store, &metrics(Some(2.0), Some(91.1)));
        let service = run(&store, &metrics(Some(2.0), Some(50.0)));

        assert_eq!(service.state(), State::Crit);
        assert_eq!(metric(&service, "session_utilization_drop"), Some(41.1));
        assert!(service.summary().contains("Drop since last: 41.1%."));
    }

    #[test]
    fn moderate_drop_warns() {
        let store = MemorySampleStore::new()
            .with_sample("vsx:system.session_utilization", Sample::now(62.0));
        let service = run(&store, &metrics(Some(2.0), Some(50.0)));
        assert_eq!(service.state(), State::Warn);
    }

    #[test]
    fn rising_utilization_is_a_negative_drop() {
        let store = MemorySampleStore::new()
            .with_sample("vsx:system.session_utilization", Sample::now(40.0));
        let service = run(&store, &metrics(Some(2.0), Some(50.0)));
        assert_eq!(metric(&service, "session_utilization_drop"), Some(-10.0));
        assert_eq!(service.state(), State::Ok);
    }

    #[test]
    fn missing_section_is_unknown() {
        let store = MemorySampleStore::new();
        let mut samples = CycleSamples::new(&store, "vsx");
        let service = check_system(None, &SystemParams::default(), &mut samples);
        assert_eq!(service.state(), State::Unknown);
        assert_eq!(service.summary(), NO_DATA);
        assert!(store.is_empty());
    }

    #[test]
    fn unavailable_sessions_leave_baseline_untouched() {
        let store = MemorySampleStore::new();
        let service = run(&store, &metrics(Some(2.0), None));
        assert!(service.summary().contains("Session utilization unavailable."));
        assert_eq!(metric(&service, "session_utilization"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn details_carry_ha_state() {
        let store = MemorySampleStore::new();
        let service = run(&store, &metrics(Some(2.0), None));
        let details = service
            .results
            .iter()
            .find_map(|r| r.details.clone())
            .unwrap_or_default();
        assert!(details.contains("HA state: active (previous: standby)"));
    }
}
