// ── VSX Trunk service ──

use std::collections::BTreeMap;

use super::levels::{CallDirectionParams, Direction, LevelSpec, TrunkParams};
use super::result::{CheckResult, Metric, ServiceItem, ServiceResult, State};
use super::NO_DATA;
use crate::model::{CallDirection, CallStats, RealtimeStats, TrunkId, TrunkMetrics};

/// Bound direction of each alerting trunk metric. Anything else is only
/// recorded.
pub fn bound_direction(metric: &str) -> Option<Direction> {
    match metric {
        "failed_call_ratio" | "avg_postdial_delay" | "origination_utilization"
        | "termination_utilization" => Some(Direction::Upper),
        "answer_seize_ratio" => Some(Direction::Lower),
        _ => None,
    }
}

fn direction_params(params: &TrunkParams, direction: CallDirection) -> &CallDirectionParams {
    match direction {
        CallDirection::Ingress => &params.ingress,
        CallDirection::Egress => &params.egress,
        CallDirection::GwEgress => &params.gw_egress_stat,
    }
}

pub fn check_trunk(
    id: &TrunkId,
    trunks: Option<&BTreeMap<TrunkId, TrunkMetrics>>,
    params: &TrunkParams,
) -> ServiceResult {
    let item = ServiceItem::Trunk(id.clone());
    let Some(trunks) = trunks else {
        return ServiceResult::single(item, CheckResult::new(State::Unknown, NO_DATA));
    };
    let Some(trunk) = trunks.get(id) else {
        return ServiceResult::single(
            item,
            CheckResult::new(State::Unknown, format!("Trunk {id} not found on device.")),
        );
    };

    let mut service = ServiceResult::new(item);
    let mut header = CheckResult::new(State::Ok, trunk.display_name());
    if let Some(recid) = &trunk.recid {
        header = header.with_details(format!("Record id {recid}"));
    }
    service.push(header);

    for &direction in &trunk.reported_directions {
        match trunk.calculated_stats.direction(direction) {
            Some(stats) => check_calls(
                &mut service,
                direction,
                stats,
                direction_params(params, direction),
            ),
            None => service.push(
                CheckResult::new(State::Ok, String::new())
                    .with_details(format!("{}: no call attempts in window", direction.label())),
            ),
        }
    }

    check_realtime(&mut service, &trunk.calculated_stats.realtime, params);
    service
}

fn check_calls(
    service: &mut ServiceResult,
    direction: CallDirection,
    stats: &CallStats,
    params: &CallDirectionParams,
) {
    let label = direction.label();
    let observed = [
        (
            "failed_call_ratio",
            "failed call ratio",
            stats.failed_call_ratio_pct,
            "%",
            Some(params.failed_call_ratio_levels),
        ),
        (
            "answer_seize_ratio",
            "answer seize ratio",
            stats.answer_seize_ratio_pct,
            "%",
            Some(params.answer_seize_ratio_levels),
        ),
        (
            "avg_postdial_delay",
            "average post-dial delay",
            stats.avg_postdial_delay_sec,
            "s",
            Some(params.avg_postdial_delay_levels),
        ),
        (
            "avg_call_duration",
            "average call duration",
            stats.avg_call_duration_sec,
            "s",
            None,
        ),
    ];

    for (metric, text, value, unit, levels) in observed {
        let line = format!("{label} {text}: {value:.1}{unit}");
        let name = format!("{}_{metric}", direction.as_ref());
        push_levelled(service, metric, &name, line, value, levels);
    }
}

fn check_realtime(service: &mut ServiceResult, stats: &RealtimeStats, params: &TrunkParams) {
    let levels = &params.realtime;
    for (metric, text, sessions, pct, spec) in [
        (
            "origination_utilization",
            "Origination",
            stats.origination_sessions,
            stats.origination_utilization_pct,
            levels.origination_utilization_levels,
        ),
        (
            "termination_utilization",
            "Termination",
            stats.termination_sessions,
            stats.termination_utilization_pct,
            levels.termination_utilization_levels,
        ),
    ] {
        let line = format!("{text} utilization: {pct:.1}% ({sessions} sessions)");
        push_levelled(service, metric, metric, line, pct, Some(spec));
    }

    #[allow(clippy::as_conversions, clippy::cast_precision_loss)]
    let (origination, termination) = (
        stats.origination_sessions as f64,
        stats.termination_sessions as f64,
    );
    service.metric(Metric::new("origination_sessions", origination));
    service.metric(Metric::new("termination_sessions", termination));
}

/// Evaluate `value` if the metric has a bound direction and levels, then
/// record it. OK lines go to the details so the summary lists problems.
fn push_levelled(
    service: &mut ServiceResult,
    metric: &str,
    metric_name: &str,
    line: String,
    value: f64,
    levels: Option<LevelSpec>,
) {
    let spec = levels.unwrap_or(LevelSpec::NoLevels);
    let state = bound_direction(metric).map_or(State::Ok, |d| spec.evaluate(value, d));

    let result = if state == State::Ok {
        CheckResult::new(State::Ok, String::new()).with_details(line)
    } else {
        CheckResult::new(state, line)
    };
    service.push(result);

    let mut sample = Metric::new(metric_name, value).with_levels(spec.pair());
    if metric.ends_with("_ratio") || metric.ends_with("_utilization") {
        sample = sample.percent();
    }
    service.metric(sample);
}
