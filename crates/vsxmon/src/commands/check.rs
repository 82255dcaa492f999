//! `check`: poll once, evaluate, exit with the worst state.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;
use vsxmon_core::{
    DeviceConfig, DeviceMetrics, Evaluator, FetchFailure, FileSampleStore, Metric, Report,
    ServiceItem, ServiceResult, State, check::NO_DATA,
};

use crate::cli::{CheckArgs, GlobalOpts};
use crate::commands::poll_device;
use crate::config;
use crate::error::CliError;
use crate::output;

/// A selected report that produced no data this cycle.
#[derive(Debug, Serialize)]
pub struct MissingSection {
    pub report: Report,
    pub reason: String,
}

/// Everything `check` prints.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub state: State,
    pub services: Vec<ServiceResult>,
    pub missing_sections: Vec<MissingSection>,
}

impl CheckReport {
    pub fn new(services: Vec<ServiceResult>, missing_sections: Vec<MissingSection>) -> Self {
        let state = State::worst(
            services
                .iter()
                .map(ServiceResult::state)
                .chain(missing_sections.iter().map(|_| State::Unknown)),
        );
        Self {
            state,
            services,
            missing_sections,
        }
    }
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Summary")]
    summary: String,
}

pub async fn handle(args: CheckArgs, global: &GlobalOpts) -> Result<State, CliError> {
    let items = parse_items(&args.services)?;
    let resolved = config::resolve_device(global)?;
    let (poller, polled) = poll_device(&resolved).await?;

    let state_file = args.state_file.clone().unwrap_or(resolved.state_file);
    let store = Arc::new(FileSampleStore::open(state_file)?);
    let evaluator = Evaluator::new(resolved.thresholds, store, poller.config().scope());

    // Discovery only sees sections that arrived; explicitly named items
    // report their own missing section.
    let (services, missing) = if items.is_empty() {
        (
            evaluator.evaluate_all(&polled.metrics),
            missing_sections(poller.config(), &polled.metrics, &polled.failures),
        )
    } else {
        (evaluator.evaluate_items(&items, &polled.metrics), Vec::new())
    };

    let report = CheckReport::new(services, missing);
    let color = output::should_color(global.color);
    let rendered = output::render_single(
        global.output,
        &report,
        |r| render_table(r, args.details, color),
        |r| render_plain(r, args.details, color),
    );
    output::print_output(&rendered, global.quiet);
    Ok(report.state)
}

fn parse_items(names: &[String]) -> Result<Vec<ServiceItem>, CliError> {
    names
        .iter()
        .map(|name| {
            ServiceItem::parse(name).ok_or_else(|| CliError::Validation {
                field: "service".into(),
                reason: format!(
                    "'{name}' is not a service name (expected \"VSX System\", \
                     \"VSX Trunk <id>\" or \"VSX Media Server <alias>\")"
                ),
            })
        })
        .collect()
}

/// Selected reports with no section in `metrics`.
pub fn missing_sections(
    config: &DeviceConfig,
    metrics: &DeviceMetrics,
    failures: &[FetchFailure],
) -> Vec<MissingSection> {
    Report::ALL
        .into_iter()
        .filter(|report| config.wants(*report) && !metrics.has_section(*report))
        .map(|report| MissingSection {
            report,
            reason: failures
                .iter()
                .find(|f| f.report == report)
                .map_or_else(|| "report had no usable data".to_owned(), |f| f.error.to_string()),
        })
        .collect()
}

/// `name=value;warn;crit;min;max`
fn perfdata(metric: &Metric) -> String {
    let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    let (warn, crit) = metric
        .levels
        .map_or((None, None), |(w, c)| (Some(w), Some(c)));
    let (min, max) = metric.boundaries.unwrap_or((None, None));
    format!(
        "{}={};{};{};{};{}",
        metric.name,
        metric.value,
        opt(warn),
        opt(crit),
        opt(min),
        opt(max)
    )
}

fn details(result: &ServiceResult) -> impl Iterator<Item = &str> {
    result
        .results
        .iter()
        .filter_map(|r| r.details.as_deref())
        .flat_map(str::lines)
}

fn render_plain(report: &CheckReport, with_details: bool, color: bool) -> String {
    let mut out = String::new();
    for result in &report.services {
        let _ = write!(
            out,
            "{} - {}: {}",
            output::paint_state(result.state(), color),
            result.service,
            result.summary()
        );
        if !result.metrics.is_empty() {
            let perf: Vec<String> = result.metrics.iter().map(perfdata).collect();
            let _ = write!(out, " | {}", perf.join(" "));
        }
        out.push('\n');
        if with_details {
            for line in details(result) {
                let _ = writeln!(out, "    {line}");
            }
        }
    }
    for missing in &report.missing_sections {
        let _ = writeln!(
            out,
            "{} - {} report: {NO_DATA} ({})",
            output::paint_state(State::Unknown, color),
            missing.report,
            missing.reason
        );
    }
    out.trim_end().to_owned()
}

fn render_table(report: &CheckReport, with_details: bool, color: bool) -> String {
    let mut rows: Vec<ResultRow> = report
        .services
        .iter()
        .map(|result| {
            let mut summary = result.summary();
            if with_details {
                for line in details(result) {
                    summary.push('\n');
                    summary.push_str(line);
                }
            }
            ResultRow {
                service: result.service.to_string(),
                state: result.state().to_string(),
                summary,
            }
        })
        .collect();
    rows.extend(report.missing_sections.iter().map(|m| ResultRow {
        service: format!("{} report", m.report),
        state: State::Unknown.to_string(),
        summary: format!("{NO_DATA} ({})", m.reason),
    }));

    format!(
        "{}\nOverall: {}",
        output::render_table(&rows),
        output::paint_state(report.state, color)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vsxmon_core::{CheckResult, CoreError, TrunkId};

    use super::*;

    #[test]
    fn perfdata_leaves_unknown_fields_empty() {
        let metric = Metric::new("cpu_utilization", 2.0)
            .with_levels(Some((80.0, 90.0)))
            .percent();
        assert_eq!(perfdata(&metric), "cpu_utilization=2;80;90;0;100");
        assert_eq!(perfdata(&Metric::new("active_sessions", 12.0)), "active_sessions=12;;;;");
    }

    #[test]
    fn missing_section_makes_the_run_unknown() {
        let config = DeviceConfig::new(
            "https://10.0.0.5:8888".parse().unwrap(),
            "monitor",
            "pw".to_owned().into(),
        );
        let metrics = DeviceMetrics::default();
        let failures = vec![FetchFailure {
            report: Report::Resource,
            error: CoreError::AuthenticationFailed {
                message: "401 Unauthorized".into(),
            },
        }];
        let missing = missing_sections(&config, &metrics, &failures);
        assert_eq!(missing.len(), 3);
        assert!(missing[0].reason.contains("401"));
        assert_eq!(missing[1].reason, "report had no usable data");

        let ok = ServiceResult::single(
            ServiceItem::Trunk(TrunkId::from("1")),
            CheckResult::new(State::Ok, "ATL-PHL VSXs"),
        );
        let report = CheckReport::new(vec![ok], missing);
        assert_eq!(report.state, State::Unknown);
        assert!(render_plain(&report, false, false).contains("UNKNOWN - resource report"));
    }

    #[test]
    fn service_names_must_parse() {
        assert!(parse_items(&["VSX Trunk 7".into()]).is_ok());
        assert!(parse_items(&["Trunk 7".into()]).is_err());
    }
}
