//! `dump`: show one poll's data at a chosen pipeline stage.
//!
//! With `--input` the documents come from disk, so captured reports can
//! be inspected without a device.

use std::fmt::Write as _;
use std::path::Path;

use serde_json::Value;
use tabled::Tabled;
use vsxmon_core::{
    CounterWindow, DeviceMetrics, DeviceSnapshot, Poller, RawSections, Report, TrunkMetrics,
    build_metrics, build_snapshot,
};

use crate::cli::{DumpArgs, DumpStage, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: DumpArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (raw, window) = match &args.input {
        Some(dir) => (read_input(dir)?, global.window.unwrap_or_default()),
        None => {
            let resolved = config::resolve_device(global)?;
            let window = resolved.device.window;
            let fetched = Poller::new(resolved.device)?.fetch().await;
            (fetched.raw, window)
        }
    };

    let rendered = match args.stage {
        DumpStage::Raw => {
            output::render_single(
                global.output,
                &raw,
                pretty::<RawSections>,
                pretty::<RawSections>,
            )
        }
        DumpStage::Snapshot => {
            let snapshot = build_snapshot(&raw);
            output::render_single(
                global.output,
                &snapshot,
                pretty::<DeviceSnapshot>,
                pretty::<DeviceSnapshot>,
            )
        }
        DumpStage::Metrics => {
            let metrics = build_metrics(&raw, window);
            output::render_single(
                global.output,
                &metrics,
                |m| metrics_detail(m, window),
                metrics_plain,
            )
        }
    };
    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// Read `<report>.json` files from `dir`; absent files are sections
/// without data.
pub fn read_input(dir: &Path) -> Result<RawSections, CliError> {
    let read = |report: Report| -> Result<Option<Value>, CliError> {
        let path = dir.join(format!("{}.json", report.path()));
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no input for report");
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| CliError::Json {
                path: path.display().to_string(),
                source,
            })
    };

    if !dir.is_dir() {
        return Err(CliError::Validation {
            field: "input".into(),
            reason: format!("{} is not a directory", dir.display()),
        });
    }

    Ok(RawSections {
        resource: read(Report::Resource)?,
        realtime: read(Report::Realtime)?,
        media_server: read(Report::MediaServer)?,
    })
}

fn pretty<T: serde::Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}

// ── Metrics rendering ────────────────────────────────────────────────

#[derive(Tabled)]
struct TrunkRow {
    #[tabled(rename = "Trunk")]
    id: String,
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Direction")]
    direction: String,
    #[tabled(rename = "ASR %")]
    asr: String,
    #[tabled(rename = "FCR %")]
    fcr: String,
    #[tabled(rename = "PDD s")]
    pdd: String,
    #[tabled(rename = "ACD s")]
    acd: String,
}

#[derive(Tabled)]
struct MediaRow {
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Sessions")]
    sessions: String,
}

fn trunk_rows(trunk: &TrunkMetrics) -> Vec<TrunkRow> {
    let alias = trunk.alias.clone().unwrap_or_default();
    let stats = &trunk.calculated_stats;
    let mut rows: Vec<TrunkRow> = stats
        .calls
        .iter()
        .map(|(direction, calls)| TrunkRow {
            id: trunk.id.to_string(),
            alias: alias.clone(),
            direction: direction.label().into(),
            asr: format!("{:.1}", calls.answer_seize_ratio_pct),
            fcr: format!("{:.1}", calls.failed_call_ratio_pct),
            pdd: format!("{:.1}", calls.avg_postdial_delay_sec),
            acd: format!("{:.1}", calls.avg_call_duration_sec),
        })
        .collect();
    if rows.is_empty() {
        rows.push(TrunkRow {
            id: trunk.id.to_string(),
            alias,
            direction: "-".into(),
            asr: "-".into(),
            fcr: "-".into(),
            pdd: "-".into(),
            acd: "-".into(),
        });
    }
    rows
}

fn metrics_detail(metrics: &DeviceMetrics, window: CounterWindow) -> String {
    let mut out = String::new();
    let pct = |v: Option<f64>| v.map_or_else(|| "n/a".to_owned(), |v| format!("{v:.1}%"));

    match &metrics.system {
        Some(system) => {
            let _ = writeln!(
                out,
                "System: CPU {}, sessions {} ({} of {}), HA {}",
                pct(system.cpu_utilization_pct),
                pct(system.session_utilization_pct),
                system.stat.sum_active_session.unwrap_or_default(),
                system.stat.max_session_allowed.unwrap_or_default(),
                system.stat.ha_current_state.as_deref().unwrap_or("n/a"),
            );
        }
        None => {
            let _ = writeln!(out, "System: no data");
        }
    }

    let _ = writeln!(out, "\nTrunks ({window} window):");
    match &metrics.trunks {
        Some(trunks) => {
            let rows: Vec<TrunkRow> = trunks.values().flat_map(trunk_rows).collect();
            let _ = writeln!(out, "{}", output::render_table(&rows));
        }
        None => {
            let _ = writeln!(out, "no data");
        }
    }

    let _ = writeln!(out, "\nMedia servers:");
    match &metrics.media_servers {
        Some(servers) => {
            let rows: Vec<MediaRow> = servers
                .iter()
                .map(|s| MediaRow {
                    alias: s.label(),
                    status: (if s.status.is_up() { "up" } else { "down" }).into(),
                    sessions: format!("{} of {}", s.num_active_sessions, s.max_connections),
                })
                .collect();
            let _ = write!(out, "{}", output::render_table(&rows));
        }
        None => {
            let _ = write!(out, "no data");
        }
    }
    out
}

/// One line per trunk direction: `<id> <direction> asr=.. fcr=.. pdd=..`.
fn metrics_plain(metrics: &DeviceMetrics) -> String {
    let Some(trunks) = &metrics.trunks else {
        return String::new();
    };
    trunks
        .values()
        .flat_map(|t| {
            t.calculated_stats.calls.iter().map(move |(direction, calls)| {
                format!(
                    "{} {} asr={} fcr={} pdd={} acd={}",
                    t.id,
                    direction,
                    calls.answer_seize_ratio_pct,
                    calls.failed_call_ratio_pct,
                    calls.avg_postdial_delay_sec,
                    calls.avg_call_duration_sec
                )
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn absent_input_files_are_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("realtime.json"), r#"{"mysqldump": {}}"#).unwrap();
        let raw = read_input(dir.path()).unwrap();
        assert!(raw.resource.is_none());
        assert!(raw.realtime.is_some());
        assert!(raw.media_server.is_none());
    }

    #[test]
    fn malformed_input_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("resource.json"), "{ not json").unwrap();
        match read_input(dir.path()).unwrap_err() {
            CliError::Json { path, .. } => assert!(path.ends_with("resource.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_metrics_render_as_no_data() {
        let text = metrics_detail(&DeviceMetrics::default(), CounterWindow::Hour);
        assert!(text.starts_with("System: no data"));
        assert!(text.contains("Trunks (1h window):\nno data"));
        assert_eq!(metrics_plain(&DeviceMetrics::default()), "");
    }
}
