// ── VSX Media Server service ──

use super::levels::{Direction, MediaParams};
use super::result::{CheckResult, Metric, ServiceItem, ServiceResult, State};
use super::NO_DATA;
use crate::calculate::round1;
use crate::model::MediaServer;

/// Look up `alias` and evaluate it.
///
/// Exactly one match is evaluated; none is a lookup miss and several are
/// reported as ambiguous with every matching index.
pub fn check_media_server(
    alias: &str,
    servers: Option<&[MediaServer]>,
    params: &MediaParams,
) -> ServiceResult {
    let item = ServiceItem::MediaServer(alias.to_owned());
    let Some(servers) = servers else {
        return ServiceResult::single(item, CheckResult::new(State::Unknown, NO_DATA));
    };

    let matches: Vec<&MediaServer> = servers.iter().filter(|s| s.alias == alias).collect();
    let server = match matches.as_slice() {
        [] => {
            return ServiceResult::single(
                item,
                CheckResult::new(State::Unknown, format!("Media server '{alias}' not found.")),
            );
        }
        [server] => *server,
        [first, ..] => {
            let indices: Vec<String> = matches
                .iter()
                .map(|s| s.index.map_or_else(|| "?".into(), |i| i.to_string()))
                .collect();
            return ServiceResult::single(
                item,
                CheckResult::new(
                    State::Unknown,
                    format!("{} had more than one match.", first.label()),
                )
                .with_details(format!("Matching media server indices: [{}]", indices.join(", "))),
            );
        }
    };

    let mut service = ServiceResult::new(item);
    service.push(CheckResult::new(State::Ok, server.label()).with_details(format!(
        "{} is showing status as {} with {} active sessions.",
        server.alias, server.status, server.num_active_sessions
    )));

    if !server.status.is_up() {
        service.push(CheckResult::new(
            State::Crit,
            format!("{} is not in an up state.", server.label()),
        ));
    }

    #[allow(clippy::as_conversions, clippy::cast_precision_loss)]
    let (active, capacity) = (
        server.num_active_sessions as f64,
        server.max_connections as f64,
    );

    if server.max_connections > 0 {
        let pct = round1(active / capacity * 100.0);
        let state = params.session_levels.evaluate(pct, Direction::Upper);
        service.push(CheckResult::new(
            state,
            format!(
                "Session utilization: {pct:.1}% ({} of {})",
                server.num_active_sessions, server.max_connections
            ),
        ));
        service.metric(
            Metric::new("media_session_utilization", pct)
                .with_levels(params.session_levels.pair())
                .percent(),
        );
    }

    let mut sessions = Metric::new("active_sessions", active);
    if server.max_connections > 0 {
        sessions = sessions.with_boundaries(Some(0.0), Some(capacity));
    }
    service.metric(sessions);
    service
}
