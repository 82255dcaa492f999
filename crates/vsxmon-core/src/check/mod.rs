// ── Threshold evaluation ──
//
// Discovery turns a device's metrics into service items; the evaluator
// applies thresholds per item. Each item evaluates on its own: a missing
// section, lookup miss or ambiguity yields UNKNOWN for that item only.

pub mod levels;
pub mod media;
pub mod result;
pub mod system;
pub mod trunk;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::model::DeviceMetrics;
use crate::store::{CycleSamples, SampleStore};

pub use levels::{
    CallDirectionParams, Direction, LevelSpec, MediaParams, RealtimeParams, SystemParams,
    Thresholds, TrunkParams,
};
pub use result::{CheckResult, Metric, Service, ServiceItem, ServiceResult, State};
pub use system::SESSION_UTILIZATION_KEY;

/// Summary of a service whose report section had no data this cycle.
pub const NO_DATA: &str = "No data from agent - check agent connectivity";

/// Enumerate the services a device currently offers.
///
/// The system service needs `cpu_idle_percent`; media servers sharing an
/// alias collapse into one item, which then evaluates as ambiguous.
pub fn discover(metrics: &DeviceMetrics) -> Vec<Service> {
    let mut services = Vec::new();

    if metrics
        .system
        .as_ref()
        .is_some_and(|s| s.stat.cpu_idle_percent.is_some())
    {
        services.push(Service {
            item: ServiceItem::System,
            label: "System".into(),
        });
    }

    if let Some(trunks) = &metrics.trunks {
        services.extend(trunks.values().map(|t| Service {
            item: ServiceItem::Trunk(t.id.clone()),
            label: t.display_name().to_owned(),
        }));
    }

    if let Some(servers) = &metrics.media_servers {
        let aliases: BTreeSet<&str> = servers.iter().map(|s| s.alias.as_str()).collect();
        services.extend(aliases.into_iter().map(|alias| Service {
            item: ServiceItem::MediaServer(alias.to_owned()),
            label: alias.to_owned(),
        }));
    }

    debug!(count = services.len(), "discovered services");
    services
}

/// Applies thresholds to one device's metrics.
///
/// The sample store is injected so several devices (or tests) can share
/// or isolate baselines; `scope` prefixes every key this evaluator writes.
pub struct Evaluator {
    thresholds: Thresholds,
    store: Arc<dyn SampleStore>,
    scope: String,
}

impl Evaluator {
    pub fn new(thresholds: Thresholds, store: Arc<dyn SampleStore>, scope: impl Into<String>) -> Self {
        Self {
            thresholds,
            store,
            scope: scope.into(),
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Evaluate every discovered service in one pass.
    pub fn evaluate_all(&self, metrics: &DeviceMetrics) -> Vec<ServiceResult> {
        let items: Vec<ServiceItem> = discover(metrics).into_iter().map(|s| s.item).collect();
        self.evaluate_items(&items, metrics)
    }

    /// Evaluate the given services in one pass.
    pub fn evaluate_items(&self, items: &[ServiceItem], metrics: &DeviceMetrics) -> Vec<ServiceResult> {
        let mut samples = CycleSamples::new(self.store.as_ref(), &self.scope);
        items
            .iter()
            .map(|item| self.evaluate_in(item, metrics, &mut samples))
            .collect()
    }

    /// Evaluate a single service.
    pub fn evaluate(&self, item: &ServiceItem, metrics: &DeviceMetrics) -> ServiceResult {
        let mut samples = CycleSamples::new(self.store.as_ref(), &self.scope);
        self.evaluate_in(item, metrics, &mut samples)
    }

    fn evaluate_in(
        &self,
        item: &ServiceItem,
        metrics: &DeviceMetrics,
        samples: &mut CycleSamples<'_>,
    ) -> ServiceResult {
        match item {
            ServiceItem::System => {
                system::check_system(metrics.system.as_ref(), &self.thresholds.system, samples)
            }
            ServiceItem::Trunk(id) => {
                trunk::check_trunk(id, metrics.trunks.as_ref(), &self.thresholds.trunks)
            }
            ServiceItem::MediaServer(alias) => media::check_media_server(
                alias,
                metrics.media_servers.as_deref(),
                &self.thresholds.media,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{
        CalculatedStats, MediaServer, MediaStatus, SystemMetrics, SystemStat, TrunkId,
        TrunkMetrics,
    };
    use crate::store::MemorySampleStore;

    fn media(alias: &str, index: i64) -> MediaServer {
        MediaServer {
            index: Some(index),
            alias: alias.into(),
            status: MediaStatus::Up,
            num_active_sessions: 0,
            max_connections: 8000,
            priority: None,
            public_ip: None,
            switch_type: None,
        }
    }

    fn device() -> DeviceMetrics {
        let trunk = TrunkMetrics {
            id: TrunkId::from("10003"),
            recid: Some("2".into()),
            alias: Some("MS OC - Test".into()),
            reported_directions: Vec::new(),
            calculated_stats: CalculatedStats::default(),
        };
        DeviceMetrics {
            trunks: Some(BTreeMap::from([(trunk.id.clone(), trunk)])),
            system: Some(SystemMetrics {
                cpu_utilization_pct: Some(2.0),
                session_utilization_pct: Some(0.0),
                stat: SystemStat {
                    cpu_idle_percent: Some(98.0),
                    ..SystemStat::default()
                },
            }),
            media_servers: Some(vec![media("A", 1), media("B", 2), media("B", 3)]),
        }
    }

    #[test]
    fn discovery_names_every_service() {
        let names: Vec<String> = discover(&device())
            .iter()
            .map(|s| s.item.to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "VSX System",
                "VSX Trunk 10003",
                "VSX Media Server A",
                "VSX Media Server B",
            ]
        );
    }

    #[test]
    fn system_needs_cpu_idle_to_be_discovered() {
        let mut metrics = device();
        if let Some(system) = metrics.system.as_mut() {
            system.stat.cpu_idle_percent = None;
        }
        assert!(discover(&metrics)
            .iter()
            .all(|s| s.item != ServiceItem::System));
    }

    #[test]
    fn one_bad_item_does_not_affect_others() {
        let evaluator = Evaluator::new(
            Thresholds::default(),
            Arc::new(MemorySampleStore::new()),
            "vsx",
        );
        let results = evaluator.evaluate_all(&device());
        let states: Vec<State> = results.iter().map(ServiceResult::state).collect();
        assert_eq!(states, vec![State::Ok, State::Ok, State::Ok, State::Unknown]);
    }

    #[test]
    fn evaluation_writes_the_scoped_baseline() {
        let store = Arc::new(MemorySampleStore::new());
        let evaluator = Evaluator::new(Thresholds::default(), store.clone(), "10.0.0.5");
        evaluator.evaluate(&ServiceItem::System, &device());
        assert_eq!(
            store
                .load("10.0.0.5:system.session_utilization")
                .map(|s| s.value),
            Some(0.0)
        );
    }

    #[test]
    fn repeating_an_item_in_one_pass_does_not_double_write() {
        let store = Arc::new(MemorySampleStore::new());
        let evaluator = Evaluator::new(Thresholds::default(), store, "vsx");
        let results =
            evaluator.evaluate_items(&[ServiceItem::System, ServiceItem::System], &device());
        assert_eq!(results[0].state(), State::Ok);
        assert_eq!(results[1].state(), State::Unknown);
    }
}
