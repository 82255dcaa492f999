// ── Entity merge ──
//
// Joins the normalized resource and realtime sections into one trunk
// entity set. Only trunks enumerated by the resource dump become entities;
// each of them gets realtime counters, zero-filled when the device did not
// report the trunk as active.

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::trunk::{EGRESS_TABLE, GW_EGRESS_TABLE, INGRESS_TABLE};
use crate::model::{
    DeviceSnapshot, EgressKind, EgressStat, RealtimeCounters, RealtimeSection, ResourceSection,
    Trunk, TrunkId,
};
use crate::normalize::Normalized;

/// Build the cycle's entity set. Sections without data stay `None`.
pub fn merge(normalized: Normalized) -> DeviceSnapshot {
    let Normalized {
        resource,
        realtime,
        media_servers,
    } = normalized;

    let trunks = resource.map(|resource| merge_trunks(resource, realtime.as_ref()));
    DeviceSnapshot {
        trunks,
        system: realtime.and_then(|r| r.system),
        media_servers,
    }
}

/// One `Trunk` per resource-declared trunk.
///
/// `realtime` is `None` when the realtime report failed; counters are then
/// zero-filled for every trunk just as for idle ones.
pub fn merge_trunks(
    resource: ResourceSection,
    realtime: Option<&RealtimeSection>,
) -> BTreeMap<TrunkId, Trunk> {
    if let Some(rt) = realtime {
        let orphans = rt
            .trunks
            .keys()
            .filter(|id| !resource.trunks.contains_key(*id))
            .count();
        if orphans > 0 {
            debug!(orphans, "realtime rows without a resource trunk ignored");
        }
    }

    resource
        .trunks
        .into_iter()
        .map(|(id, mut rt)| {
            let live = realtime.and_then(|r| r.trunks.get(&id));
            let egress_stat = rt
                .tables
                .remove(GW_EGRESS_TABLE)
                .map(|counters| EgressStat {
                    kind: EgressKind::Gateway,
                    counters,
                })
                .or_else(|| {
                    rt.tables.remove(EGRESS_TABLE).map(|counters| EgressStat {
                        kind: EgressKind::Plain,
                        counters,
                    })
                });

            let trunk = Trunk {
                id: id.clone(),
                recid: rt.recid,
                alias: rt.alias,
                ingress_stat: rt.tables.remove(INGRESS_TABLE),
                egress_stat,
                realtime_stat: live
                    .map_or_else(RealtimeCounters::zeroed, RealtimeCounters::from_fields),
                realtime_sampled: live.is_some(),
            };
            (id, trunk)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{FieldMap, ResourceTrunk, SystemStat};

    fn fields(pairs: &[(&str, serde_json::Value)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    fn resource() -> ResourceSection {
        let mut trunks = BTreeMap::new();
        trunks.insert(
            TrunkId::from("1"),
            ResourceTrunk {
                recid: Some("1".into()),
                alias: Some("ATL-PHL VSXs".into()),
                tables: [
                    (
                        INGRESS_TABLE.to_owned(),
                        fields(&[("1st15mins_call_attempt", json!("0"))]),
                    ),
                    (
                        GW_EGRESS_TABLE.to_owned(),
                        fields(&[("1st15mins_call_attempt", json!("4"))]),
                    ),
                    (
                        EGRESS_TABLE.to_owned(),
                        fields(&[("1st15mins_call_attempt", json!("1"))]),
                    ),
                ]
                .into_iter()
                .collect(),
            },
        );
        trunks.insert(
            TrunkId::from("10003"),
            ResourceTrunk {
                recid: Some("2".into()),
                alias: Some("MS OC - Test".into()),
                tables: [(
                    EGRESS_TABLE.to_owned(),
                    fields(&[("1st15mins_call_attempt", json!("3"))]),
                )]
                .into_iter()
                .collect(),
            },
        );
        ResourceSection { trunks }
    }

    fn realtime() -> RealtimeSection {
        RealtimeSection {
            system: Some(SystemStat::default()),
            trunks: [
                (
                    TrunkId::from("1"),
                    fields(&[("numOrig", json!("0")), ("numTerm", json!("2")), ("totalLimit", json!("2000"))]),
                ),
                (TrunkId::from("777"), fields(&[("numOrig", json!("5"))])),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn idle_trunks_are_zero_filled() {
        let trunks = merge_trunks(resource(), Some(&realtime()));
        let idle = &trunks[&TrunkId::from("10003")];
        assert!(!idle.realtime_sampled);
        assert!(idle.realtime_stat.as_pairs().iter().all(|(_, v)| *v == 0));

        let live = &trunks[&TrunkId::from("1")];
        assert!(live.realtime_sampled);
        assert_eq!(live.realtime_stat.num_term, 2);
        assert_eq!(live.realtime_stat.total_limit, 2000);
    }

    #[test]
    fn realtime_only_trunks_are_not_synthesized() {
        let trunks = merge_trunks(resource(), Some(&realtime()));
        assert_eq!(trunks.len(), 2);
        assert!(!trunks.contains_key(&TrunkId::from("777")));
    }

    #[test]
    fn gateway_egress_wins_over_plain_egress() {
        let trunks = merge_trunks(resource(), None);
        let atl = &trunks[&TrunkId::from("1")];
        let egress = atl.egress_stat.as_ref().map(|e| e.kind);
        assert_eq!(egress, Some(EgressKind::Gateway));

        let oc = &trunks[&TrunkId::from("10003")];
        assert_eq!(oc.egress_stat.as_ref().map(|e| e.kind), Some(EgressKind::Plain));
        assert!(oc.ingress_stat.is_none());
    }

    #[test]
    fn missing_realtime_report_still_yields_every_trunk() {
        let snapshot = merge(Normalized {
            resource: Some(resource()),
            realtime: None,
            media_servers: None,
        });
        let trunks = snapshot.trunks.unwrap_or_default();
        assert_eq!(trunks.len(), 2);
        assert!(trunks.values().all(|t| !t.realtime_sampled));
        assert!(snapshot.system.is_none());
    }

    #[test]
    fn missing_resource_report_means_no_trunks() {
        let snapshot = merge(Normalized {
            resource: None,
            realtime: Some(realtime()),
            media_servers: Some(Vec::new()),
        });
        assert!(snapshot.trunks.is_none());
        assert!(snapshot.system.is_some());
        assert_eq!(snapshot.media_servers, Some(Vec::new()));
    }
}
