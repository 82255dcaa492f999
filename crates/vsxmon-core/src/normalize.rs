// ── Table normalization ──
//
// Converts the three report documents into per-entity field maps. The
// `resource` and `realtime` reports are MySQL-dump shaped:
//
//   {"mysqldump": {"database": {"table": [
//       {"name": "...", "row": [{"field": [{"name": "...", "content": ...}]}]}
//   ]}}}
//
// where any list with a single element may be collapsed to a bare object
// and an empty list may be missing entirely. Malformed documents yield
// `NoData`, never a panic or a hard error.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use vsxmon_api::Report;

use crate::model::fields::attr;
use crate::model::{
    FieldMap, MediaServer, RawSections, RealtimeSection, ResourceSection, ResourceTrunk,
    SystemStat, TrunkId,
};

/// Realtime table holding the system-wide counters.
pub const SYSTEM_TABLE: &str = "system_stat";
/// Realtime table holding live per-trunk counters.
pub const REALTIME_TRUNK_TABLE: &str = "XBResourceRealTimeStatList";
/// `fqdn` value of aggregate roll-up rows in the realtime trunk table.
pub const GROUP_FQDN: &str = "Group";

const MEDIA_LIST_KEY: &str = "XBMediaServerRealTimeStatList";
const MEDIA_RECORD_KEY: &str = "XBMediaServerRealTimeStat";

/// How deep the media-record fallback search descends.
pub const MEDIA_SEARCH_DEPTH: usize = 4;

/// A report section that could not be normalized.
///
/// Callers omit the section from output; the other sections still evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no usable '{report}' data: {reason}")]
pub struct NoData {
    pub report: Report,
    pub reason: String,
}

impl NoData {
    fn new(report: Report, reason: impl Into<String>) -> Self {
        Self {
            report,
            reason: reason.into(),
        }
    }
}

/// Normalized sections of one cycle. `None` = no data for that report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub resource: Option<ResourceSection>,
    pub realtime: Option<RealtimeSection>,
    pub media_servers: Option<Vec<MediaServer>>,
}

/// Normalize every fetched document, absorbing failures into `None`.
pub fn normalize(raw: &RawSections) -> Normalized {
    Normalized {
        resource: raw
            .resource
            .as_ref()
            .and_then(|doc| absorb(normalize_resource(doc))),
        realtime: raw
            .realtime
            .as_ref()
            .and_then(|doc| absorb(normalize_realtime(doc))),
        media_servers: raw
            .media_server
            .as_ref()
            .and_then(|doc| absorb(normalize_media(doc))),
    }
}

fn absorb<T>(result: Result<T, NoData>) -> Option<T> {
    result
        .inspect_err(|e| warn!(report = %e.report, reason = %e.reason, "section skipped"))
        .ok()
}

// ── Resource report ────────────────────────────────────────────────

/// Build trunk -> {table name -> fields} from the resource dump.
///
/// The first row seen for a trunk fixes its `recid` and `alias`; each
/// further table contributes its first row for that trunk under the
/// table's own name.
pub fn normalize_resource(doc: &Value) -> Result<ResourceSection, NoData> {
    let tables = dump_tables(doc, Report::Resource)?;
    let mut trunks: BTreeMap<TrunkId, ResourceTrunk> = BTreeMap::new();

    for table in tables {
        let Some(table_name) = table.get("name").and_then(Value::as_str) else {
            warn!("resource table without a name, skipping");
            continue;
        };
        let rows = table_rows(table);
        debug!(table = table_name, rows = rows.len(), "normalizing resource table");

        for mut fields in rows {
            let recid = fields.take(attr::RECORD_ID);
            let trunk_id = fields.take(attr::TRUNK_ID);
            let alias = fields.take(attr::ALIAS);

            let Some(id) = trunk_id.as_ref().and_then(TrunkId::from_value) else {
                warn!(table = table_name, "resource row without a trunk id, skipping");
                continue;
            };

            let trunk = trunks.entry(id).or_insert_with(|| ResourceTrunk {
                recid: recid.as_ref().and_then(text),
                alias: alias.as_ref().and_then(text),
                tables: BTreeMap::new(),
            });
            trunk.tables.entry(table_name.to_owned()).or_insert(fields);
        }
    }

    Ok(ResourceSection { trunks })
}

// ── Realtime report ────────────────────────────────────────────────

/// Extract the system counters and the live trunk rows.
///
/// An empty or missing `XBResourceRealTimeStatList` is normal: the device
/// only lists trunks with active sessions.
pub fn normalize_realtime(doc: &Value) -> Result<RealtimeSection, NoData> {
    let tables = dump_tables(doc, Report::Realtime)?;
    let mut section = RealtimeSection::default();

    for table in tables {
        match table.get("name").and_then(Value::as_str) {
            Some(SYSTEM_TABLE) => {
                section.system = table_rows(table).into_iter().next().map(SystemStat::from_fields);
            }
            Some(REALTIME_TRUNK_TABLE) => {
                for fields in table_rows(table) {
                    if fields.text_of(attr::FQDN).as_deref() == Some(GROUP_FQDN) {
                        continue;
                    }
                    match fields.resolve(attr::TRUNK_ID).and_then(TrunkId::from_value) {
                        Some(id) => {
                            section.trunks.insert(id, fields);
                        }
                        None => warn!("realtime trunk row without a trunk id, skipping"),
                    }
                }
            }
            other => debug!(table = ?other, "ignoring realtime table"),
        }
    }

    if section.system.is_none() {
        warn!("realtime report has no {SYSTEM_TABLE} row");
    }
    Ok(section)
}

// ── Media-server report ────────────────────────────────────────────

/// Typed media-server records.
///
/// The records live at `XBMediaServerRealTimeStatList.XBMediaServerRealTimeStat`.
/// Firmware that wraps the list differently is handled by a depth-bounded
/// search for the record key, which is logged whenever it is taken.
pub fn normalize_media(doc: &Value) -> Result<Vec<MediaServer>, NoData> {
    let records = match doc.get(MEDIA_LIST_KEY).and_then(|l| l.get(MEDIA_RECORD_KEY)) {
        Some(records) => records,
        None => {
            let found = find_key(doc, MEDIA_RECORD_KEY, MEDIA_SEARCH_DEPTH).ok_or_else(|| {
                NoData::new(Report::MediaServer, format!("missing {MEDIA_RECORD_KEY}"))
            })?;
            warn!("media-server records found outside {MEDIA_LIST_KEY}, using fallback location");
            found
        }
    };

    let servers = one_or_many(Some(records))
        .filter_map(|record| match record.as_object() {
            Some(map) => {
                let server = MediaServer::from_fields(&FieldMap::from(map.clone()));
                if server.is_none() {
                    warn!("media-server record without an alias, skipping");
                }
                server
            }
            None => {
                warn!("media-server record is not an object, skipping");
                None
            }
        })
        .collect();
    Ok(servers)
}

/// Depth-bounded search for `key` in nested objects and arrays.
///
/// `depth` counts container levels, the root included. Only used as the
/// media-list fallback.
pub fn find_key<'a>(value: &'a Value, key: &str, depth: usize) -> Option<&'a Value> {
    if depth == 0 {
        return None;
    }
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_key(v, key, depth - 1))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key, depth - 1)),
        _ => None,
    }
}

// ── Shared dump helpers ────────────────────────────────────────────

fn dump_tables(doc: &Value, report: Report) -> Result<Vec<&Value>, NoData> {
    let tables = doc
        .get("mysqldump")
        .ok_or_else(|| NoData::new(report, "document has no mysqldump envelope"))?
        .get("database")
        .ok_or_else(|| NoData::new(report, "mysqldump has no database"))?
        .get("table")
        .filter(|tables| !tables.is_null())
        .ok_or_else(|| NoData::new(report, "database has no table list"))?;
    Ok(one_or_many(Some(tables)).collect())
}

/// Every row of a table, flattened. Rows without a field list are dropped.
fn table_rows(table: &Value) -> Vec<FieldMap> {
    one_or_many(table.get("row"))
        .filter_map(|row| {
            let fields = row.get("field")?;
            Some(
                one_or_many(Some(fields))
                    .filter_map(|field| {
                        let name = field.get("name")?.as_str()?;
                        let content = field.get("content").cloned().unwrap_or(Value::Null);
                        Some((name.to_owned(), content))
                    })
                    .collect(),
            )
        })
        .collect()
}

/// Iterate a value that may be a list, a single element, null or absent.
fn one_or_many(value: Option<&Value>) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Some(Value::Array(items)) => Box::new(items.iter()),
        Some(Value::Null) | None => Box::new(std::iter::empty()),
        Some(single) => Box::new(std::iter::once(single)),
    }
}

fn text(value: &Value) -> Option<String> {
    crate::model::fields::value_as_text(value).filter(|s| !s.is_empty())
}
