// ── Field maps and canonical attribute resolution ──
//
// Every VSX table row arrives as a list of `{name, content}` pairs whose
// content may be a JSON string, number or null. `FieldMap` is the row after
// flattening; typed accessors coerce content on read.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered candidate field names for logical attributes.
///
/// The resource and realtime dumps spell the same attribute differently;
/// normalization resolves the first candidate present and never looks at
/// raw shapes again.
pub mod attr {
    pub const TRUNK_ID: &[&str] = &["trunk_id", "trunkId"];
    pub const RECORD_ID: &[&str] = &["id", "recid"];
    pub const ALIAS: &[&str] = &["alias"];
    pub const FQDN: &[&str] = &["fqdn"];
    pub const MEDIA_INDEX: &[&str] = &["mediaSrvIndex"];
}

/// A flattened table row: field name -> raw content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, Value>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, content: Value) {
        self.0.insert(name.into(), content);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// First candidate field that is present and non-null.
    pub fn resolve(&self, candidates: &[&str]) -> Option<&Value> {
        candidates
            .iter()
            .filter_map(|&name| self.0.get(name))
            .find(|v| !v.is_null())
    }

    /// Remove and return the first present candidate field.
    pub fn take(&mut self, candidates: &[&str]) -> Option<Value> {
        for &name in candidates {
            if self.0.get(name).is_some_and(|v| !v.is_null()) {
                return self.0.remove(name);
            }
        }
        None
    }

    /// Numeric view of a field. Strings are trimmed and parsed.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(value_as_f64)
    }

    /// Numeric view of the first resolvable candidate.
    pub fn number_of(&self, candidates: &[&str]) -> Option<f64> {
        self.resolve(candidates).and_then(value_as_f64)
    }

    /// Non-negative integer view, for counters.
    pub fn count(&self, name: &str) -> Option<u64> {
        self.number(name).and_then(f64_to_count)
    }

    pub fn count_of(&self, candidates: &[&str]) -> Option<u64> {
        self.number_of(candidates).and_then(f64_to_count)
    }

    /// Text view of a field. Numbers keep their JSON rendering.
    pub fn text(&self, name: &str) -> Option<String> {
        self.0.get(name).and_then(value_as_text)
    }

    pub fn text_of(&self, candidates: &[&str]) -> Option<String> {
        self.resolve(candidates).and_then(value_as_text)
    }
}

impl FromIterator<(String, Value)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<serde_json::Map<String, Value>> for FieldMap {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

// ── Coercion helpers ───────────────────────────────────────────────

pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn f64_to_count(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}

// ── Trunk identifier ───────────────────────────────────────────────

/// Trunk identifier as the device reports it (`1`, `10003`, ...).
///
/// Kept as text: the resource dump serializes ids as strings while the
/// realtime dump may use numbers, and both must key the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrunkId(String);

impl TrunkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build from raw content, accepting strings and integral numbers.
    pub fn from_value(value: &Value) -> Option<Self> {
        let text = value_as_text(value)?;
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }
}

impl fmt::Display for TrunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrunkId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
