// ── Media-server domain types ──

use std::fmt;

use serde::{Deserialize, Serialize};

use super::fields::{FieldMap, attr};

/// Device-reported media-server status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaStatus {
    Up,
    /// Anything other than `up`, verbatim.
    Other(String),
}

impl MediaStatus {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("up") {
            Self::Up
        } else {
            Self::Other(raw.trim().to_owned())
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// One `XBMediaServerRealTimeStat` record.
///
/// Aliases are expected to be unique but the device does not enforce it;
/// lookups by alias must handle duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaServer {
    pub index: Option<i64>,
    pub alias: String,
    pub status: MediaStatus,
    pub num_active_sessions: u64,
    pub max_connections: u64,
    pub priority: Option<i64>,
    pub public_ip: Option<String>,
    pub switch_type: Option<String>,
}

impl MediaServer {
    /// Build from one record of the media dump.
    ///
    /// Returns `None` for records without an alias: they cannot be
    /// addressed as a service item.
    #[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
    pub fn from_fields(fields: &FieldMap) -> Option<Self> {
        let alias = fields.text("alias")?;
        Some(Self {
            index: fields.number_of(attr::MEDIA_INDEX).map(|v| v as i64),
            alias,
            status: MediaStatus::parse(&fields.text("status").unwrap_or_default()),
            num_active_sessions: fields.count("numActiveSessions").unwrap_or(0),
            max_connections: fields.count("maxConnections").unwrap_or(0),
            priority: fields.number("priority").map(|v| v as i64),
            public_ip: fields.text("publicIP"),
            switch_type: fields.text("switchType"),
        })
    }

    /// `alias (publicIP)` as shown in summaries.
    pub fn label(&self) -> String {
        match &self.public_ip {
            Some(ip) => format!("{} ({ip})", self.alias),
            None => self.alias.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn record_is_typed() {
        let raw = json!({
            "mediaSrvIndex": 2,
            "switchType": "External Advanced Hybrid-Media Switching",
            "alias": "MST3 HA Pair",
            "numActiveSessions": 4,
            "publicIP": "209.55.10.7",
            "priority": 0,
            "maxConnections": "8000",
            "status": "up"
        });
        let fields = FieldMap::from(raw.as_object().cloned().unwrap_or_default());
        let server = MediaServer::from_fields(&fields);

        let server = server.as_ref();
        assert_eq!(server.map(|s| s.index), Some(Some(2)));
        assert_eq!(server.map(|s| s.max_connections), Some(8000));
        assert_eq!(server.map(|s| s.status.is_up()), Some(true));
        assert_eq!(
            server.map(MediaServer::label).as_deref(),
            Some("MST3 HA Pair (209.55.10.7)")
        );
    }

    #[test]
    fn status_other_than_up_is_kept_verbatim() {
        let status = MediaStatus::parse("down");
        assert!(!status.is_up());
        assert_eq!(status.to_string(), "down");
        assert!(MediaStatus::parse("UP").is_up());
    }

    #[test]
    fn record_without_alias_is_skipped() {
        let fields = FieldMap::from(
            json!({ "mediaSrvIndex": 9, "status": "up" })
                .as_object()
                .cloned()
                .unwrap_or_default(),
        );
        assert!(MediaServer::from_fields(&fields).is_none());
    }
}
