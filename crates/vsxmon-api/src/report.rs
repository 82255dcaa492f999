// Report endpoints exposed under `/SSConfig/webresources/stats/`.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// One of the three statistics dumps a VSX serves.
///
/// The string form is the URL path segment and the name used in
/// configuration (`sections = ["resource", "realtime"]`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Report {
    /// Trunk configuration with windowed ingress/egress counters.
    Resource,
    /// System counters plus live per-trunk session counts.
    Realtime,
    /// Media-server pool status.
    MediaServer,
}

impl Report {
    /// All reports, in the order the device documentation lists them.
    pub const ALL: [Report; 3] = [Report::Resource, Report::Realtime, Report::MediaServer];

    /// Path segment under the stats prefix.
    pub fn path(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Realtime => "realtime",
            Self::MediaServer => "media_server",
        }
    }
}
