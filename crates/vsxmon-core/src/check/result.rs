// ── Evaluation results ──

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::TrunkId;

/// Monitoring severity.
///
/// Ordered by how bad it is for an operator: OK < WARN < UNKNOWN < CRIT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    #[default]
    Ok,
    Warn,
    Crit,
    Unknown,
}

impl State {
    fn rank(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Warn => 1,
            Self::Unknown => 2,
            Self::Crit => 3,
        }
    }

    /// The worse of two states. Never lowers `self`.
    #[must_use]
    pub fn escalate(self, other: Self) -> Self {
        if other.rank() > self.rank() { other } else { self }
    }

    /// Worst state of a sequence, OK when empty.
    pub fn worst(states: impl IntoIterator<Item = Self>) -> Self {
        states.into_iter().fold(Self::Ok, Self::escalate)
    }

    /// Conventional plugin exit code: 0 OK, 1 WARN, 2 CRIT, 3 UNKNOWN.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Warn => 1,
            Self::Crit => 2,
            Self::Unknown => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warn => "WARN",
            Self::Crit => "CRIT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One state-bearing line of a service's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub state: State,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CheckResult {
    pub fn new(state: State, summary: impl Into<String>) -> Self {
        Self {
            state,
            summary: summary.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// A named numeric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    /// `(warn, crit)` in effect, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<(f64, f64)>,
    /// `(min, max)` of the value's range, where known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundaries: Option<(Option<f64>, Option<f64>)>,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            levels: None,
            boundaries: None,
        }
    }

    pub fn with_levels(mut self, levels: Option<(f64, f64)>) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_boundaries(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.boundaries = Some((min, max));
        self
    }

    /// Percentages range over `[0, 100]`.
    pub fn percent(self) -> Self {
        self.with_boundaries(Some(0.0), Some(100.0))
    }
}

// ── Service items ──────────────────────────────────────────────────

const SYSTEM_SERVICE: &str = "VSX System";
const TRUNK_PREFIX: &str = "VSX Trunk ";
const MEDIA_PREFIX: &str = "VSX Media Server ";

/// An addressable service of one device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "snake_case")]
pub enum ServiceItem {
    System,
    Trunk(TrunkId),
    MediaServer(String),
}

impl ServiceItem {
    /// Parse a service name as produced by `Display`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name == SYSTEM_SERVICE {
            return Some(Self::System);
        }
        if let Some(id) = name.strip_prefix(TRUNK_PREFIX) {
            return (!id.is_empty()).then(|| Self::Trunk(TrunkId::from(id)));
        }
        name.strip_prefix(MEDIA_PREFIX)
            .filter(|alias| !alias.is_empty())
            .map(|alias| Self::MediaServer(alias.to_owned()))
    }
}

impl fmt::Display for ServiceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str(SYSTEM_SERVICE),
            Self::Trunk(id) => write!(f, "{TRUNK_PREFIX}{id}"),
            Self::MediaServer(alias) => write!(f, "{MEDIA_PREFIX}{alias}"),
        }
    }
}

/// A discovered service item with its human label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub item: ServiceItem,
    pub label: String,
}

/// Evaluation output for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResult {
    pub service: ServiceItem,
    pub results: Vec<CheckResult>,
    pub metrics: Vec<Metric>,
}

impl ServiceResult {
    pub fn new(service: ServiceItem) -> Self {
        Self {
            service,
            results: Vec::new(),
            metrics: Vec::new(),
        }
    }

    /// A service whose only output is a single result.
    pub fn single(service: ServiceItem, result: CheckResult) -> Self {
        Self {
            service,
            results: vec![result],
            metrics: Vec::new(),
        }
    }

    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    pub fn metric(&mut self, metric: Metric) {
        self.metrics.push(metric);
    }

    /// Worst state among the results.
    pub fn state(&self) -> State {
        State::worst(self.results.iter().map(|r| r.state))
    }

    /// Summaries joined in emission order.
    pub fn summary(&self) -> String {
        self.results
            .iter()
            .map(|r| r.summary.as_str())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
