// ── Sample store ──
//
// Keeps the previous value of trend-checked metrics across polling cycles.
// Keys are `<device scope>:<metric key>`; an entry is overwritten every
// cycle and never deleted.

mod file;
mod memory;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub use file::FileSampleStore;
pub use memory::MemorySampleStore;

/// Last observed value of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f64,
    pub written_at: DateTime<Utc>,
}

impl Sample {
    /// A sample stamped with the current time.
    pub fn now(value: f64) -> Self {
        Self {
            value,
            written_at: Utc::now(),
        }
    }
}

/// Persistence for previous samples.
///
/// Implementations must tolerate concurrent access from unrelated keys so
/// several devices can share one store.
pub trait SampleStore: Send + Sync {
    fn load(&self, key: &str) -> Option<Sample>;

    fn save(&self, key: &str, sample: Sample) -> Result<(), CoreError>;
}

/// Build a store key from a device scope and a metric key.
pub fn sample_key(scope: &str, metric: &str) -> String {
    format!("{scope}:{metric}")
}

/// Write access to a store for one evaluation pass of one device.
///
/// Each key may be written at most once per pass.
pub struct CycleSamples<'a> {
    store: &'a dyn SampleStore,
    scope: &'a str,
    written: HashSet<String>,
}

impl<'a> CycleSamples<'a> {
    pub fn new(store: &'a dyn SampleStore, scope: &'a str) -> Self {
        Self {
            store,
            scope,
            written: HashSet::new(),
        }
    }

    pub fn scope(&self) -> &str {
        self.scope
    }

    /// The stored sample for `metric` as of the start of this write.
    pub fn previous(&self, metric: &str) -> Option<Sample> {
        self.store.load(&sample_key(self.scope, metric))
    }

    /// Overwrite the sample for `metric`.
    pub fn record(&mut self, metric: &str, value: f64) -> Result<(), CoreError> {
        let key = sample_key(self.scope, metric);
        if !self.written.insert(key.clone()) {
            return Err(CoreError::DuplicateSampleWrite { key });
        }
        self.store.save(&key, Sample::now(value))
    }
}
