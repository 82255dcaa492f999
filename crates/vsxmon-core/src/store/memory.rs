use dashmap::DashMap;

use super::{Sample, SampleStore};
use crate::error::CoreError;

/// Lock-free in-process store. Samples live as long as the process.
#[derive(Debug, Default)]
pub struct MemorySampleStore {
    samples: DashMap<String, Sample>,
}

impl MemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a sample, e.g. to resume from a known baseline.
    pub fn with_sample(self, key: impl Into<String>, sample: Sample) -> Self {
        self.samples.insert(key.into(), sample);
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleStore for MemorySampleStore {
    fn load(&self, key: &str) -> Option<Sample> {
        self.samples.get(key).map(|s| *s)
    }

    fn save(&self, key: &str, sample: Sample) -> Result<(), CoreError> {
        self.samples.insert(key.to_owned(), sample);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn round_trip_returns_exact_value() {
        let store = MemorySampleStore::new();
        let sample = Sample::now(91.1);
        store.save("a:system.session_utilization", sample).unwrap();
        assert_eq!(store.load("a:system.session_utilization"), Some(sample));
        assert_eq!(store.load("b:system.session_utilization"), None);
    }

    #[test]
    fn only_latest_write_survives() {
        let store = MemorySampleStore::new();
        for v in [1.0, 2.0, 3.0] {
            store.save("k", Sample::now(v)).unwrap();
        }
        assert_eq!(store.load("k").map(|s| s.value), Some(3.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_devices_do_not_interfere() {
        let store = Arc::new(MemorySampleStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let key = format!("vsx-{i}:system.session_utilization");
                    store.save(&key, Sample::now(f64::from(i))).unwrap();
                    store.load(&key).map(|s| s.value)
                })
            })
            .collect();
        for (i, h) in handles.into_iter().enumerate() {
            let expected = f64::from(u32::try_from(i).unwrap());
            assert_eq!(h.join().unwrap(), Some(expected));
        }
    }
}
