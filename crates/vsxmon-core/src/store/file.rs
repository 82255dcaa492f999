// JSON file-backed sample store for one-shot runs.
//
// Several runs may share one file: every device polled under one profile.
// A save therefore takes an exclusive lock on a sibling `.lock` file,
// re-reads the current file, overlays only the keys this store wrote,
// and replaces the target through a temp file and rename.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dashmap::DashMap;
use tracing::{debug, warn};

use super::{Sample, SampleStore};
use crate::error::CoreError;

type Stored = BTreeMap<String, Sample>;

#[derive(Debug)]
pub struct FileSampleStore {
    path: PathBuf,
    samples: DashMap<String, Sample>,
    /// Keys saved through this store; the only ones a flush may overwrite.
    written: Mutex<Stored>,
}

impl FileSampleStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file starts empty. A file that does not parse is logged
    /// and replaced on the next save: losing the baseline only costs one
    /// cycle of drop detection.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let stored = read_stored(&path)?;
        debug!(path = %path.display(), samples = stored.len(), "opened sample store");

        Ok(Self {
            path,
            samples: stored.into_iter().collect(),
            written: Mutex::new(Stored::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), CoreError> {
        let written = self
            .written
            .lock()
            .map_err(|_| CoreError::Internal("sample store flush lock poisoned".into()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| store_error(parent, &e))?;
        }
        let _lock = self.lock_file()?;

        let mut merged = read_stored(&self.path)?;
        merged.extend(written.iter().map(|(k, v)| (k.clone(), *v)));

        let body = serde_json::to_string_pretty(&merged).map_err(|e| CoreError::SampleStore {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        let tmp = self.sibling(&format!(".{}.tmp", std::process::id()));
        fs::write(&tmp, body).map_err(|e| store_error(&tmp, &e))?;
        fs::rename(&tmp, &self.path).map_err(|e| store_error(&self.path, &e))?;

        // Pick up what other runs wrote since `open`.
        for (key, sample) in merged {
            self.samples.insert(key, sample);
        }
        Ok(())
    }

    /// Exclusive advisory lock, released when the handle drops.
    fn lock_file(&self) -> Result<File, CoreError> {
        let path = self.sibling(".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| store_error(&path, &e))?;
        file.lock().map_err(|e| store_error(&path, &e))?;
        Ok(file)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

impl SampleStore for FileSampleStore {
    fn load(&self, key: &str) -> Option<Sample> {
        self.samples.get(key).map(|s| *s)
    }

    fn save(&self, key: &str, sample: Sample) -> Result<(), CoreError> {
        self.samples.insert(key.to_owned(), sample);
        self.written
            .lock()
            .map_err(|_| CoreError::Internal("sample store flush lock poisoned".into()))?
            .insert(key.to_owned(), sample);
        self.flush()
    }
}

/// Current file contents; missing or unparseable files read as empty.
fn read_stored(path: &Path) -> Result<Stored, CoreError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "unreadable sample store, starting empty");
            Stored::new()
        })),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Stored::new()),
        Err(e) => Err(store_error(path, &e)),
    }
}

fn store_error(path: &Path, err: &io::Error) -> CoreError {
    CoreError::SampleStore {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn samples_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("samples.json");

        let store = FileSampleStore::open(&path).unwrap();
        assert_eq!(store.load("vsx:system.session_utilization"), None);
        let sample = Sample::now(91.1);
        store.save("vsx:system.session_utilization", sample).unwrap();

        let reopened = FileSampleStore::open(&path).unwrap();
        assert_eq!(reopened.load("vsx:system.session_utilization"), Some(sample));
    }

    #[test]
    fn no_temp_file_is_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.json");
        let store = FileSampleStore::open(&path).unwrap();
        store.save("k", Sample::now(1.0)).unwrap();

        let mut names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["samples.json".to_owned(), "samples.json.lock".to_owned()]);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileSampleStore::open(&path).unwrap();
        assert_eq!(store.load("k"), None);
        store.save("k", Sample::now(3.0)).unwrap();
        assert_eq!(FileSampleStore::open(&path).unwrap().load("k").map(|s| s.value), Some(3.0));
    }

    #[test]
    fn runs_sharing_a_file_keep_each_others_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.json");
        FileSampleStore::open(&path)
            .unwrap()
            .save("a:system.session_utilization", Sample::now(91.1))
            .unwrap();

        let run_a = FileSampleStore::open(&path).unwrap();
        let run_b = FileSampleStore::open(&path).unwrap();
        run_a.save("a:system.session_utilization", Sample::now(50.0)).unwrap();
        run_b.save("b:system.session_utilization", Sample::now(10.0)).unwrap();

        let reopened = FileSampleStore::open(&path).unwrap();
        assert_eq!(
            reopened.load("a:system.session_utilization").map(|s| s.value),
            Some(50.0)
        );
        assert_eq!(
            reopened.load("b:system.session_utilization").map(|s| s.value),
            Some(10.0)
        );
        assert_eq!(
            run_b.load("a:system.session_utilization").map(|s| s.value),
            Some(50.0)
        );
    }
}
