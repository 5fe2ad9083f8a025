use estate_hub::marketplace::{secure_filename, ImageStore, UploadError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Listing images kept as flat files under a single directory.
#[derive(Debug, Clone)]
pub(crate) struct DiskImageStore {
    root: PathBuf,
}

impl DiskImageStore {
    pub(crate) fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Only names that are already a single sanitized component map to a path.
    fn path_for(&self, filename: &str) -> Option<PathBuf> {
        match secure_filename(filename) {
            Some(safe) if safe == filename => Some(self.root.join(safe)),
            _ => None,
        }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }
}

impl ImageStore for DiskImageStore {
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let path = self
            .path_for(filename)
            .ok_or_else(|| UploadError::UnsupportedFileType {
                filename: filename.to_string(),
            })?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|err| UploadError::Storage(format!("{}: {err}", path.display())))?;
        file.write_all(bytes)
            .map_err(|err| UploadError::Storage(err.to_string()))?;
        debug!(path = %path.display(), size = bytes.len(), "listing image written");
        Ok(filename.to_string())
    }

    fn load(&self, filename: &str) -> Result<Option<Vec<u8>>, UploadError> {
        let Some(path) = self.path_for(filename) else {
            return Ok(None);
        };
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(UploadError::Storage(err.to_string())),
        }
    }

    fn remove(&self, filename: &str) -> Result<(), UploadError> {
        let Some(path) = self.path_for(filename) else {
            return Ok(());
        };
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "listing image removed");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UploadError::Storage(err.to_string())),
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryImageStore {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl ImageStore for InMemoryImageStore {
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let mut guard = self
            .files
            .lock()
            .map_err(|_| UploadError::Storage("image store mutex poisoned".to_string()))?;
        if guard.contains_key(filename) {
            return Err(UploadError::Storage(format!("{filename} already stored")));
        }
        guard.insert(filename.to_string(), bytes.to_vec());
        Ok(filename.to_string())
    }

    fn load(&self, filename: &str) -> Result<Option<Vec<u8>>, UploadError> {
        let guard = self
            .files
            .lock()
            .map_err(|_| UploadError::Storage("image store mutex poisoned".to_string()))?;
        Ok(guard.get(filename).cloned())
    }

    fn remove(&self, filename: &str) -> Result<(), UploadError> {
        let mut guard = self
            .files
            .lock()
            .map_err(|_| UploadError::Storage("image store mutex poisoned".to_string()))?;
        guard.remove(filename);
        Ok(())
    }
}

impl InMemoryImageStore {
    pub(crate) fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .files
            .lock()
            .map(|guard| guard.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

#[cfg(test)]
pub(crate) fn scratch_dir(label: &str) -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "estate-hub-{label}-{}-{unique}",
        std::process::id()
    ))
}
