use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use foresight_core::errors::{ForesightResult, StorageError};
use foresight_core::traits::IKeyValueStore;

/// String store persisted as one JSON object on disk.
///
/// The whole map is rewritten (temp file + rename) on every mutation. An
/// unreadable file at open is logged and treated as empty.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

fn io_err(path: &Path, e: impl std::fmt::Display) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> ForesightResult<Self> {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable store file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(io_err(&path, e).into()),
        };
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> ForesightResult<()> {
        let raw = serde_json::to_string(items)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(|e| io_err(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e))?;
        Ok(())
    }
}

impl IKeyValueStore for JsonFileStore {
    fn get_item(&self, key: &str) -> ForesightResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> ForesightResult<()> {
        let mut items = self.lock();
        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&items) {
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> ForesightResult<()> {
        let mut items = self.lock();
        if items.remove(key).is_some() {
            self.flush(&items)?;
        }
        Ok(())
    }

    fn keys(&self) -> ForesightResult<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}
