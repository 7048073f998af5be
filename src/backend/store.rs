use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whole-document JSON key/value store.
///
/// Every save reads the entire file, merges its keys and replaces the file
/// through a sibling temp file, so a reader never sees a partial document.
/// Clones share one write lock; saves from different threads are applied
/// one after another.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load one key. Missing file, missing key, null, unreadable file and
    /// corrupt JSON all come back as `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(e) => {
                warn!("Failed to read data store {:?}: {}", self.path, e);
                return None;
            }
        };
        match document.remove(key) {
            None | Some(Value::Null) => None,
            Some(value) => match serde_json::from_value(value) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!("Ignoring malformed '{}' in data store: {}", key, e);
                    None
                }
            },
        }
    }

    /// Serialize `data` and merge it into the document under `key`
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(data)?;
        self.save_value(key, value)
    }

    pub fn save_value(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.save_entries(vec![(key.to_string(), value)])
    }

    /// Merge all `entries` into the document and write it once
    pub fn save_entries<K: Into<String>>(
        &self,
        entries: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(StoreError::Json(e)) => {
                warn!("Replacing corrupt data store {:?}: {}", self.path, e);
                Map::new()
            }
            Err(e) => return Err(e),
        };
        let mut keys = Vec::new();
        for (key, value) in entries {
            let key = key.into();
            document.insert(key.clone(), value);
            keys.push(key);
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(document))?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        debug!("Saved {:?} to {:?}", keys, self.path);
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_document(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}
