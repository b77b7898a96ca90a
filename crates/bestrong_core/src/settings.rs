use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SettingsError;

pub const KEY_THEME_MODE: &str = "theme_mode";
pub const KEY_LAST_MESSAGE: &str = "last_message";
pub const KEY_MESSAGE_COUNT: &str = "message_count";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Int(i64),
    Text(String),
}

/// Key/value persistence for the handful of values the shell remembers.
///
/// Writes are synchronous and immediately durable for file-backed stores.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<SettingValue>;
    fn put(&self, key: &str, value: SettingValue) -> Result<(), SettingsError>;

    fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(SettingValue::Int(value)) => value,
            _ => default,
        }
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(SettingValue::Text(value)) => value,
            _ => default.to_string(),
        }
    }

    fn put_int(&self, key: &str, value: i64) -> Result<(), SettingsError> {
        self.put(key, SettingValue::Int(value))
    }

    fn put_string(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.put(key, SettingValue::Text(value.to_string()))
    }
}

/// Process-local store. Counts writes so callers can observe write-through behaviour.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<BTreeMap<String, SettingValue>>,
    writes: AtomicUsize,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: SettingValue) -> Result<(), SettingsError> {
        self.values.write().insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// TOML-file backed store; the whole table is rewritten on every change.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    values: RwLock<BTreeMap<String, SettingValue>>,
}

impl FileSettings {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            match toml::from_str::<BTreeMap<String, SettingValue>>(&raw) {
                Ok(values) => values,
                Err(err) => {
                    warn!(path = %path.display(), %err, "discarding unreadable settings file");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = values.len(), "settings loaded");
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, SettingValue>) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: SettingValue) -> Result<(), SettingsError> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value);
        self.persist(&values)
    }
}
