use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Fixed names under which each settings document is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsKey {
    Multipliers,
    PowerRanges,
    VacationList,
    MinDkp,
    Penalties,
}

impl SettingsKey {
    pub const ALL: [Self; 5] = [
        Self::Multipliers,
        Self::PowerRanges,
        Self::VacationList,
        Self::MinDkp,
        Self::Penalties,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Multipliers => "multipliers",
            Self::PowerRanges => "power_ranges",
            Self::VacationList => "vacation_list",
            Self::MinDkp => "min_dkp",
            Self::Penalties => "penalties",
        }
    }
}

/// Durable key-value storage for settings documents.
pub trait SettingsStore: Send + Sync {
    fn load(&self, key: SettingsKey) -> Result<Option<Value>, StoreError>;
    fn save(&self, key: SettingsKey, value: Value) -> Result<(), StoreError>;
    fn remove(&self, key: SettingsKey) -> Result<(), StoreError>;

    /// Writes several documents as one unit: when any write fails, the
    /// documents already written are put back the way they were.
    fn save_many(&self, entries: Vec<(SettingsKey, Value)>) -> Result<(), StoreError> {
        let mut written: Vec<(SettingsKey, Option<Value>)> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let previous = self.load(key)?;
            if let Err(error) = self.save(key, value) {
                for (key, previous) in written.into_iter().rev() {
                    let restored = match previous {
                        Some(value) => self.save(key, value),
                        None => self.remove(key),
                    };
                    if let Err(restore_error) = restored {
                        warn!(key = key.as_str(), %restore_error, "settings rollback failed");
                    }
                }
                return Err(error);
            }
            written.push((key, previous));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("settings storage io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file {path} is not a JSON object")]
    Corrupt { path: PathBuf },
    #[error("could not encode settings: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("stored '{key}' settings are invalid: {source}")]
    Decode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: Mutex<HashMap<SettingsKey, Value>>,
}

impl InMemorySettingsStore {
    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<SettingsKey, Value>>, StoreError> {
        self.values
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn load(&self, key: SettingsKey) -> Result<Option<Value>, StoreError> {
        Ok(self.values()?.get(&key).cloned())
    }

    fn save(&self, key: SettingsKey, value: Value) -> Result<(), StoreError> {
        self.values()?.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: SettingsKey) -> Result<(), StoreError> {
        self.values()?.remove(&key);
        Ok(())
    }

    fn save_many(&self, entries: Vec<(SettingsKey, Value)>) -> Result<(), StoreError> {
        self.values()?.extend(entries);
        Ok(())
    }
}

/// Keeps every settings document in one pretty-printed JSON object on disk.
/// The file is created on the first save.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(StoreError::Corrupt {
                path: self.path.clone(),
            }),
        }
    }

    fn write_all(&self, map: Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(&Value::Object(map)).map_err(StoreError::Encode)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    fn modify<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Unavailable("settings file lock poisoned".to_string()))?;
        let mut map = self.read_all()?;
        change(&mut map);
        self.write_all(map)
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self, key: SettingsKey) -> Result<Option<Value>, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Unavailable("settings file lock poisoned".to_string()))?;
        Ok(self.read_all()?.remove(key.as_str()))
    }

    fn save(&self, key: SettingsKey, value: Value) -> Result<(), StoreError> {
        self.modify(|map| {
            map.insert(key.as_str().to_string(), value);
        })
    }

    fn remove(&self, key: SettingsKey) -> Result<(), StoreError> {
        self.modify(|map| {
            map.remove(key.as_str());
        })
    }

    /// Rewrites the file once with every entry applied.
    fn save_many(&self, entries: Vec<(SettingsKey, Value)>) -> Result<(), StoreError> {
        self.modify(|map| {
            for (key, value) in entries {
                map.insert(key.as_str().to_string(), value);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "kingdom-dkp-store-{}-{}.json",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn in_memory_store_round_trips_values() {
        let store = InMemorySettingsStore::default();
        assert!(store.load(SettingsKey::MinDkp).expect("load").is_none());

        store
            .save(SettingsKey::MinDkp, json!({"1": 500}))
            .expect("save");
        assert_eq!(
            store.load(SettingsKey::MinDkp).expect("load"),
            Some(json!({"1": 500}))
        );

        store.remove(SettingsKey::MinDkp).expect("remove");
        assert!(store.load(SettingsKey::MinDkp).expect("load").is_none());
    }

    #[test]
    fn json_file_store_keeps_keys_side_by_side() {
        let path = scratch_path("side-by-side");
        let _ = fs::remove_file(&path);
        let store = JsonFileSettingsStore::new(&path);

        assert!(store.load(SettingsKey::Penalties).expect("missing file").is_none());

        store
            .save(SettingsKey::Multipliers, json!({"t4": 1.0, "t5": 2.0, "deads": 3.0}))
            .expect("save multipliers");
        store
            .save(SettingsKey::VacationList, json!(["7"]))
            .expect("save vacation");

        let reopened = JsonFileSettingsStore::new(&path);
        assert_eq!(
            reopened.load(SettingsKey::VacationList).expect("load"),
            Some(json!(["7"]))
        );

        reopened
            .remove(SettingsKey::VacationList)
            .expect("remove vacation");
        let raw: Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read file")).expect("json");
        assert!(raw.get("vacation_list").is_none());
        assert_eq!(raw["multipliers"]["t5"], 2.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn json_file_store_rejects_non_object_files() {
        let path = scratch_path("corrupt");
        fs::write(&path, "[1, 2, 3]").expect("write fixture");
        let store = JsonFileSettingsStore::new(&path);

        match store.load(SettingsKey::Multipliers) {
            Err(StoreError::Corrupt { .. }) => {}
            other => panic!("expected corrupt store error, got {other:?}"),
        }

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn json_file_store_saves_batches_in_one_write() {
        let path = scratch_path("batch");
        let _ = fs::remove_file(&path);
        let store = JsonFileSettingsStore::new(&path);
        store
            .save(SettingsKey::MinDkp, json!({"1": 10}))
            .expect("seed baselines");

        store
            .save_many(vec![
                (SettingsKey::Multipliers, json!({"t4": 4.0, "t5": 5.0, "deads": 1.0})),
                (SettingsKey::VacationList, json!(["3"])),
            ])
            .expect("save batch");

        let raw: Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read file")).expect("json");
        assert_eq!(raw["multipliers"]["t4"], 4.0);
        assert_eq!(raw["vacation_list"], json!(["3"]));
        assert_eq!(raw["min_dkp"], json!({"1": 10}));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn keys_use_fixed_storage_names() {
        let names: Vec<_> = SettingsKey::ALL.iter().map(|key| key.as_str()).collect();
        assert_eq!(
            names,
            ["multipliers", "power_ranges", "vacation_list", "min_dkp", "penalties"]
        );
    }
}
