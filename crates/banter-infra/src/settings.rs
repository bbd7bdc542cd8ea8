//! JSON-file-backed settings store.
//!
//! Runtime-mutable knobs live in an in-memory map for synchronous access
//! from the engine's handlers; `persist` flushes the whole map to a JSON
//! file. Writes go through a temp file and a rename so a crash mid-write
//! never leaves a truncated settings file behind.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use banter_core::gateway::SettingsStore;
use banter_types::error::SettingsError;
use serde_json::Value;

/// Settings store backed by a single JSON object on disk.
pub struct JsonSettingsStore {
    path: PathBuf,
    // BTreeMap so the persisted file has a stable key order
    values: Mutex<BTreeMap<String, Value>>,
}

impl JsonSettingsStore {
    /// Open the store at `path`, loading any existing file.
    ///
    /// A missing file starts empty; a malformed one is logged and treated
    /// as empty rather than taking the bot down.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(err) => {
                    tracing::warn!(
                        "failed to parse {}: {err}, starting with empty settings",
                        path.display()
                    );
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                tracing::warn!(
                    "failed to read {}: {err}, starting with empty settings",
                    path.display()
                );
                BTreeMap::new()
            }
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn get(&self, key: &str) -> Option<Value> {
        match self.values.lock() {
            Ok(values) => values.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    fn set(&self, key: &str, value: Value) {
        match self.values.lock() {
            Ok(mut values) => {
                values.insert(key.to_string(), value);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key.to_string(), value);
            }
        }
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get_u32(&self, key: &str, default: u32) -> u32 {
        self.get(key)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(default)
    }

    fn set_u32(&self, key: &str, value: u32) {
        self.set(key, Value::from(value));
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.set(key, Value::from(value));
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(str::to_string))
    }

    fn set_string(&self, key: &str, value: &str) {
        self.set(key, Value::from(value));
    }

    fn get_strings(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(|v| {
                v.as_array().map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect()
                })
            })
            .unwrap_or_default()
    }

    fn set_strings(&self, key: &str, values: &[String]) {
        self.set(key, Value::from(values.to_vec()));
    }

    async fn persist(&self) -> Result<(), SettingsError> {
        let snapshot = match self.values.lock() {
            Ok(values) => values.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let content = serde_json::to_vec_pretty(&snapshot)
            .map_err(|err| SettingsError::Serde(err.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &content)
            .await
            .map_err(|err| SettingsError::Io(err.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|err| SettingsError::Io(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::open(tmp.path().join("settings.json")).await;
        assert_eq!(store.get_u32("quota_usage", 7), 7);
        assert!(store.get_string("base_prompt").is_none());
    }

    #[tokio::test]
    async fn typed_accessors_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::open(tmp.path().join("settings.json")).await;

        store.set_u32("quota_usage", 12);
        store.set_bool("learn_enabled", true);
        store.set_string("base_prompt", "be nice");
        store.set_strings("waifus", &["alice".to_string(), "bob".to_string()]);

        assert_eq!(store.get_u32("quota_usage", 0), 12);
        assert!(store.get_bool("learn_enabled", false));
        assert_eq!(store.get_string("base_prompt").as_deref(), Some("be nice"));
        assert_eq!(
            store.get_strings("waifus"),
            vec!["alice".to_string(), "bob".to_string()]
        );
    }

    #[tokio::test]
    async fn wrong_type_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::open(tmp.path().join("settings.json")).await;
        store.set_string("quota_usage", "not a number");
        assert_eq!(store.get_u32("quota_usage", 3), 3);
    }

    #[tokio::test]
    async fn persist_and_reopen_restores_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");

        let store = JsonSettingsStore::open(&path).await;
        store.set_u32("quota_usage", 5);
        store.set_strings("waifus", &["alice".to_string()]);
        store.persist().await.unwrap();

        let reopened = JsonSettingsStore::open(&path).await;
        assert_eq!(reopened.get_u32("quota_usage", 0), 5);
        assert_eq!(reopened.get_strings("waifus"), vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn malformed_file_is_treated_as_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        tokio::fs::write(&path, "{ definitely not json").await.unwrap();

        let store = JsonSettingsStore::open(&path).await;
        assert_eq!(store.get_u32("quota_usage", 0), 0);
        // And a persist repairs the file
        store.set_u32("quota_usage", 1);
        store.persist().await.unwrap();
        let reopened = JsonSettingsStore::open(&path).await;
        assert_eq!(reopened.get_u32("quota_usage", 0), 1);
    }
}
