use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::error::EngineError;

/// Failure of a key-value backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::persistence(e.to_string())
    }
}

/// String key-value persistence. Browser `localStorage` on the web,
/// an in-memory map everywhere else.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. `failing()` builds one that rejects every call.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    writes: usize,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Number of successful `set` calls.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing {
            Err(StoreError::Unavailable("memory store is offline".into()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries.remove(key);
        Ok(())
    }
}

/// Decode the JSON value under `key`, if any.
pub fn load<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Decode {
            key: key.to_string(),
            source,
        })
}

/// Decode the value under `key`, falling back to `T::default()` when it is
/// missing, unreadable or the store is down. Never fails.
pub fn load_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    match load(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            log::warn!("using defaults for {}: {}", key, e);
            T::default()
        }
    }
}

/// Encode `value` and write it under `key` unless the stored copy is already
/// identical. Returns whether a write happened.
pub fn save_idempotent<T, S>(store: &mut S, key: &str, value: &T) -> Result<bool, StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let encoded = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    if store.get(key)?.as_deref() == Some(encoded.as_str()) {
        return Ok(false);
    }
    store.set(key, &encoded)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Record {
        level: u32,
        name: String,
    }

    #[test]
    fn save_then_load() {
        let mut store = MemoryStore::new();
        let record = Record {
            level: 4,
            name: "Ruth".into(),
        };
        assert!(save_idempotent(&mut store, "r", &record).unwrap());
        assert_eq!(load::<Record, _>(&store, "r").unwrap(), Some(record));
    }

    #[test]
    fn identical_save_skips_write() {
        let mut store = MemoryStore::new();
        let record = Record::default();
        assert!(save_idempotent(&mut store, "r", &record).unwrap());
        assert!(!save_idempotent(&mut store, "r", &record).unwrap());
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn missing_key_defaults() {
        let store = MemoryStore::new();
        assert_eq!(load_or_default::<Record, _>(&store, "absent"), Record::default());
    }

    #[test]
    fn corrupt_value_defaults() {
        let mut store = MemoryStore::new();
        store.set("r", "[1, 2").unwrap();
        assert!(matches!(
            load::<Record, _>(&store, "r"),
            Err(StoreError::Decode { .. })
        ));
        assert_eq!(load_or_default::<Record, _>(&store, "r"), Record::default());
    }

    #[test]
    fn offline_store_fails_open_on_read() {
        let mut store = MemoryStore::failing();
        assert_eq!(load_or_default::<Record, _>(&store, "r"), Record::default());
        let err = save_idempotent(&mut store, "r", &Record::default()).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        let engine: EngineError = err.into();
        assert!(matches!(engine, EngineError::PersistenceUnavailable { .. }));
    }
}
