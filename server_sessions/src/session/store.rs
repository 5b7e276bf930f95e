//! Typed key/value accessors over the active session mapping.
//!
//! Reads and writes are total: a missing key yields the default, an
//! unserializable value is dropped with an error log. While no session is
//! active the mapping reads as empty.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::backend::SessionBackend;

use super::manager::Session;

impl<B: SessionBackend> Session<B> {
    /// Returns the value stored under `key`, or `None` when the key is
    /// absent or the stored value does not deserialize to `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.backend()
            .entries()
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Returns the value stored under `key`, or `default` when absent.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Upserts `value` under `key`.
    pub fn put<T: Serialize>(&mut self, key: &str, value: T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.backend_mut().entries_mut().insert(key.to_string(), value);
            }
            Err(err) => {
                tracing::error!("Failed to serialize session value for key {key}: {err}");
            }
        }
    }

    /// Whether `key` is present, independent of its value; a stored JSON
    /// null still counts as present.
    pub fn has(&self, key: &str) -> bool {
        self.backend().entries().contains_key(key)
    }

    /// Removes `key` if present, a no-op otherwise.
    pub fn delete(&mut self, key: &str) {
        self.backend_mut().entries_mut().remove(key);
    }

    /// Removes every entry, the flash namespace container included.
    pub fn clear(&mut self) {
        self.backend_mut().entries_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;
    use serde_json::Value;

    use crate::backend::MemoryBackend;
    use crate::SessionBackend;
    use crate::config::SessionConfig;
    use crate::session::manager::{DEFAULT_FLASH_KEY, Session};

    async fn started_session() -> Session<MemoryBackend> {
        let mut session = Session::new(SessionConfig::default(), MemoryBackend::new()).unwrap();
        session.start().await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let mut session = started_session().await;

        session.put("key", "value");
        assert_eq!(session.get::<String>("key"), Some("value".to_string()));

        session.put("key", 1);
        assert_eq!(session.get::<i64>("key"), Some(1));

        session.put("key", 3.14);
        assert_eq!(session.get::<f64>("key"), Some(3.14));

        session.put("key", true);
        assert_eq!(session.get::<bool>("key"), Some(true));
        session.put("key", false);
        assert_eq!(session.get::<bool>("key"), Some(false));

        assert_eq!(session.get::<String>("non_existent_key"), None);
        assert_eq!(session.get_or("non_existent_key", 4), 4);
    }

    #[tokio::test]
    async fn test_get_with_mismatched_type_yields_default() {
        let mut session = started_session().await;

        session.put("count", "not a number");
        assert_eq!(session.get::<u32>("count"), None);
        assert_eq!(session.get_or("count", 7), 7);
    }

    #[tokio::test]
    async fn test_has_is_independent_of_value() {
        let mut session = started_session().await;

        assert!(!session.has("key"));

        session.put("key", "value");
        assert!(session.has("key"));

        // A stored null still counts as present
        session.put("key", Value::Null);
        assert!(session.has("key"));
        assert_eq!(session.get::<String>("key"), None);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let mut session = started_session().await;

        session.put("key", "value");
        session.put("key2", "value2");
        session.put("key3", "value3");

        session.delete("key");
        assert!(!session.has("key"));
        assert!(session.has("key2"));

        // Deleting a missing key is a no-op
        session.delete("key");

        session.clear();
        assert!(session.backend().entries().is_empty());
        // clear is total: the flash container is gone too
        assert!(!session.has(DEFAULT_FLASH_KEY));
    }

    #[tokio::test]
    async fn test_reads_without_start_are_empty() {
        let mut session = Session::new(SessionConfig::default(), MemoryBackend::new()).unwrap();

        assert_eq!(session.get::<String>("key"), None);
        assert!(!session.has("key"));
        session.delete("key");
        session.clear();
    }

    #[derive(Debug, Clone)]
    enum Op {
        Put(String, i64),
        Delete(String),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let key = prop::sample::select(vec!["a", "b", "c", "d"]);
        prop_oneof![
            (key.clone(), any::<i64>()).prop_map(|(k, v)| Op::Put(k.to_string(), v)),
            key.prop_map(|k| Op::Delete(k.to_string())),
        ]
    }

    proptest! {
        // Any put/delete sequence leaves the mapping equal to the same
        // sequence replayed on a plain map.
        #[test]
        fn prop_replay_matches_reference(ops in prop::collection::vec(op_strategy(), 0..32)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let mut session = rt.block_on(async { started_session().await });
            let mut reference: HashMap<String, i64> = HashMap::new();

            for op in &ops {
                match op {
                    Op::Put(k, v) => {
                        session.put(k, *v);
                        reference.insert(k.clone(), *v);
                    }
                    Op::Delete(k) => {
                        session.delete(k);
                        reference.remove(k);
                    }
                }
            }

            for key in ["a", "b", "c", "d"] {
                prop_assert_eq!(session.get::<i64>(key), reference.get(key).copied());
                prop_assert_eq!(session.has(key), reference.contains_key(key));
            }
            // Only the flash container remains on top of the reference keys
            let extras: Vec<&str> = session
                .backend()
                .entries()
                .keys()
                .map(|k| k.as_str())
                .filter(|k| !reference.contains_key(*k))
                .collect();
            prop_assert_eq!(extras, vec![DEFAULT_FLASH_KEY]);
        }
    }
}
