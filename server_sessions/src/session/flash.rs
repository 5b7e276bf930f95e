//! Read-once flash messages.
//!
//! The flash namespace is one reserved entry in the session mapping, holding
//! string messages. A successful [`Session::flash_get`] removes the entry in
//! the same operation, so each message is read at most once; unread messages
//! persist until cleared or the session is destroyed.

use serde_json::{Map, Value};

use crate::backend::SessionBackend;

use super::manager::Session;

impl<B: SessionBackend> Session<B> {
    /// Upserts `message` under `key` in the flash namespace, silently
    /// overwriting an unread message.
    pub fn flash_put(&mut self, key: &str, message: impl Into<String>) {
        let message = message.into();
        let flash_key = self.flash_key().to_string();
        let container = self
            .backend_mut()
            .entries_mut()
            .entry(flash_key)
            .or_insert_with(|| Value::Object(Map::new()));
        if !container.is_object() {
            *container = Value::Object(Map::new());
        }
        if let Some(map) = container.as_object_mut() {
            map.insert(key.to_string(), Value::String(message));
        }
    }

    /// Returns the message under `key` and removes it, or `None` when no
    /// message is present. A second call for the same key yields `None`.
    pub fn flash_get(&mut self, key: &str) -> Option<String> {
        let flash_key = self.flash_key().to_string();
        let map = self
            .backend_mut()
            .entries_mut()
            .get_mut(&flash_key)?
            .as_object_mut()?;
        let value = map.remove(key)?;
        Some(match value {
            Value::String(message) => message,
            other => other.to_string(),
        })
    }

    /// Whether a message is waiting under `key`. Does not consume the entry.
    pub fn flash_has(&self, key: &str) -> bool {
        self.backend()
            .entries()
            .get(self.flash_key())
            .and_then(|container| container.as_object())
            .is_some_and(|map| map.contains_key(key))
    }

    /// Removes every flash message, leaving the (now empty) namespace
    /// container and all other session keys in place.
    pub fn flash_clear(&mut self) {
        let flash_key = self.flash_key().to_string();
        if let Some(map) = self
            .backend_mut()
            .entries_mut()
            .get_mut(&flash_key)
            .and_then(|container| container.as_object_mut())
        {
            map.clear();
        }
    }
}
