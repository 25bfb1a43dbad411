//! Attribute containers
//!
//! An ordered key/value document exposed through the [`Mapping`] capability.
//! Every mutation writes through to the underlying serializer and marks it
//! unsaved.

use crate::error::{StoreError, StoreResult};
use crate::serializer::Serializer;
use crate::types::ValueKind;
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Map-like access to a keyed container.
///
/// All operations hydrate the container from disk on first use.
pub trait Mapping {
    /// Value stored under `key`; `KeyNotFound` if absent.
    fn get(&self, key: &str) -> StoreResult<Value>;

    /// Insert or replace `key`, preserving the position of an existing key.
    fn set(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Remove `key`; `KeyNotFound` if absent.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Keys in insertion order.
    fn keys(&self) -> StoreResult<Vec<String>>;

    fn len(&self) -> StoreResult<usize>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        Ok(self.keys()?.iter().any(|k| k == key))
    }
}

/// Ordered key/value document.
#[derive(Clone)]
pub struct Attribute {
    serializer: Arc<Serializer>,
}

impl Attribute {
    pub(crate) fn new(serializer: Arc<Serializer>) -> Self {
        debug_assert_eq!(serializer.kind(), ValueKind::Object);
        Self { serializer }
    }

    pub fn serializer(&self) -> &Arc<Serializer> {
        &self.serializer
    }

    /// Whether both handles refer to the same in-memory node.
    pub fn ptr_eq(&self, other: &Attribute) -> bool {
        Arc::ptr_eq(&self.serializer, &other.serializer)
    }

    /// Snapshot of the whole map.
    pub fn to_map(&self) -> StoreResult<Map<String, Value>> {
        self.serializer
            .with_value(|value| value.as_object().cloned().unwrap_or_default())
    }

    fn key_not_found(&self, key: &str) -> StoreError {
        StoreError::KeyNotFound {
            key: key.to_string(),
            path: self.serializer.path().to_path_buf(),
        }
    }
}

fn object_mut(value: &mut Value) -> StoreResult<&mut Map<String, Value>> {
    let found = ValueKind::of(value);
    value.as_object_mut().ok_or(StoreError::TypeMismatch {
        expected: ValueKind::Object,
        found,
    })
}

impl Mapping for Attribute {
    fn get(&self, key: &str) -> StoreResult<Value> {
        self.serializer
            .with_value(|value| value.get(key).cloned())?
            .ok_or_else(|| self.key_not_found(key))
    }

    fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        self.serializer.update(|current| {
            object_mut(current)?.insert(key.to_string(), value);
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.serializer.update(|current| {
            object_mut(current)?
                .shift_remove(key)
                .map(|_| ())
                .ok_or_else(|| self.key_not_found(key))
        })
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        self.serializer.with_value(|value| {
            value
                .as_object()
                .map(|map| map.keys().cloned().collect())
                .unwrap_or_default()
        })
    }

    fn len(&self) -> StoreResult<usize> {
        self.serializer
            .with_value(|value| value.as_object().map_or(0, Map::len))
    }

    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        self.serializer
            .with_value(|value| value.as_object().is_some_and(|map| map.contains_key(key)))
    }
}

impl Deref for Attribute {
    type Target = Serializer;

    fn deref(&self) -> &Serializer {
        &self.serializer
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("path", &self.serializer.path())
            .field("state", &self.serializer.state())
            .finish()
    }
}
