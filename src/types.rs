//! Core types shared across the node hierarchy.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Declared container type of a serialized document.
///
/// `Any` accepts every JSON value and defaults to `null`; the other variants
/// accept only values of their own shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Any,
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Kind of a concrete value. Never returns `Any`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        self == ValueKind::Any || Self::of(value) == self
    }

    /// Empty instance of the declared type.
    pub fn default_value(self) -> Value {
        match self {
            ValueKind::Any | ValueKind::Null => Value::Null,
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Number => Value::from(0),
            ValueKind::String => Value::String(String::new()),
            ValueKind::Array => Value::Array(Vec::new()),
            ValueKind::Object => Value::Object(serde_json::Map::new()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Any => "any",
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of node tracked by the ledger and the identity caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Directory,
    Document(ValueKind),
}

/// Identity of a node below a root: its normalized path plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub path: PathBuf,
    pub kind: NodeKind,
}

impl NodeKey {
    pub fn directory(path: PathBuf) -> Self {
        NodeKey {
            path,
            kind: NodeKind::Directory,
        }
    }

    pub fn document(path: PathBuf, kind: ValueKind) -> Self {
        NodeKey {
            path,
            kind: NodeKind::Document(kind),
        }
    }
}

/// Summary of a bulk commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Nodes whose staged state was persisted.
    pub committed: usize,
    /// Of those, nodes that were physically removed.
    pub deleted: usize,
}
