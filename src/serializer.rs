//! Serializer
//!
//! A deferred node holding one typed JSON document. The document is read
//! lazily on first access, validated against the declared container type on
//! every assignment, and written back pretty-printed on commit.

use crate::error::{PersistenceCause, StoreError, StoreResult};
use crate::node::deferred::{as_persist, Persist};
use crate::node::{DeferredNode, DeferredState, PathNode};
use crate::root::RootShared;
use crate::types::{NodeKey, ValueKind};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::debug;

struct Contents {
    value: Value,
    /// False while the authoritative value, if any, is still on disk.
    hydrated: bool,
}

/// Lazily hydrated JSON document.
pub struct Serializer {
    deferred: DeferredNode,
    kind: ValueKind,
    contents: Mutex<Contents>,
}

impl Serializer {
    pub(crate) fn new(root: Arc<RootShared>, path: PathBuf, kind: ValueKind) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Serializer>| Serializer {
            deferred: DeferredNode::new(
                PathNode::new(path.clone(), root),
                NodeKey::document(path, kind),
                as_persist(weak),
            ),
            kind,
            contents: Mutex::new(Contents {
                value: kind.default_value(),
                hydrated: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        self.deferred.path()
    }

    pub fn exists(&self) -> bool {
        self.deferred.exists()
    }

    /// Declared container type.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn default_value(&self) -> Value {
        self.kind.default_value()
    }

    pub fn is_hydrated(&self) -> bool {
        self.contents.lock().hydrated
    }

    pub fn state(&self) -> DeferredState {
        self.deferred.state()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.deferred.has_unsaved_changes()
    }

    pub fn pending_deletion(&self) -> bool {
        self.deferred.pending_deletion()
    }

    pub fn set_unsaved_changes(&self, unsaved: bool) {
        self.deferred.set_unsaved_changes(unsaved);
    }

    pub(crate) fn root(&self) -> &Arc<RootShared> {
        self.deferred.node().root()
    }

    /// Current value, loading it from disk on first access.
    ///
    /// Without a backing file the declared default is returned and the node
    /// stays unhydrated. A failed load leaves the node unhydrated so the read
    /// can be retried.
    pub fn read(&self) -> StoreResult<Value> {
        self.with_value(Value::clone)
    }

    /// Like [`read`](Self::read), but a document that is neither staged in
    /// memory nor present on disk is an error.
    pub fn read_required(&self) -> StoreResult<Value> {
        let mut contents = self.contents.lock();
        self.hydrate(&mut contents)?;
        if !contents.hydrated {
            return Err(StoreError::persistence(
                self.path(),
                std::io::Error::new(ErrorKind::NotFound, "document does not exist"),
            ));
        }
        Ok(contents.value.clone())
    }

    /// Replace the in-memory value and mark it unsaved.
    ///
    /// A value of the wrong container type is rejected before anything
    /// changes.
    pub fn write(&self, value: Value) -> StoreResult<()> {
        if !self.kind.accepts(&value) {
            return Err(StoreError::TypeMismatch {
                expected: self.kind,
                found: ValueKind::of(&value),
            });
        }

        let mut contents = self.contents.lock();
        contents.value = value;
        contents.hydrated = true;
        self.deferred.mark_modified();
        Ok(())
    }

    /// Persist staged state: remove the file if deletion is pending,
    /// otherwise write the document, creating parent folders as needed.
    /// A clean document is left untouched.
    pub fn commit(&self) -> StoreResult<()> {
        let mut contents = self.contents.lock();
        if !self.deferred.has_unsaved_changes() {
            return Ok(());
        }

        if self.deferred.pending_deletion() {
            self.deferred.commit()?;
            contents.hydrated = false;
        } else {
            let indent = self.root().config().persistence.indent;
            write_document(self.path(), &contents.value, indent)?;
            self.deferred.mark_clean();
            contents.hydrated = true;
        }
        Ok(())
    }

    /// Drop the in-memory value so the next read reloads from disk.
    ///
    /// With `flush_first`, unsaved changes are committed beforehand;
    /// otherwise they are discarded.
    pub fn reset_cache(&self, flush_first: bool) -> StoreResult<()> {
        if flush_first && self.has_unsaved_changes() {
            self.commit()?;
        }
        self.reset();
        Ok(())
    }

    /// Stage deletion. The logical content is gone immediately; the file is
    /// removed on commit.
    pub fn delete(&self) {
        let mut contents = self.contents.lock();
        self.deferred.schedule_deletion();
        contents.value = self.kind.default_value();
        contents.hydrated = false;
    }

    pub(crate) fn with_value<R, F>(&self, f: F) -> StoreResult<R>
    where
        F: FnOnce(&Value) -> R,
    {
        let mut contents = self.contents.lock();
        self.hydrate(&mut contents)?;
        Ok(f(&contents.value))
    }

    /// Apply an in-place mutation. The node is only marked unsaved when `f`
    /// succeeds.
    pub(crate) fn update<R, F>(&self, f: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Value) -> StoreResult<R>,
    {
        let mut contents = self.contents.lock();
        self.hydrate(&mut contents)?;
        let result = f(&mut contents.value)?;
        contents.hydrated = true;
        self.deferred.mark_modified();
        Ok(result)
    }

    fn reset(&self) {
        let mut contents = self.contents.lock();
        self.deferred.mark_clean();
        contents.value = self.kind.default_value();
        contents.hydrated = false;
    }

    fn hydrate(&self, contents: &mut Contents) -> StoreResult<()> {
        if contents.hydrated || self.deferred.pending_deletion() {
            return Ok(());
        }

        let path = self.path();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::persistence(path, e)),
        };
        let value: Value =
            serde_json::from_str(&text).map_err(|e| StoreError::persistence(path, e))?;
        if !self.kind.accepts(&value) {
            return Err(StoreError::persistence(
                path,
                PersistenceCause::UnexpectedKind {
                    expected: self.kind,
                    found: ValueKind::of(&value),
                },
            ));
        }

        debug!(path = %path.display(), kind = %self.kind, "hydrated document");
        contents.value = value;
        contents.hydrated = true;
        self.deferred.set_unsaved_changes(false);
        Ok(())
    }
}

impl Persist for Serializer {
    fn deferred(&self) -> &DeferredNode {
        &self.deferred
    }

    fn persist(&self) -> StoreResult<()> {
        self.commit()
    }

    fn discard(&self) {
        self.reset();
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("path", &self.path())
            .field("kind", &self.kind)
            .field("state", &self.state())
            .finish()
    }
}

/// Write `value` as indented JSON, overwriting any existing file.
fn write_document(path: &Path, value: &Value, indent: usize) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::persistence(parent, e))?;
    }

    let indent = vec![b' '; indent];
    let mut buffer = Vec::new();
    {
        let formatter = PrettyFormatter::with_indent(&indent);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        value
            .serialize(&mut serializer)
            .map_err(|e| StoreError::persistence(path, e))?;
    }
    buffer.push(b'\n');

    std::fs::write(path, buffer).map_err(|e| StoreError::persistence(path, e))?;
    debug!(path = %path.display(), "wrote document");
    Ok(())
}
