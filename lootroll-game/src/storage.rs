//! In-memory key-value backend.
//!
//! Handles are cheap clones sharing one map, so a host (or a test) can keep a
//! handle and inspect what the session wrote.
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

use crate::KeyValueStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryStoreError {
    #[error("store is read-only, refused write to `{0}`")]
    ReadOnly(String),
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Rc<RefCell<HashMap<String, String>>>,
    writes: Rc<Cell<usize>>,
    read_only: Rc<Cell<bool>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without counting it as a write.
    #[must_use]
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Successful `set` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Make every subsequent `set` fail.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    type Error = MemoryStoreError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        if self.read_only.get() {
            return Err(MemoryStoreError::ReadOnly(key.to_string()));
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
