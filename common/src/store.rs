//! The ledger state store as seen by the contract.
//!
//! The ledger platform owns durability and ordering. The contract only needs
//! per-key reads and writes, plus the guarantee that the writes of one
//! invocation are applied together or not at all. [`Transaction`] gives the
//! state machine that guarantee by buffering writes until the host commits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Writes buffered by one invocation, applied in key order on commit.
pub type WriteSet = BTreeMap<String, Vec<u8>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("read of `{key}` failed: {reason}")]
    Read { key: String, reason: String },

    #[error("write of `{key}` failed: {reason}")]
    Write { key: String, reason: String },
}

impl StoreError {
    pub fn key(&self) -> &str {
        match self {
            StoreError::Read { key, .. } | StoreError::Write { key, .. } => key,
        }
    }
}

pub trait LedgerStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;
}

/// An in-process store, used for contract state held as a single blob and in
/// tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LedgerStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// A read-through overlay over a store that buffers every write.
///
/// Reads see the invocation's own earlier writes. Nothing reaches the
/// underlying store until [`Transaction::into_writes`] is handed to the host.
pub struct Transaction<'a, S: LedgerStore + ?Sized> {
    store: &'a S,
    writes: WriteSet,
}

impl<'a, S: LedgerStore + ?Sized> Transaction<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            writes: WriteSet::new(),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.store.get(key),
        }
    }

    pub fn put(&mut self, key: &str, value: Vec<u8>) {
        self.writes.insert(key.to_string(), value);
    }

    pub fn put_str(&mut self, key: &str, value: &str) {
        self.put(key, value.as_bytes().to_vec());
    }

    pub fn into_writes(self) -> WriteSet {
        self.writes
    }
}
