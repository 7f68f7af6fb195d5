//! Key-value backends the board store persists through.

use anyhow::Result;
use std::cell::RefCell;
use std::collections::HashMap;

#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;

/// Failures specific to a storage backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not determine data directory")]
    NoDataDir,

    #[error("failed to open storage at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("storage query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// String-keyed, string-valued storage
#[cfg_attr(any(test, feature = "test-mocks"), automock)]
pub trait KeyValueStore {
    /// Read the value stored under `key`
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process storage; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
