//! In-memory storage backend.
//! Not persistent across page reloads; used as the fallback and in tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use async_trait::async_trait;
use chat_core::ports::StoragePort;
use chat_types::{ChatError, Result};

#[derive(Default)]
pub struct MemoryStorage {
    data: RefCell<BTreeMap<String, Vec<u8>>>,
    read_only: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail, simulating a store that went away.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.read_only.get() {
            return Err(ChatError::Storage(format!("write to {} rejected: store is read-only", key)));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl StoragePort for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.data.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.check_writable(key)?;
        self.data.borrow_mut().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.data.borrow_mut().remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .data
            .borrow()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
