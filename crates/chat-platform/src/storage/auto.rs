//! Pick the storage backend named in the config, falling back to memory
//! when IndexedDB cannot be opened.

use std::rc::Rc;

use chat_core::ports::StoragePort;
use chat_types::{config::StorageBackendType, Result};

use super::{IndexedDbStorage, MemoryStorage};

pub async fn open_storage(backend: &StorageBackendType) -> Result<Rc<dyn StoragePort>> {
    match backend {
        StorageBackendType::Memory => {
            log::info!("Storage backend: memory (configured)");
            Ok(Rc::new(MemoryStorage::new()))
        }
        StorageBackendType::IndexedDb => {
            let idb = IndexedDbStorage::open().await?;
            log::info!("Storage backend: IndexedDB (configured)");
            Ok(Rc::new(idb))
        }
        StorageBackendType::Auto => auto_detect_storage().await,
    }
}

/// IndexedDB if the browser allows it, memory otherwise.
pub async fn auto_detect_storage() -> Result<Rc<dyn StoragePort>> {
    match IndexedDbStorage::open().await {
        Ok(idb) => {
            log::info!("Storage backend: IndexedDB");
            Ok(Rc::new(idb))
        }
        Err(e) => {
            log::warn!("IndexedDB unavailable ({}), falling back to memory", e);
            Ok(Rc::new(MemoryStorage::new()))
        }
    }
}
