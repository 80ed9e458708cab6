//! IndexedDB storage backend.
//! Persistent across page reloads. Values are stored as `Uint8Array`s in a
//! single object store keyed by string.

use async_trait::async_trait;
use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{IdbDatabase, IdbKeyRange, IdbObjectStore, IdbRequest, IdbTransactionMode};

use chat_core::ports::StoragePort;
use chat_types::{ChatError, Result};

pub const DEFAULT_DB_NAME: &str = "livechat";
const STORE_NAME: &str = "documents";
const DB_VERSION: u32 = 1;

// Upper bound for prefix scans: sorts after any key sharing the prefix.
const PREFIX_END: char = '\u{ffff}';

pub struct IndexedDbStorage {
    db: IdbDatabase,
}

fn js_err(context: &str) -> impl Fn(JsValue) -> ChatError + '_ {
    move |e| ChatError::Storage(format!("{}: {:?}", context, e))
}

impl IndexedDbStorage {
    pub async fn open() -> Result<Self> {
        Self::open_named(DEFAULT_DB_NAME).await
    }

    /// Open (or create) the named database.
    pub async fn open_named(name: &str) -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| ChatError::Storage("no window object".to_string()))?;
        let factory = window
            .indexed_db()
            .map_err(js_err("indexedDB"))?
            .ok_or_else(|| ChatError::Storage("IndexedDB not available".to_string()))?;

        let open_req = factory.open_with_u32(name, DB_VERSION).map_err(js_err("open"))?;

        let upgrade_req = open_req.clone();
        let onupgrade = Closure::once(move |_event: web_sys::Event| {
            let created = upgrade_req
                .result()
                .and_then(|db| db.dyn_into::<IdbDatabase>().map_err(JsValue::from))
                .and_then(|db| {
                    if db.object_store_names().contains(STORE_NAME) {
                        Ok(())
                    } else {
                        db.create_object_store(STORE_NAME).map(|_| ())
                    }
                });
            if let Err(e) = created {
                log::error!("[idb] upgrade failed: {:?}", e);
            }
        });
        open_req.set_onupgradeneeded(Some(onupgrade.as_ref().unchecked_ref()));
        onupgrade.forget();

        let db: IdbDatabase = await_request(&open_req)
            .await?
            .dyn_into()
            .map_err(js_err("open result"))?;
        log::info!("[idb] opened {}", name);
        Ok(Self { db })
    }

    fn store(&self, mode: IdbTransactionMode) -> Result<IdbObjectStore> {
        self.db
            .transaction_with_str_and_mode(STORE_NAME, mode)
            .and_then(|tx| tx.object_store(STORE_NAME))
            .map_err(js_err("transaction"))
    }
}

#[async_trait(?Send)]
impl StoragePort for IndexedDbStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let req = self
            .store(IdbTransactionMode::Readonly)?
            .get(&JsValue::from_str(key))
            .map_err(js_err("get"))?;
        let value = await_request(&req).await?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        Ok(Some(Uint8Array::new(&value).to_vec()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let req = self
            .store(IdbTransactionMode::Readwrite)?
            .put_with_key(&Uint8Array::from(value), &JsValue::from_str(key))
            .map_err(js_err("put"))?;
        await_request(&req).await.map(|_| ())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let req = self
            .store(IdbTransactionMode::Readwrite)?
            .delete(&JsValue::from_str(key))
            .map_err(js_err("delete"))?;
        await_request(&req).await.map(|_| ())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let upper = format!("{}{}", prefix, PREFIX_END);
        let range = IdbKeyRange::bound(&JsValue::from_str(prefix), &JsValue::from_str(&upper))
            .map_err(js_err("key range"))?;
        let req = self
            .store(IdbTransactionMode::Readonly)?
            .get_all_keys_with_key(&range)
            .map_err(js_err("getAllKeys"))?;
        let keys: Array = await_request(&req).await?.dyn_into().map_err(js_err("keys"))?;

        // IndexedDB returns keys in ascending order already.
        Ok(keys
            .iter()
            .filter_map(|k| k.as_string())
            .filter(|k| k.starts_with(prefix))
            .collect())
    }

    fn backend_name(&self) -> &str {
        "indexeddb"
    }
}

/// Resolve once the request fires `success`, reject on `error`.
async fn await_request(req: &IdbRequest) -> Result<JsValue> {
    let target = req.clone();
    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        let success_req = target.clone();
        let onsuccess = Closure::once(move |_: web_sys::Event| {
            let result = success_req.result().unwrap_or(JsValue::UNDEFINED);
            let _ = resolve.call1(&JsValue::NULL, &result);
        });
        let error_req = target.clone();
        let onerror = Closure::once(move |_: web_sys::Event| {
            let reason = error_req
                .error()
                .ok()
                .flatten()
                .map(|e| JsValue::from(e.message()))
                .unwrap_or_else(|| JsValue::from_str("IndexedDB request failed"));
            let _ = reject.call1(&JsValue::NULL, &reason);
        });
        target.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
        target.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onsuccess.forget();
        onerror.forget();
    });
    JsFuture::from(promise).await.map_err(js_err("request"))
}
