//! WASM-target tests for chat-platform (Node.js runtime).
//!
//! Covers MemoryStorage, the storage-backed chat repository and the mock
//! translator under wasm32-unknown-unknown via `wasm-pack test --node`.
//! IndexedDB needs a browser and is exercised by the app.

use std::rc::Rc;

use wasm_bindgen_test::*;

use chat_core::ports::{ChatRepository, StoragePort, TranslationPort};
use chat_platform::chat_store::StorageChatRepository;
use chat_platform::storage::MemoryStorage;
use chat_platform::translate::MockTranslator;
use chat_types::language::{Language, SourceLanguage};
use chat_types::message::NewMessage;
use chat_types::session::{Department, NewSession, SessionStatus};

#[wasm_bindgen_test]
fn memory_storage_backend_name() {
    assert_eq!(MemoryStorage::new().backend_name(), "memory");
}

#[wasm_bindgen_test]
async fn memory_storage_set_get_delete() {
    let storage = MemoryStorage::new();
    storage.set("k", b"v").await.unwrap();
    assert_eq!(storage.get("k").await.unwrap(), Some(b"v".to_vec()));
    storage.delete("k").await.unwrap();
    assert!(storage.get("k").await.unwrap().is_none());
}

#[wasm_bindgen_test]
async fn repository_append_and_close() {
    let repo = StorageChatRepository::new(Rc::new(MemoryStorage::new()));
    let session = repo
        .create_session(NewSession {
            customer_id: "c".into(),
            agent_id: "agent-doctor".into(),
            department: Department::Doctor,
            customer_language: Language::new("es"),
            contact: None,
        })
        .await
        .unwrap();
    let msg = repo
        .append_message(&session.id, NewMessage::customer("c", "hola", Language::new("es")))
        .await
        .unwrap();
    assert_eq!(msg.seq, 0);

    let closed = repo
        .update_session_status(&session.id, SessionStatus::Closed)
        .await
        .unwrap();
    assert_eq!(closed.status, SessionStatus::Closed);
    assert!(repo
        .append_message(&session.id, NewMessage::customer("c", "?", Language::new("es")))
        .await
        .is_err());
}

#[wasm_bindgen_test]
async fn mock_translator_hello() {
    let result = MockTranslator::new()
        .translate("Hello", &Language::new("fr"), &SourceLanguage::Auto)
        .await
        .unwrap();
    assert_eq!(result.translated_text, "Bonjour");
}
