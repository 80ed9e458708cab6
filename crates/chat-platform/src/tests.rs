#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use async_trait::async_trait;
    use futures::executor::block_on;

    use chat_core::ports::*;
    use chat_types::config::{ChatConfig, TranslationConfig, TranslationProvider};
    use chat_types::identity::IdentityKind;
    use chat_types::language::*;
    use chat_types::message::*;
    use chat_types::session::*;
    use chat_types::{ChatError, Result};

    use crate::chat_store::StorageChatRepository;
    use crate::identity::LocalIdentityProvider;
    use crate::profile_store::StorageProfileStore;
    use crate::storage::MemoryStorage;
    use crate::translate::google::{parse_detection, parse_translation};
    use crate::translate::{create_translator, MockTranslator};

    fn repo() -> (Rc<MemoryStorage>, StorageChatRepository) {
        let storage = Rc::new(MemoryStorage::new());
        let repo = StorageChatRepository::new(storage.clone());
        (storage, repo)
    }

    fn new_session(customer: &str, department: Department, lang: &str) -> NewSession {
        NewSession {
            customer_id: customer.into(),
            agent_id: "agent-doctor".into(),
            department,
            customer_language: Language::new(lang),
            contact: None,
        }
    }

    // ─── MemoryStorage Tests ─────────────────────────────────

    #[test]
    fn test_memory_list_keys_sorted_by_prefix() {
        let storage = MemoryStorage::new();
        block_on(async {
            storage.set("b:2", b"x").await.unwrap();
            storage.set("a:1", b"x").await.unwrap();
            storage.set("b:1", b"x").await.unwrap();
            storage.set("bb", b"x").await.unwrap();
            assert_eq!(storage.list_keys("b:").await.unwrap(), vec!["b:1", "b:2"]);
            assert_eq!(storage.list_keys("").await.unwrap().len(), 4);
            assert!(storage.exists("a:1").await.unwrap());
        });
    }

    #[test]
    fn test_memory_read_only_rejects_writes() {
        let storage = MemoryStorage::new();
        storage.set_read_only(true);
        let err = block_on(storage.set("k", b"v")).unwrap_err();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(storage.is_empty());
    }

    // ─── Chat Repository Tests ───────────────────────────────

    #[test]
    fn test_create_and_find_open_session() {
        let (_, repo) = repo();
        let created = block_on(repo.create_session(new_session("c1", Department::Doctor, "es"))).unwrap();
        assert_eq!(created.status, SessionStatus::Open);
        assert_eq!(created.created_at, created.last_message_at);

        let query = SessionQuery::open().customer("c1").department(Department::Doctor);
        let found = block_on(repo.find_open_session(&query)).unwrap().unwrap();
        assert_eq!(found, created);
        assert!(block_on(repo.find_open_session(&query.clone().language(Language::new("fr"))))
            .unwrap()
            .is_none());
        assert_eq!(block_on(repo.get_session(&created.id)).unwrap(), Some(created));
    }

    #[test]
    fn test_find_ignores_closed_and_prefers_newest() {
        let (_, repo) = repo();
        let first = block_on(repo.create_session(new_session("c", Department::Doctor, "en"))).unwrap();
        let second = block_on(repo.create_session(new_session("c", Department::Doctor, "en"))).unwrap();
        let query = SessionQuery::open().customer("c");
        let newest = block_on(repo.find_open_session(&query)).unwrap().unwrap();
        let expected = if second.created_at >= first.created_at { &second } else { &first };
        assert_eq!(newest.created_at, expected.created_at);

        block_on(repo.update_session_status(&first.id, SessionStatus::Closed)).unwrap();
        block_on(repo.update_session_status(&second.id, SessionStatus::Closed)).unwrap();
        assert!(block_on(repo.find_open_session(&query)).unwrap().is_none());
    }

    #[test]
    fn test_append_orders_messages_and_updates_session() {
        let (_, repo) = repo();
        let session = block_on(repo.create_session(new_session("c", Department::Doctor, "es"))).unwrap();
        for text in ["uno", "dos", "tres"] {
            block_on(repo.append_message(&session.id, NewMessage::customer("c", text, Language::new("es")))).unwrap();
        }
        let messages = block_on(repo.list_messages(&session.id)).unwrap();
        let texts: Vec<_> = messages.iter().map(|m| m.original_text.as_str()).collect();
        assert_eq!(texts, vec!["uno", "dos", "tres"]);
        assert_eq!(messages.iter().map(|m| m.seq).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        let updated = block_on(repo.get_session(&session.id)).unwrap().unwrap();
        assert_eq!(updated.last_message_at, messages[2].timestamp);
    }

    #[test]
    fn test_sequence_continues_across_repository_instances() {
        let storage = Rc::new(MemoryStorage::new());
        let first = StorageChatRepository::new(storage.clone());
        let session = block_on(first.create_session(new_session("c", Department::Payments, "en"))).unwrap();
        block_on(first.append_message(&session.id, NewMessage::customer("c", "one", Language::english()))).unwrap();

        let second = StorageChatRepository::new(storage);
        let msg = block_on(second.append_message(&session.id, NewMessage::customer("c", "two", Language::english())))
            .unwrap();
        assert_eq!(msg.seq, 1);
        assert_eq!(block_on(second.list_messages(&session.id)).unwrap().len(), 2);
    }

    #[test]
    fn test_interleaved_appends_from_two_repositories_keep_every_message() {
        let storage = Rc::new(MemoryStorage::new());
        let customer_tab = StorageChatRepository::new(storage.clone());
        let agent_tab = StorageChatRepository::new(storage);
        let session = block_on(customer_tab.create_session(new_session("c", Department::Doctor, "es"))).unwrap();

        block_on(customer_tab.append_message(&session.id, NewMessage::customer("c", "uno", Language::new("es"))))
            .unwrap();
        block_on(agent_tab.append_message(&session.id, NewMessage::agent("agent-doctor", "two", Language::english())))
            .unwrap();
        block_on(customer_tab.append_message(&session.id, NewMessage::customer("c", "tres", Language::new("es"))))
            .unwrap();

        let log: Vec<_> = block_on(agent_tab.list_messages(&session.id))
            .unwrap()
            .into_iter()
            .map(|m| (m.seq, m.original_text))
            .collect();
        assert_eq!(
            log,
            vec![(0, "uno".to_string()), (1, "two".to_string()), (2, "tres".to_string())]
        );
    }

    #[test]
    fn test_append_skips_slot_already_taken() {
        let (storage, repo) = repo();
        let session = block_on(repo.create_session(new_session("c", Department::Doctor, "en"))).unwrap();
        block_on(repo.append_message(&session.id, NewMessage::customer("c", "first", Language::english()))).unwrap();

        // Another writer takes seq 1 and seq 2 behind this repository's back.
        let other = StorageChatRepository::new(storage);
        block_on(other.append_message(&session.id, NewMessage::customer("c", "second", Language::english()))).unwrap();
        block_on(other.append_message(&session.id, NewMessage::customer("c", "third", Language::english()))).unwrap();

        let msg = block_on(repo.append_message(&session.id, NewMessage::customer("c", "fourth", Language::english())))
            .unwrap();
        assert_eq!(msg.seq, 3);
        let messages = block_on(repo.list_messages(&session.id)).unwrap();
        assert_eq!(messages.len(), 4);
        assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_append_rejects_bot_closed_and_unknown() {
        let (_, repo) = repo();
        let session = block_on(repo.create_session(new_session("c", Department::Doctor, "en"))).unwrap();
        let bot = NewMessage {
            sender_type: SenderType::Bot,
            ..NewMessage::customer("bot", "hi", Language::english())
        };
        assert!(block_on(repo.append_message(&session.id, bot)).is_err());

        let missing = block_on(repo.append_message("nope", NewMessage::customer("c", "x", Language::english())));
        assert!(matches!(missing, Err(ChatError::NotFound(_))));

        block_on(repo.update_session_status(&session.id, SessionStatus::Closed)).unwrap();
        let closed = block_on(repo.append_message(&session.id, NewMessage::customer("c", "x", Language::english())));
        assert_eq!(closed.unwrap_err(), ChatError::ChatClosed(session.id.clone()));
        assert!(block_on(repo.list_messages(&session.id)).unwrap().is_empty());
    }

    #[test]
    fn test_closed_session_cannot_reopen() {
        let (_, repo) = repo();
        let session = block_on(repo.create_session(new_session("c", Department::Doctor, "en"))).unwrap();
        block_on(repo.update_session_status(&session.id, SessionStatus::Closed)).unwrap();
        let err = block_on(repo.update_session_status(&session.id, SessionStatus::Open)).unwrap_err();
        assert!(matches!(err, ChatError::InvalidTransition(_)));
    }

    #[test]
    fn test_write_failure_surfaces() {
        let (storage, repo) = repo();
        let session = block_on(repo.create_session(new_session("c", Department::Doctor, "en"))).unwrap();
        storage.set_read_only(true);
        let err = block_on(repo.append_message(&session.id, NewMessage::customer("c", "x", Language::english())))
            .unwrap_err();
        assert!(err.is_transient());
    }

    /// Memory store whose session documents can be made read-only.
    struct SessionWritesFail {
        inner: MemoryStorage,
        failing: Cell<bool>,
    }

    #[async_trait(?Send)]
    impl StoragePort for SessionWritesFail {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
            if self.failing.get() && key.starts_with("chat:session:") {
                return Err(ChatError::Storage(format!("write to {} rejected", key)));
            }
            self.inner.set(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.inner.delete(key).await
        }

        async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
            self.inner.list_keys(prefix).await
        }

        fn backend_name(&self) -> &str {
            "session-writes-fail"
        }
    }

    #[test]
    fn test_append_succeeds_when_only_session_touch_fails() {
        let storage = Rc::new(SessionWritesFail {
            inner: MemoryStorage::new(),
            failing: Cell::new(false),
        });
        let repo = StorageChatRepository::new(storage.clone());
        let session = block_on(repo.create_session(new_session("c", Department::Doctor, "en"))).unwrap();
        let mut feed = block_on(repo.subscribe_messages(&session.id)).unwrap();
        assert_eq!(feed.poll_latest().unwrap(), Some(vec![]));

        storage.failing.set(true);
        let stored = block_on(repo.append_message(&session.id, NewMessage::customer("c", "hi", Language::english())))
            .unwrap();

        let snapshot = feed.poll_latest().unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, stored.id);
        let unchanged = block_on(repo.get_session(&session.id)).unwrap().unwrap();
        assert_eq!(unchanged.last_message_at, session.last_message_at);
    }

    #[test]
    fn test_message_subscription_pushes_full_snapshots() {
        let (_, repo) = repo();
        let session = block_on(repo.create_session(new_session("c", Department::Doctor, "en"))).unwrap();
        let mut sub = block_on(repo.subscribe_messages(&session.id)).unwrap();
        assert_eq!(sub.poll_latest().unwrap(), Some(vec![]));

        block_on(repo.append_message(&session.id, NewMessage::customer("c", "a", Language::english()))).unwrap();
        block_on(repo.append_message(&session.id, NewMessage::customer("c", "b", Language::english()))).unwrap();
        let snapshot = sub.poll_latest().unwrap().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1].original_text, "b");
    }

    #[test]
    fn test_subscription_drop_unregisters_listener() {
        let (_, repo) = repo();
        let session = block_on(repo.create_session(new_session("c", Department::Doctor, "en"))).unwrap();
        let messages = block_on(repo.subscribe_messages(&session.id)).unwrap();
        let sessions = block_on(repo.subscribe_sessions(SessionQuery::open())).unwrap();
        assert_eq!(repo.listener_count(), 2);
        drop(messages);
        drop(sessions);
        assert_eq!(repo.listener_count(), 0);
        block_on(repo.append_message(&session.id, NewMessage::customer("c", "a", Language::english()))).unwrap();
    }

    #[test]
    fn test_session_subscription_tracks_status_and_language() {
        let (_, repo) = repo();
        let mut open_doctor = block_on(repo.subscribe_sessions(SessionQuery::open().department(Department::Doctor))).unwrap();
        assert_eq!(open_doctor.poll_latest().unwrap(), Some(vec![]));

        let session = block_on(repo.create_session(new_session("c", Department::Doctor, "es"))).unwrap();
        block_on(repo.create_session(new_session("c", Department::Payments, "es"))).unwrap();
        assert_eq!(open_doctor.poll_latest().unwrap().unwrap().len(), 1);

        block_on(repo.update_session_language(&session.id, Language::new("fr"))).unwrap();
        let snapshot = open_doctor.poll_latest().unwrap().unwrap();
        assert_eq!(snapshot[0].customer_language, Language::new("fr"));

        block_on(repo.update_session_status(&session.id, SessionStatus::Closed)).unwrap();
        assert_eq!(open_doctor.poll_latest().unwrap(), Some(vec![]));
    }

    #[test]
    fn test_refresh_picks_up_writes_from_another_repository() {
        let storage = Rc::new(MemoryStorage::new());
        let agent_tab = StorageChatRepository::new(storage.clone());
        let customer_tab = StorageChatRepository::new(storage);

        let mut queue = block_on(agent_tab.subscribe_sessions(SessionQuery::open().department(Department::Doctor)))
            .unwrap();
        assert_eq!(queue.poll_latest().unwrap(), Some(vec![]));

        let session = block_on(customer_tab.create_session(new_session("c", Department::Doctor, "es"))).unwrap();
        assert_eq!(queue.poll_latest().unwrap(), None);
        assert_eq!(block_on(agent_tab.refresh()).unwrap(), 1);
        assert_eq!(queue.poll_latest().unwrap(), Some(vec![session.clone()]));

        let mut feed = block_on(agent_tab.subscribe_messages(&session.id)).unwrap();
        assert_eq!(feed.poll_latest().unwrap(), Some(vec![]));
        block_on(customer_tab.append_message(&session.id, NewMessage::customer("c", "hola", Language::new("es"))))
            .unwrap();
        block_on(agent_tab.refresh()).unwrap();
        let messages = feed.poll_latest().unwrap().unwrap();
        assert_eq!(messages[0].original_text, "hola");

        // Nothing changed since: nothing is pushed.
        assert_eq!(block_on(agent_tab.refresh()).unwrap(), 0);
        assert_eq!(feed.poll_latest().unwrap(), None);

        block_on(customer_tab.update_session_status(&session.id, SessionStatus::Closed)).unwrap();
        block_on(agent_tab.refresh()).unwrap();
        assert_eq!(queue.poll_latest().unwrap(), Some(vec![]));
    }

    #[test]
    fn test_subscribe_messages_unknown_chat() {
        let (_, repo) = repo();
        assert!(matches!(block_on(repo.subscribe_messages("ghost")), Err(ChatError::NotFound(_))));
    }

    // ─── Profile Store Tests ─────────────────────────────────

    #[test]
    fn test_profile_store_round_trip() {
        let store = StorageProfileStore::new(Rc::new(MemoryStorage::new()));
        assert_eq!(block_on(store.load_preferred_language("agent-doctor")).unwrap(), None);
        block_on(store.save_preferred_language("agent-doctor", &Language::new("pt"))).unwrap();
        assert_eq!(
            block_on(store.load_preferred_language("agent-doctor")).unwrap(),
            Some(Language::new("pt"))
        );
    }

    // ─── Identity Tests ──────────────────────────────────────

    fn provider(storage: &Rc<MemoryStorage>) -> LocalIdentityProvider {
        LocalIdentityProvider::new(storage.clone(), ChatConfig::default().agents)
    }

    #[test]
    fn test_anonymous_id_stable_across_reloads() {
        let storage = Rc::new(MemoryStorage::new());
        let first = block_on(provider(&storage).sign_in_anonymously()).unwrap();
        assert_eq!(first.kind, IdentityKind::Anonymous);

        let reloaded = provider(&storage);
        assert_eq!(block_on(reloaded.restore()).unwrap(), Some(first.clone()));
        assert_eq!(block_on(reloaded.sign_in_anonymously()).unwrap().id, first.id);
    }

    #[test]
    fn test_agent_sign_in_and_out() {
        let storage = Rc::new(MemoryStorage::new());
        let identity = provider(&storage);
        let err = block_on(identity.sign_in_with_password("doctor@livechat.local", "wrong")).unwrap_err();
        assert!(matches!(err, ChatError::Auth(_)));
        assert!(identity.current().is_none());

        let agent = block_on(identity.sign_in_with_password(" DOCTOR@livechat.local ", "doctor")).unwrap();
        assert_eq!(agent.id, "agent-doctor");
        assert!(agent.is_agent());
        assert_eq!(identity.current(), Some(agent));

        block_on(identity.sign_out()).unwrap();
        assert!(identity.current().is_none());
        assert_eq!(block_on(provider(&storage).restore()).unwrap(), None);
    }

    #[test]
    fn test_restore_drops_removed_agent_account() {
        let storage = Rc::new(MemoryStorage::new());
        block_on(provider(&storage).sign_in_with_password("payments@livechat.local", "payments")).unwrap();
        let without_accounts = LocalIdentityProvider::new(storage, Vec::new());
        assert_eq!(block_on(without_accounts.restore()).unwrap(), None);
    }

    // ─── Translation Backend Tests ───────────────────────────

    #[test]
    fn test_mock_translator_phrases() {
        let mock = MockTranslator::new();
        let hola = block_on(mock.translate("Hello", &Language::new("es"), &SourceLanguage::Auto)).unwrap();
        assert_eq!(hola.translated_text, "Hola");
        let merci = block_on(mock.translate("thank you", &Language::new("fr"), &SourceLanguage::Auto)).unwrap();
        assert_eq!(merci.translated_text, "merci");
        let other = block_on(mock.translate("good morning", &Language::new("de"), &SourceLanguage::Auto)).unwrap();
        assert_eq!(other.translated_text, "[DE] good morning");
        assert_eq!(block_on(mock.languages(&Language::english())).unwrap().len(), SUPPORTED_LANGUAGES.len());
    }

    #[test]
    fn test_create_translator_without_key_uses_mock() {
        let config = TranslationConfig::default();
        assert_eq!(create_translator(&config).backend_name(), "mock");
        let keyed = TranslationConfig {
            provider: TranslationProvider::Google,
            api_key: "key".into(),
            endpoint: None,
        };
        assert_eq!(create_translator(&keyed).backend_name(), "google");
    }

    #[test]
    fn test_google_translate_response_parsing() {
        let json = r#"{"data":{"translations":[{"translatedText":"Hola","detectedSourceLanguage":"en"}]}}"#;
        let result = parse_translation(serde_json::from_str(json).unwrap()).unwrap();
        assert_eq!(result.translated_text, "Hola");
        assert_eq!(result.detected_language, Some(Language::english()));

        let empty = r#"{"data":{"translations":[]}}"#;
        assert!(parse_translation(serde_json::from_str(empty).unwrap()).is_err());
    }

    #[test]
    fn test_google_detect_response_parsing() {
        let json = r#"{"data":{"detections":[[{"language":"fr","confidence":0.97,"isReliable":false}]]}}"#;
        let detection = parse_detection(serde_json::from_str(json).unwrap()).unwrap();
        assert_eq!(detection.language, Language::new("fr"));
        assert!(detection.confidence > 0.9);
    }
}
