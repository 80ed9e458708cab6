#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::error::*;
    use crate::event::*;
    use crate::identity::*;
    use crate::language::*;
    use crate::message::*;
    use crate::session::*;
    use chrono::{Duration, TimeZone, Utc};

    fn session(id: &str, customer: &str, dept: Department, lang: &str, minute: u32) -> ChatSession {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap();
        ChatSession {
            id: id.to_string(),
            customer_id: customer.to_string(),
            agent_id: "agent-doctor".to_string(),
            department: dept,
            customer_language: Language::new(lang),
            status: SessionStatus::Open,
            contact: None,
            created_at: at,
            last_message_at: at,
        }
    }

    fn message(id: &str, seq: u64, at: chrono::DateTime<Utc>) -> Message {
        Message {
            id: id.to_string(),
            chat_id: "c1".to_string(),
            sender_id: "u1".to_string(),
            sender_type: SenderType::Customer,
            original_text: "hi".to_string(),
            original_language: Some(Language::new("es")),
            translated_text: None,
            translated_language: None,
            timestamp: at,
            seq,
        }
    }

    // ─── Language Tests ──────────────────────────────────────

    #[test]
    fn test_language_normalizes_code() {
        assert_eq!(Language::new(" ES "), Language::new("es"));
        assert_eq!(Language::new("Fil").code(), "fil");
    }

    #[test]
    fn test_language_names() {
        assert_eq!(Language::new("es").name(), "Spanish");
        assert_eq!(Language::new("es").native_name(), "Español");
        assert_eq!(language_name("xx"), "xx");
        assert!(!Language::new("xx").is_supported());
    }

    #[test]
    fn test_supported_languages_unique_codes() {
        for (i, a) in SUPPORTED_LANGUAGES.iter().enumerate() {
            assert!(
                SUPPORTED_LANGUAGES[i + 1..].iter().all(|b| b.code != a.code),
                "duplicate code {}",
                a.code
            );
        }
        assert_eq!(SUPPORTED_LANGUAGES.len(), 100);
    }

    #[test]
    fn test_source_language_from_option() {
        assert_eq!(SourceLanguage::from(None), SourceLanguage::Auto);
        let known = SourceLanguage::from(Some(Language::new("de")));
        assert_eq!(known.known(), Some(&Language::new("de")));
    }

    #[test]
    fn test_language_serializes_as_plain_string() {
        let json = serde_json::to_string(&Language::new("PT")).unwrap();
        assert_eq!(json, "\"pt\"");
    }

    // ─── Session Tests ───────────────────────────────────────

    #[test]
    fn test_status_closed_is_terminal() {
        assert!(SessionStatus::Open.can_transition_to(SessionStatus::Closed));
        assert!(SessionStatus::Closed.can_transition_to(SessionStatus::Closed));
        assert!(!SessionStatus::Closed.can_transition_to(SessionStatus::Open));
    }

    #[test]
    fn test_query_exact_match() {
        let s = session("s1", "cust", Department::Doctor, "es", 0);
        assert!(SessionQuery::open().customer("cust").department(Department::Doctor).matches(&s));
        assert!(!SessionQuery::open().customer("other").matches(&s));
        assert!(!SessionQuery::open().department(Department::Payments).matches(&s));
        assert!(!SessionQuery::open().language(Language::new("fr")).matches(&s));

        let mut closed = s.clone();
        closed.status = SessionStatus::Closed;
        assert!(!SessionQuery::open().matches(&closed));
        assert!(SessionQuery::default().matches(&closed));
    }

    #[test]
    fn test_sessions_sorted_newest_first() {
        let mut list = vec![
            session("a", "c", Department::Doctor, "en", 1),
            session("b", "c", Department::Doctor, "en", 5),
            session("c", "c", Department::Doctor, "en", 3),
        ];
        sort_newest_first(&mut list);
        let ids: Vec<_> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_session_display_title() {
        let mut s = session("s1", "cust", Department::Payments, "en", 0);
        assert_eq!(s.display_title(), "Payments chat");
        s.contact = Some(CustomerContact {
            name: "Ana".to_string(),
            phone: "555 1234".to_string(),
        });
        assert_eq!(s.display_title(), "Ana (Payments)");
    }

    #[test]
    fn test_department_serializes_lowercase() {
        let json = serde_json::to_string(&Department::Payments).unwrap();
        assert_eq!(json, "\"payments\"");
    }

    // ─── Message Tests ───────────────────────────────────────

    #[test]
    fn test_translation_for_matches_language_only() {
        let msg = Message {
            translated_text: Some("Hola".to_string()),
            translated_language: Some(Language::new("es")),
            ..message("m1", 0, Utc::now())
        };
        assert_eq!(msg.translation_for(&Language::new("es")), Some("Hola"));
        assert_eq!(msg.translation_for(&Language::new("fr")), None);
    }

    #[test]
    fn test_messages_sorted_by_timestamp_then_seq() {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut list = vec![
            message("m3", 2, t + Duration::seconds(1)),
            message("m2", 1, t),
            message("m1", 0, t),
        ];
        sort_append_order(&mut list);
        let ids: Vec<_> = list.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_new_message_builders() {
        let msg = NewMessage::agent("agent-doctor", "Hello", Language::english())
            .with_translation("Hola", Language::new("es"));
        assert_eq!(msg.sender_type, SenderType::Agent);
        assert_eq!(msg.translated_text.as_deref(), Some("Hola"));
        assert_eq!(msg.translated_language, Some(Language::new("es")));
    }

    #[test]
    fn test_message_optional_fields_skipped() {
        let json = serde_json::to_string(&message("m1", 0, Utc::now())).unwrap();
        assert!(!json.contains("translated_text"));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert!(back.translated_text.is_none());
    }

    // ─── Identity Tests ──────────────────────────────────────

    #[test]
    fn test_identity_roles() {
        assert_eq!(Identity::anonymous("u1").role(), ViewerRole::Customer);
        let agent = Identity::agent("agent-doctor", "doctor@livechat.local");
        assert!(agent.is_agent());
        assert_eq!(agent.role(), ViewerRole::Agent);
    }

    // ─── Config Tests ────────────────────────────────────────

    #[test]
    fn test_default_config_routes_both_departments() {
        let config = ChatConfig::default();
        assert_eq!(config.agent_for(Department::Doctor), Some("agent-doctor"));
        assert_eq!(config.agent_for(Department::Payments), Some("agent-payments"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_duplicate_department() {
        let mut config = ChatConfig::default();
        config
            .departments
            .push(DepartmentAssignment::new(Department::Doctor, "someone-else"));
        assert!(matches!(config.validate(), Err(ChatError::Config(_))));
    }

    #[test]
    fn test_account_lookup_ignores_case() {
        let config = ChatConfig::default();
        let account = config.account_by_email("Doctor@LiveChat.local").unwrap();
        assert_eq!(account.agent_id, "agent-doctor");
        assert!(config.account_by_email("nobody@x").is_none());
    }

    #[test]
    fn test_google_without_key_uses_mock() {
        let mut t = TranslationConfig::default();
        assert_eq!(t.effective_provider(), TranslationProvider::Mock);
        t.api_key = "k".to_string();
        assert_eq!(t.effective_provider(), TranslationProvider::Google);
        assert!(t.endpoint().starts_with("https://translation.googleapis.com"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = ChatConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ChatConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    // ─── Error Tests ─────────────────────────────────────────

    #[test]
    fn test_error_display() {
        assert_eq!(
            ChatError::Config("no agent".into()).to_string(),
            "Configuration error: no agent"
        );
        assert_eq!(ChatError::ChatClosed("c1".into()).to_string(), "Chat c1 is closed");
    }

    #[test]
    fn test_error_classification() {
        assert!(ChatError::Storage("x".into()).is_transient());
        assert!(!ChatError::Storage("x".into()).is_blocking());
        assert!(ChatError::Auth("bad".into()).is_blocking());
        assert!(ChatError::Config("x".into()).is_blocking());
        assert!(!ChatError::ChatClosed("c".into()).is_transient());
    }

    #[test]
    fn test_error_from_serde() {
        let err: ChatError = serde_json::from_str::<ChatSession>("{").unwrap_err().into();
        assert!(matches!(err, ChatError::Serialization(_)));
    }

    // ─── Event Tests ─────────────────────────────────────────

    #[test]
    fn test_event_serialization() {
        let event = ChatEvent::MessageSendFailed {
            chat_id: "c1".into(),
            text: "hello".into(),
            reason: "offline".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("MessageSendFailed"));
        let back: ChatEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
