#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use futures::executor::block_on;

    use chat_core::bot_flow::{BotInput, BotState};
    use chat_core::display::TextSource;
    use chat_core::ports::{Detection, TranslationPort, TranslationResult};
    use chat_core::subscription::{Subscription, SubscriptionSender};
    use chat_core::translation::TranslationGateway;
    use chat_types::event::ChatEvent;
    use chat_types::identity::{Identity, ViewerRole};
    use chat_types::language::{Language, LanguageListing, SourceLanguage};
    use chat_types::message::{Message, SenderType};
    use chat_types::session::{ChatSession, CustomerContact, Department, SessionStatus};
    use chat_types::{ChatError, Result};

    use crate::state::live_view::{CLOSED_INPUT_HINT, OPEN_INPUT_HINT};
    use crate::state::scroll::is_near_bottom;
    use crate::state::*;

    // ─── Fixtures ────────────────────────────────────────────

    #[derive(Default)]
    struct TagTranslator {
        calls: Cell<usize>,
        fail: Cell<bool>,
    }

    #[async_trait(?Send)]
    impl TranslationPort for TagTranslator {
        async fn translate(
            &self,
            text: &str,
            target: &Language,
            _source: &SourceLanguage,
        ) -> Result<TranslationResult> {
            self.calls.set(self.calls.get() + 1);
            if self.fail.get() {
                return Err(ChatError::Network("offline".into()));
            }
            Ok(TranslationResult {
                translated_text: format!("[{}] {}", target.code(), text),
                detected_language: None,
            })
        }

        async fn detect(&self, _text: &str) -> Result<Detection> {
            Ok(Detection {
                language: Language::english(),
                confidence: 1.0,
            })
        }

        async fn languages(&self, _display: &Language) -> Result<Vec<LanguageListing>> {
            Ok(Vec::new())
        }

        fn backend_name(&self) -> &str {
            "tag"
        }
    }

    fn gateway() -> (Rc<TagTranslator>, TranslationGateway) {
        let port = Rc::new(TagTranslator::default());
        (port.clone(), TranslationGateway::new(port))
    }

    fn session(status: SessionStatus) -> ChatSession {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        ChatSession {
            id: "chat-1".into(),
            customer_id: "cust-1".into(),
            agent_id: "agent-doctor".into(),
            department: Department::Doctor,
            customer_language: Language::new("es"),
            status,
            contact: Some(CustomerContact {
                name: "Ana".into(),
                phone: "555 1234".into(),
            }),
            created_at: at,
            last_message_at: at,
        }
    }

    fn message(id: &str, seq: u64, sender: (&str, SenderType), text: &str, lang: &str) -> Message {
        Message {
            id: id.into(),
            chat_id: "chat-1".into(),
            sender_id: sender.0.into(),
            sender_type: sender.1,
            original_text: text.into(),
            original_language: Some(Language::new(lang)),
            translated_text: None,
            translated_language: None,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, seq as u32).unwrap(),
            seq,
        }
    }

    struct Attached {
        view: LiveMessageView,
        messages: SubscriptionSender<Message>,
        sessions: SubscriptionSender<ChatSession>,
        released: Rc<Cell<usize>>,
    }

    fn attached_view(viewer: Identity, language: &str) -> Attached {
        let released = Rc::new(Cell::new(0));
        let r1 = released.clone();
        let r2 = released.clone();
        let (messages, message_sub) = Subscription::channel(move || r1.set(r1.get() + 1));
        let (sessions, session_sub) = Subscription::channel(move || r2.set(r2.get() + 1));
        let mut view = LiveMessageView::new("chat-1", viewer, Language::new(language));
        view.attach(session(SessionStatus::Open), message_sub, session_sub);
        Attached {
            view,
            messages,
            sessions,
            released,
        }
    }

    fn customer() -> Identity {
        Identity::anonymous("cust-1")
    }

    fn agent() -> Identity {
        Identity::agent("agent-doctor", "doctor@livechat.local")
    }

    // ─── ScrollTracker Tests ─────────────────────────────────

    #[test]
    fn test_near_bottom_threshold() {
        assert!(is_near_bottom(480.0, 500.0, 1000.0));
        assert!(is_near_bottom(481.0, 500.0, 1000.0));
        assert!(!is_near_bottom(479.0, 500.0, 1000.0));
        assert!(is_near_bottom(0.0, 500.0, 300.0));
    }

    #[test]
    fn test_scroll_follows_when_at_bottom() {
        let mut scroll = ScrollTracker::new();
        scroll.observe(500.0, 500.0, 1000.0);
        scroll.content_changed(3);
        assert!(scroll.should_follow());
        assert!(!scroll.show_jump_control());
    }

    #[test]
    fn test_scroll_shows_jump_when_scrolled_up() {
        let mut scroll = ScrollTracker::new();
        scroll.content_changed(3);
        scroll.observe(100.0, 500.0, 1000.0);
        assert!(!scroll.should_follow());

        scroll.content_changed(4);
        assert!(scroll.show_jump_control());

        scroll.request_jump();
        assert!(scroll.should_follow());
        assert!(!scroll.show_jump_control());
        assert!(scroll.take_jump());
        assert!(!scroll.take_jump());
    }

    #[test]
    fn test_scroll_reaching_bottom_clears_jump() {
        let mut scroll = ScrollTracker::new();
        scroll.observe(0.0, 500.0, 1000.0);
        scroll.content_changed(1);
        assert!(scroll.show_jump_control());
        scroll.observe(495.0, 500.0, 1000.0);
        assert!(!scroll.show_jump_control());
    }

    // ─── LiveMessageView Tests ───────────────────────────────

    #[test]
    fn test_view_applies_snapshot_in_append_order() {
        let mut a = attached_view(customer(), "es");
        a.messages.send_snapshot(vec![
            message("m2", 2, ("agent-doctor", SenderType::Agent), "Hi", "en"),
            message("m1", 1, ("cust-1", SenderType::Customer), "Hola", "es"),
        ]);
        let poll = a.view.poll();
        assert!(poll.redraw);
        assert!(poll.events.is_empty());
        let ids: Vec<_> = a.view.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn test_view_display_priority() {
        let mut a = attached_view(customer(), "es");
        let mut persisted = message("m2", 2, ("agent-doctor", SenderType::Agent), "Hello", "en");
        persisted.translated_text = Some("Hola".into());
        persisted.translated_language = Some(Language::new("es"));
        a.messages.send_snapshot(vec![
            message("m1", 1, ("cust-1", SenderType::Customer), "Buenas", "es"),
            persisted,
            message("m3", 3, ("agent-doctor", SenderType::Agent), "Thanks", "en"),
        ]);
        a.view.poll();

        let rows = a.view.display_rows();
        assert_eq!(rows[0].text, "Buenas");
        assert_eq!(rows[0].source, TextSource::Original);
        assert!(rows[0].is_own);
        assert_eq!(rows[0].sender_label, "You");
        assert_eq!(rows[1].text, "Hola");
        assert_eq!(rows[1].source, TextSource::Persisted);
        assert_eq!(rows[1].sender_label, "Agent");
        assert_eq!(rows[2].text, "Thanks");
        assert_eq!(rows[2].source, TextSource::Fallback);
    }

    #[test]
    fn test_view_lazy_translation_round_trip() {
        let (port, gateway) = gateway();
        let mut a = attached_view(agent(), "en");
        a.messages
            .send_snapshot(vec![message("m1", 1, ("cust-1", SenderType::Customer), "Hola", "es")]);
        a.view.poll();

        let requests = a.view.pending_translations();
        assert_eq!(requests.len(), 1);
        assert!(a.view.pending_translations().is_empty());

        for request in requests {
            block_on(request.run(gateway.clone()));
        }
        assert_eq!(port.calls.get(), 1);

        assert!(a.view.poll().redraw);
        let rows = a.view.display_rows();
        assert_eq!(rows[0].text, "[en] Hola");
        assert_eq!(rows[0].source, TextSource::Cached);
        assert_eq!(rows[0].sender_label, "Ana");
        assert!(a.view.pending_translations().is_empty());
    }

    #[test]
    fn test_view_language_change_rerequests_and_discards_stale() {
        let (_port, gateway) = gateway();
        let mut a = attached_view(agent(), "en");
        a.messages
            .send_snapshot(vec![message("m1", 1, ("cust-1", SenderType::Customer), "Hola", "es")]);
        a.view.poll();

        let stale = a.view.pending_translations();
        assert!(a.view.set_language(Language::new("fr")));
        assert!(!a.view.set_language(Language::new("fr")));

        for request in stale {
            block_on(request.run(gateway.clone()));
        }
        a.view.poll();
        let rows = a.view.display_rows();
        assert_eq!(rows[0].text, "Hola");
        assert_eq!(rows[0].source, TextSource::Fallback);

        let fresh = a.view.pending_translations();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].target, Language::new("fr"));
        for request in fresh {
            block_on(request.run(gateway.clone()));
        }
        a.view.poll();
        assert_eq!(a.view.display_rows()[0].text, "[fr] Hola");
    }

    #[test]
    fn test_view_failed_translation_not_retried() {
        let (port, gateway) = gateway();
        port.fail.set(true);
        let mut a = attached_view(agent(), "en");
        a.messages
            .send_snapshot(vec![message("m1", 1, ("cust-1", SenderType::Customer), "Hola", "es")]);
        a.view.poll();

        for request in a.view.pending_translations() {
            block_on(request.run(gateway.clone()));
        }
        a.view.poll();
        assert_eq!(a.view.display_rows()[0].text, "Hola");
        assert!(a.view.pending_translations().is_empty());
        assert_eq!(port.calls.get(), 1);
    }

    #[test]
    fn test_view_detects_close_once() {
        let mut a = attached_view(customer(), "es");
        a.view.input_text = "still there?".into();
        assert!(a.view.can_send());
        assert_eq!(a.view.input_hint(), OPEN_INPUT_HINT);

        a.sessions.send_snapshot(vec![session(SessionStatus::Closed)]);
        let poll = a.view.poll();
        assert_eq!(
            poll.events,
            vec![ChatEvent::ChatClosed {
                chat_id: "chat-1".into()
            }]
        );
        assert!(a.view.is_closed());
        assert!(!a.view.can_send());
        assert_eq!(a.view.take_input(), None);
        assert_eq!(a.view.input_hint(), CLOSED_INPUT_HINT);

        a.sessions.send_snapshot(vec![session(SessionStatus::Closed)]);
        assert!(a.view.poll().events.is_empty());
    }

    #[test]
    fn test_view_ignores_other_sessions_in_snapshot() {
        let mut a = attached_view(customer(), "es");
        let mut other = session(SessionStatus::Closed);
        other.id = "chat-2".into();
        a.sessions.send_snapshot(vec![other]);
        assert!(a.view.poll().events.is_empty());
        assert!(!a.view.is_closed());
    }

    #[test]
    fn test_view_take_input_trims() {
        let mut a = attached_view(customer(), "es");
        a.view.input_text = "  hola  ".into();
        assert_eq!(a.view.take_input(), Some("hola".into()));
        assert!(a.view.input_text.is_empty());
        a.view.input_text = "   ".into();
        assert_eq!(a.view.take_input(), None);
    }

    #[test]
    fn test_view_stream_error_reports_subscription_lost() {
        let mut a = attached_view(customer(), "es");
        a.messages.send_error(ChatError::Storage("quota".into()));
        let poll = a.view.poll();
        assert!(matches!(
            poll.events.as_slice(),
            [ChatEvent::SubscriptionLost { .. }]
        ));
        assert!(!a.view.is_attached());
        assert!(a.view.poll().events.is_empty());
    }

    #[test]
    fn test_view_drop_releases_both_subscriptions() {
        let a = attached_view(customer(), "es");
        let released = a.released.clone();
        drop(a.view);
        assert_eq!(released.get(), 2);
    }

    #[test]
    fn test_view_detach_releases_both_subscriptions() {
        let mut a = attached_view(customer(), "es");
        a.view.detach();
        assert_eq!(a.released.get(), 2);
        assert!(!a.view.is_attached());
        assert!(a.messages.is_closed());
        assert!(a.sessions.is_closed());
    }

    #[test]
    fn test_view_role_follows_identity() {
        assert_eq!(attached_view(agent(), "en").view.role(), ViewerRole::Agent);
        assert_eq!(attached_view(customer(), "es").view.role(), ViewerRole::Customer);
    }

    // ─── PreChatState Tests ──────────────────────────────────

    fn walk_to_department(state: &mut PreChatState) {
        state.handle(BotInput::ChooseRole(ViewerRole::Customer)).unwrap();
        state.handle(BotInput::Continue).unwrap();
        state.input_text = "Ana".into();
        assert!(state.submit_text().unwrap());
        state.input_text = "+34 555 1234".into();
        assert!(state.submit_text().unwrap());
        state.handle(BotInput::PickLanguage(Language::new("es"))).unwrap();
    }

    #[test]
    fn test_prechat_english_prompts_need_no_translation() {
        let mut state = PreChatState::new();
        assert_eq!(state.display_language(), Language::english());
        assert!(state.pending_translations().is_empty());
        let lines = state.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].from_bot);
        assert_eq!(lines[0].source, TextSource::Original);
    }

    #[test]
    fn test_prechat_translates_bot_lines_into_picked_language() {
        let (_port, gateway) = gateway();
        let mut state = PreChatState::new();
        walk_to_department(&mut state);
        assert_eq!(state.flow().state(), BotState::DepartmentSelection);
        assert_eq!(state.display_language(), Language::new("es"));

        let bot_lines = state.lines().iter().filter(|l| l.from_bot).count();
        let requests = state.pending_translations();
        assert_eq!(requests.len(), bot_lines);
        for request in requests {
            block_on(request.run(gateway.clone()));
        }
        assert!(state.poll());

        for line in state.lines() {
            if line.from_bot {
                assert!(line.text.starts_with("[es] "), "{}", line.text);
                assert_eq!(line.source, TextSource::Cached);
            } else {
                assert_eq!(line.source, TextSource::Original);
            }
        }
    }

    #[test]
    fn test_prechat_answers_shown_as_typed() {
        let mut state = PreChatState::new();
        walk_to_department(&mut state);
        let answers: Vec<_> = state
            .lines()
            .into_iter()
            .filter(|l| !l.from_bot)
            .map(|l| l.text)
            .collect();
        assert!(answers.iter().any(|t| t == "Ana"));
    }

    #[test]
    fn test_prechat_blank_submit_is_ignored() {
        let mut state = PreChatState::new();
        state.handle(BotInput::ChooseRole(ViewerRole::Customer)).unwrap();
        state.handle(BotInput::Continue).unwrap();
        state.input_text = "   ".into();
        assert!(!state.submit_text().unwrap());
        assert_eq!(state.flow().state(), BotState::AskName);
    }

    #[test]
    fn test_prechat_rejected_input_keeps_text() {
        let mut state = PreChatState::new();
        state.input_text = "hello".into();
        assert!(state.submit_text().is_err());
        assert_eq!(state.input_text, "hello");
        assert_eq!(state.flow().state(), BotState::RoleChoice);
    }

    #[test]
    fn test_prechat_back_resets_language_and_profile() {
        let mut state = PreChatState::new();
        walk_to_department(&mut state);
        state.handle(BotInput::BackToRoleChoice).unwrap();
        assert_eq!(state.flow().state(), BotState::RoleChoice);
        assert_eq!(state.display_language(), Language::english());
        assert!(state.pending_translations().is_empty());
        assert!(state.profile().is_none());
    }

    #[test]
    fn test_prechat_profile_after_department() {
        let mut state = PreChatState::new();
        walk_to_department(&mut state);
        state.handle(BotInput::PickDepartment(Department::Doctor)).unwrap();
        let profile = state.profile().unwrap();
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.language, Language::new("es"));
        assert_eq!(profile.department, Department::Doctor);
    }

    // ─── SessionListState Tests ──────────────────────────────

    #[test]
    fn test_session_badges() {
        let mut s = session(SessionStatus::Open);
        assert_eq!(SessionBadge::for_session(&s, "agent-doctor"), SessionBadge::Yours);
        assert_eq!(SessionBadge::for_session(&s, "agent-x"), SessionBadge::OtherAgent);
        s.agent_id = String::new();
        assert_eq!(SessionBadge::for_session(&s, "agent-doctor"), SessionBadge::Unassigned);
        s.agent_id = "YOUR_AGENT_ID".into();
        assert_eq!(SessionBadge::for_session(&s, "agent-doctor"), SessionBadge::Unassigned);
        s.status = SessionStatus::Closed;
        assert_eq!(SessionBadge::for_session(&s, "agent-doctor"), SessionBadge::Closed);
        assert_eq!(SessionBadge::Unassigned.label(), "New Chat (Unassigned)");
    }

    #[test]
    fn test_session_list_sorts_newest_first() {
        let (tx, sub) = Subscription::channel(|| {});
        let mut list = SessionListState::new("agent-doctor", Department::Doctor);
        list.attach(sub);

        let older = session(SessionStatus::Open);
        let mut newer = session(SessionStatus::Open);
        newer.id = "chat-2".into();
        newer.created_at = older.created_at + chrono::Duration::minutes(5);
        tx.send_snapshot(vec![older, newer]);

        let (changed, event) = list.poll();
        assert!(changed);
        assert!(event.is_none());
        let ids: Vec<_> = list.rows().into_iter().map(|r| r.chat_id).collect();
        assert_eq!(ids, vec!["chat-2", "chat-1"]);
    }

    #[test]
    fn test_session_list_marks_selection() {
        let (tx, sub) = Subscription::channel(|| {});
        let mut list = SessionListState::new("agent-doctor", Department::Doctor);
        list.attach(sub);
        tx.send_snapshot(vec![session(SessionStatus::Open)]);
        list.poll();
        list.selected = Some("chat-1".into());
        let rows = list.rows();
        assert!(rows[0].selected);
        assert_eq!(rows[0].title, "Ana (Doctor)");
    }

    #[test]
    fn test_session_list_stream_closed() {
        let (tx, sub) = Subscription::channel(|| {});
        let mut list = SessionListState::new("agent-doctor", Department::Doctor);
        list.attach(sub);
        drop(tx);
        let (_, event) = list.poll();
        assert!(matches!(event, Some(ChatEvent::SubscriptionLost { .. })));
        assert!(!list.is_attached());
    }

    #[test]
    fn test_session_list_closed_after_last_snapshot() {
        let (tx, sub) = Subscription::channel(|| {});
        let mut list = SessionListState::new("agent-doctor", Department::Doctor);
        list.attach(sub);
        tx.send_snapshot(vec![session(SessionStatus::Open)]);
        drop(tx);

        let (changed, event) = list.poll();
        assert!(changed);
        assert!(event.is_none());
        assert_eq!(list.sessions().len(), 1);

        let (_, event) = list.poll();
        assert!(matches!(event, Some(ChatEvent::SubscriptionLost { .. })));
        assert!(!list.is_attached());
    }

    // ─── UiState Tests ───────────────────────────────────────

    #[test]
    fn test_ui_state_initial() {
        let state = UiState::new(Language::english());
        assert_eq!(state.screen, Screen::PreChat);
        assert!(state.identity.is_none());
        assert!(state.notices.is_empty());
        assert!(state.blocking.is_none());
        assert!(!state.show_settings);
        assert_eq!(state.status_text, "Ready");
    }

    #[test]
    fn test_ui_state_agent_sign_in_and_out() {
        let mut state = UiState::new(Language::english());
        state.process_events(vec![ChatEvent::IdentityChanged {
            identity: Some(agent()),
        }]);
        assert_eq!(state.screen, Screen::AgentDashboard);
        assert!(state.is_agent());

        state.process_events(vec![ChatEvent::IdentityChanged { identity: None }]);
        assert_eq!(state.screen, Screen::PreChat);
        assert!(!state.is_agent());
    }

    #[test]
    fn test_ui_state_anonymous_identity_keeps_screen() {
        let mut state = UiState::new(Language::english());
        state.process_events(vec![ChatEvent::IdentityChanged {
            identity: Some(customer()),
        }]);
        assert_eq!(state.screen, Screen::PreChat);
        assert!(state.identity.is_some());
    }

    #[test]
    fn test_ui_state_session_ready() {
        let mut state = UiState::new(Language::english());
        state.process_events(vec![ChatEvent::SessionReady {
            chat_id: "chat-1".into(),
            reused: true,
        }]);
        assert_eq!(state.screen, Screen::CustomerChat);
        assert_eq!(state.active_chat.as_deref(), Some("chat-1"));
        assert_eq!(state.status_text, "Resumed your open chat");
    }

    #[test]
    fn test_ui_state_send_failure_keeps_text() {
        let mut state = UiState::new(Language::english());
        state.process_events(vec![ChatEvent::MessageSendFailed {
            chat_id: "chat-1".into(),
            text: "hola".into(),
            reason: "Storage error: quota".into(),
        }]);
        assert_eq!(state.take_retry_text().as_deref(), Some("hola"));
        assert!(state.take_retry_text().is_none());
        assert!(state.notices[0].is_error);
        assert!(state.notices[0].message.starts_with("Message not sent"));
    }

    #[test]
    fn test_ui_state_blocking_error() {
        let mut state = UiState::new(Language::english());
        state.process_events(vec![ChatEvent::BlockingError {
            title: "Configuration".into(),
            message: "Agent for the Doctor department is not configured.".into(),
        }]);
        assert_eq!(state.blocking.as_ref().map(|b| b.title.as_str()), Some("Configuration"));
        state.dismiss_blocking();
        assert!(state.blocking.is_none());
    }

    #[test]
    fn test_ui_state_language_and_subscription_events() {
        let mut state = UiState::new(Language::english());
        state.process_events(vec![
            ChatEvent::LanguageChanged {
                language: Language::new("fr"),
            },
            ChatEvent::SubscriptionLost {
                reason: "closed".into(),
            },
        ]);
        assert_eq!(state.language, Language::new("fr"));
        assert!(state.subscription_lost);
        assert_eq!(state.status_text, "Disconnected");
    }

    #[test]
    fn test_ui_state_notices_are_bounded() {
        let mut state = UiState::new(Language::english());
        for i in 0..8 {
            state.push_notice(format!("n{}", i), false);
        }
        assert_eq!(state.notices.len(), 5);
        assert_eq!(state.notices[0].message, "n3");
        state.dismiss_notice(0);
        assert_eq!(state.notices[0].message, "n4");
        state.dismiss_notice(99);
        assert_eq!(state.notices.len(), 4);
    }

    // ─── LoginForm Tests ─────────────────────────────────────

    #[test]
    fn test_login_form_submit_and_fail() {
        let mut form = LoginForm::default();
        assert!(form.submit().is_none());

        form.email = " doctor@livechat.local ".into();
        form.password = "doctor".into();
        assert_eq!(
            form.submit(),
            Some(("doctor@livechat.local".to_string(), "doctor".to_string()))
        );
        assert!(form.busy);
        assert!(form.submit().is_none());

        form.fail("Invalid email or password");
        assert!(!form.busy);
        assert!(form.password.is_empty());
        assert_eq!(form.error.as_deref(), Some("Invalid email or password"));

        form.reset();
        assert!(form.email.is_empty());
        assert!(form.error.is_none());
    }
}
