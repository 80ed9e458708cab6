//! Live view of one chat for one viewer.
//!
//! The view owns both live subscriptions for the chat (its messages and
//! its session record) and a private translation cache. The app feeds it
//! once per frame through [`LiveMessageView::poll`], spawns whatever
//! [`LiveMessageView::pending_translations`] hands back, and renders
//! [`LiveMessageView::display_rows`]. Dropping the view unsubscribes.

use chrono::{DateTime, Local, Utc};

use chat_core::display::{resolve_display, TextSource};
use chat_core::subscription::Subscription;
use chat_core::translation_cache::{TranslationCache, TranslationRequest};
use chat_types::event::ChatEvent;
use chat_types::identity::{Identity, ViewerRole};
use chat_types::language::Language;
use chat_types::message::{sort_append_order, Message, SenderType};
use chat_types::session::ChatSession;

use super::scroll::ScrollTracker;

pub const CLOSED_INPUT_HINT: &str = "Chat is closed";
pub const OPEN_INPUT_HINT: &str = "Type a message...";

/// One rendered message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    pub id: String,
    pub sender_type: SenderType,
    pub is_own: bool,
    pub sender_label: String,
    pub text: String,
    pub source: TextSource,
    pub timestamp: DateTime<Utc>,
}

impl MessageRow {
    pub fn time_label(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// What a poll changed.
#[derive(Debug, Default)]
pub struct ViewPoll {
    pub redraw: bool,
    pub events: Vec<ChatEvent>,
}

pub struct LiveMessageView {
    chat_id: String,
    viewer: Identity,
    language: Language,
    session: Option<ChatSession>,
    messages: Vec<Message>,
    message_sub: Option<Subscription<Message>>,
    session_sub: Option<Subscription<ChatSession>>,
    cache: TranslationCache,
    pub scroll: ScrollTracker,
    pub input_text: String,
}

impl LiveMessageView {
    pub fn new(chat_id: impl Into<String>, viewer: Identity, language: Language) -> Self {
        Self {
            chat_id: chat_id.into(),
            viewer,
            cache: TranslationCache::new(language.clone()),
            language,
            session: None,
            messages: Vec::new(),
            message_sub: None,
            session_sub: None,
            scroll: ScrollTracker::new(),
            input_text: String::new(),
        }
    }

    /// Take ownership of the chat's subscriptions. `session` is the record
    /// loaded when the view was opened.
    pub fn attach(
        &mut self,
        session: ChatSession,
        messages: Subscription<Message>,
        sessions: Subscription<ChatSession>,
    ) {
        log::debug!("[view] attached to chat {}", self.chat_id);
        self.session = Some(session);
        self.message_sub = Some(messages);
        self.session_sub = Some(sessions);
    }

    /// Release both subscriptions. Rendering keeps the last snapshot.
    pub fn detach(&mut self) {
        let had_messages = self.message_sub.take().is_some();
        let had_session = self.session_sub.take().is_some();
        if had_messages || had_session {
            log::debug!("[view] detached from chat {}", self.chat_id);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.message_sub.is_some() && self.session_sub.is_some()
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn viewer(&self) -> &Identity {
        &self.viewer
    }

    pub fn role(&self) -> ViewerRole {
        self.viewer.role()
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_closed(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_open())
    }

    pub fn can_send(&self) -> bool {
        !self.is_closed() && !self.input_text.trim().is_empty()
    }

    pub fn input_hint(&self) -> &'static str {
        if self.is_closed() {
            CLOSED_INPUT_HINT
        } else {
            OPEN_INPUT_HINT
        }
    }

    /// Take the trimmed input for sending, leaving the field empty.
    pub fn take_input(&mut self) -> Option<String> {
        if !self.can_send() {
            return None;
        }
        let text = self.input_text.trim().to_string();
        self.input_text.clear();
        Some(text)
    }

    /// Fold in everything that arrived since the last frame: subscription
    /// snapshots and translation completions.
    pub fn poll(&mut self) -> ViewPoll {
        let mut out = ViewPoll::default();

        if self.cache.pump() > 0 {
            out.redraw = true;
        }

        if let Some(sub) = self.message_sub.as_mut() {
            match sub.poll_latest() {
                Ok(Some(mut messages)) => {
                    sort_append_order(&mut messages);
                    self.scroll.content_changed(messages.len());
                    self.messages = messages;
                    out.redraw = true;
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("[view] message stream for {} ended: {}", self.chat_id, e);
                    self.message_sub = None;
                    out.events.push(ChatEvent::SubscriptionLost {
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(sub) = self.session_sub.as_mut() {
            match sub.poll_latest() {
                Ok(Some(sessions)) => {
                    if let Some(latest) = sessions.into_iter().find(|s| s.id == self.chat_id) {
                        let was_open = self.session.as_ref().map_or(true, ChatSession::is_open);
                        if was_open && !latest.is_open() {
                            out.events.push(ChatEvent::ChatClosed {
                                chat_id: self.chat_id.clone(),
                            });
                        }
                        self.session = Some(latest);
                        out.redraw = true;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("[view] session stream for {} ended: {}", self.chat_id, e);
                    self.session_sub = None;
                    out.events.push(ChatEvent::SubscriptionLost {
                        reason: e.to_string(),
                    });
                }
            }
        }

        out
    }

    /// Register cache misses for every message currently shown in its
    /// original text. The caller runs the returned requests.
    pub fn pending_translations(&mut self) -> Vec<TranslationRequest> {
        let misses: Vec<(String, String)> = self
            .messages
            .iter()
            .filter(|m| resolve_display(m, &self.language, &self.cache).needs_translation())
            .map(|m| (m.id.clone(), m.original_text.clone()))
            .collect();

        misses
            .into_iter()
            .filter_map(|(id, text)| self.cache.request(&id, &text))
            .collect()
    }

    /// Switch the viewer language. Every cached translation is dropped and
    /// re-requested lazily.
    pub fn set_language(&mut self, language: Language) -> bool {
        if !self.cache.set_language(language.clone()) {
            return false;
        }
        self.language = language;
        true
    }

    pub fn display_rows(&self) -> Vec<MessageRow> {
        self.messages
            .iter()
            .map(|message| {
                let shown = resolve_display(message, &self.language, &self.cache);
                let is_own = message.sender_id == self.viewer.id;
                MessageRow {
                    id: message.id.clone(),
                    sender_type: message.sender_type,
                    is_own,
                    sender_label: self.sender_label(message, is_own),
                    text: shown.text.to_string(),
                    source: shown.source,
                    timestamp: message.timestamp,
                }
            })
            .collect()
    }

    fn sender_label(&self, message: &Message, is_own: bool) -> String {
        if is_own {
            return "You".to_string();
        }
        match message.sender_type {
            SenderType::Agent => "Agent".to_string(),
            SenderType::Bot => "Assistant".to_string(),
            SenderType::Customer => self
                .session
                .as_ref()
                .and_then(|s| s.contact.as_ref())
                .map(|c| c.name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Customer".to_string()),
        }
    }
}
