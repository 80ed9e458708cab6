//! UI-level state that drives rendering.
//! `UiState` is a read-only projection of backend events, updated each frame
//! by draining the EventBus. The per-screen views own their subscriptions
//! and translation caches.

pub mod live_view;
pub mod prechat;
pub mod scroll;
pub mod session_list;

pub use live_view::{LiveMessageView, MessageRow, ViewPoll};
pub use prechat::{PreChatLine, PreChatState};
pub use scroll::ScrollTracker;
pub use session_list::{SessionBadge, SessionListState, SessionRow};

use chat_types::event::ChatEvent;
use chat_types::identity::Identity;
use chat_types::language::Language;

/// Oldest notices are dropped past this many.
const MAX_NOTICES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Role choice and the bot questionnaire.
    PreChat,
    CustomerChat,
    AgentLogin,
    AgentDashboard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
}

/// An error that stops the current screen until dismissed.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockingNotice {
    pub title: String,
    pub message: String,
}

/// State visible to UI panels
pub struct UiState {
    pub screen: Screen,
    pub identity: Option<Identity>,
    /// The chat the customer is connected to, once resolved
    pub active_chat: Option<String>,
    /// Viewer's display language
    pub language: Language,
    pub notices: Vec<Notice>,
    pub blocking: Option<BlockingNotice>,
    /// Text of a failed send, handed back to the input for retry
    pub retry_text: Option<String>,
    pub subscription_lost: bool,
    pub show_settings: bool,
    pub status_text: String,
}

impl UiState {
    pub fn new(language: Language) -> Self {
        Self {
            screen: Screen::PreChat,
            identity: None,
            active_chat: None,
            language,
            notices: Vec::new(),
            blocking: None,
            retry_text: None,
            subscription_lost: false,
            show_settings: false,
            status_text: "Ready".to_string(),
        }
    }

    /// Process events from the EventBus and update UI state
    pub fn process_events(&mut self, events: Vec<ChatEvent>) {
        for event in events {
            match event {
                ChatEvent::IdentityChanged { identity } => {
                    match &identity {
                        Some(id) if id.is_agent() => {
                            self.screen = Screen::AgentDashboard;
                            self.status_text = "Signed in".to_string();
                        }
                        Some(_) => {}
                        None => {
                            self.screen = Screen::PreChat;
                            self.active_chat = None;
                            self.status_text = "Signed out".to_string();
                        }
                    }
                    self.identity = identity;
                }
                ChatEvent::SessionReady { chat_id, reused } => {
                    self.active_chat = Some(chat_id);
                    self.screen = Screen::CustomerChat;
                    self.subscription_lost = false;
                    self.status_text = if reused {
                        "Resumed your open chat".to_string()
                    } else {
                        "Connected".to_string()
                    };
                }
                ChatEvent::MessageSendFailed { text, reason, .. } => {
                    self.retry_text = Some(text);
                    self.push_notice(format!("Message not sent: {}. Try again.", reason), true);
                }
                ChatEvent::ChatClosed { .. } => {
                    self.status_text = "Chat closed".to_string();
                    self.push_notice("This chat has been closed.", false);
                }
                ChatEvent::LanguageChanged { language } => {
                    self.language = language;
                }
                ChatEvent::SubscriptionLost { reason } => {
                    self.subscription_lost = true;
                    self.status_text = "Disconnected".to_string();
                    self.push_notice(format!("Live updates stopped: {}", reason), true);
                }
                ChatEvent::BlockingError { title, message } => {
                    self.blocking = Some(BlockingNotice { title, message });
                }
                ChatEvent::Notice { message } => {
                    self.push_notice(message, false);
                }
            }
        }
    }

    pub fn push_notice(&mut self, message: impl Into<String>, is_error: bool) {
        self.notices.push(Notice {
            message: message.into(),
            is_error,
        });
        if self.notices.len() > MAX_NOTICES {
            let excess = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..excess);
        }
    }

    pub fn dismiss_notice(&mut self, index: usize) {
        if index < self.notices.len() {
            self.notices.remove(index);
        }
    }

    pub fn dismiss_blocking(&mut self) {
        self.blocking = None;
    }

    pub fn take_retry_text(&mut self) -> Option<String> {
        self.retry_text.take()
    }

    pub fn is_agent(&self) -> bool {
        self.identity.as_ref().is_some_and(Identity::is_agent)
    }
}

/// Agent sign-in form.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub error: Option<String>,
    pub busy: bool,
}

impl LoginForm {
    pub fn can_submit(&self) -> bool {
        !self.busy && !self.email.trim().is_empty() && !self.password.is_empty()
    }

    /// Credentials to submit; marks the form busy.
    pub fn submit(&mut self) -> Option<(String, String)> {
        if !self.can_submit() {
            return None;
        }
        self.busy = true;
        self.error = None;
        Some((self.email.trim().to_string(), self.password.clone()))
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.busy = false;
        self.password.clear();
        self.error = Some(message.into());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
