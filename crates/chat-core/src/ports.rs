//! Port traits: the boundary between chat logic and the outside world.
//!
//! Defined here in `chat-core` (pure Rust); adapters live in `chat-platform`.
//! Everything is `?Send` because the client runs on the browser main thread.

use async_trait::async_trait;
use chat_types::{
    identity::Identity,
    language::{Language, LanguageListing, SourceLanguage},
    message::{Message, NewMessage},
    session::{ChatSession, NewSession, SessionQuery, SessionStatus},
    Result,
};

use crate::subscription::Subscription;

// ─── Chat Repository Port ────────────────────────────────────

/// Persistent store of sessions and their messages.
#[async_trait(?Send)]
pub trait ChatRepository {
    /// Insert a new open session. The store assigns id and timestamps.
    async fn create_session(&self, new: NewSession) -> Result<ChatSession>;

    /// Most recently created open session matching `query`.
    async fn find_open_session(&self, query: &SessionQuery) -> Result<Option<ChatSession>>;

    async fn get_session(&self, chat_id: &str) -> Result<Option<ChatSession>>;

    /// Append to a session's log. Updates the session's `last_message_at`.
    async fn append_message(&self, chat_id: &str, message: NewMessage) -> Result<Message>;

    /// All messages of a session in append order.
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>>;

    /// Fails with `InvalidTransition` for closed → open.
    async fn update_session_status(&self, chat_id: &str, status: SessionStatus) -> Result<ChatSession>;

    async fn update_session_language(&self, chat_id: &str, language: Language) -> Result<ChatSession>;

    /// Live view of every session matching `query`, newest first.
    /// Delivers the current result set immediately and again on every change.
    async fn subscribe_sessions(&self, query: SessionQuery) -> Result<Subscription<ChatSession>>;

    /// Live view of a session's messages in append order.
    async fn subscribe_messages(&self, chat_id: &str) -> Result<Subscription<Message>>;

    /// Re-run every live query and push the results that changed, picking up
    /// writes made through another handle on the same store. Returns how many
    /// snapshots were pushed.
    async fn refresh(&self) -> Result<usize> {
        Ok(0)
    }
}

// ─── Translation Port ────────────────────────────────────────

/// Raw result of a translation backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    pub translated_text: String,
    pub detected_language: Option<Language>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub language: Language,
    pub confidence: f32,
}

#[async_trait(?Send)]
pub trait TranslationPort {
    async fn translate(
        &self,
        text: &str,
        target: &Language,
        source: &SourceLanguage,
    ) -> Result<TranslationResult>;

    async fn detect(&self, text: &str) -> Result<Detection>;

    /// Languages the backend supports, with names in `display` language.
    async fn languages(&self, display: &Language) -> Result<Vec<LanguageListing>>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Identity Port ───────────────────────────────────────────

#[async_trait(?Send)]
pub trait IdentityPort {
    /// The signed-in identity, if any, without touching storage.
    fn current(&self) -> Option<Identity>;

    /// Restore the previous sign-in state at startup.
    async fn restore(&self) -> Result<Option<Identity>>;

    /// Sign in as a customer with a stable per-device id.
    async fn sign_in_anonymously(&self) -> Result<Identity>;

    /// Sign in as an agent. Wrong credentials fail with `ChatError::Auth`.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity>;

    async fn sign_out(&self) -> Result<()>;
}

// ─── Profile Port ────────────────────────────────────────────

/// Persistent agent profiles (preferred language).
#[async_trait(?Send)]
pub trait ProfilePort {
    async fn load_preferred_language(&self, agent_id: &str) -> Result<Option<Language>>;

    async fn save_preferred_language(&self, agent_id: &str, language: &Language) -> Result<()>;
}

// ─── Storage Port ────────────────────────────────────────────

/// Byte-oriented key-value store (memory, IndexedDB).
#[async_trait(?Send)]
pub trait StoragePort {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Keys starting with `prefix`, sorted ascending.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}
