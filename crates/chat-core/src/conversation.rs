//! Operations on an open chat: send, close, change language.

use std::rc::Rc;

use chat_types::{
    identity::{Identity, ViewerRole},
    language::{Language, SourceLanguage},
    message::{Message, NewMessage},
    session::{ChatSession, SessionStatus},
    ChatError, Result,
};

use crate::ports::ChatRepository;
use crate::translation::TranslationGateway;

#[derive(Clone)]
pub struct Conversation {
    repository: Rc<dyn ChatRepository>,
    gateway: TranslationGateway,
}

impl Conversation {
    pub fn new(repository: Rc<dyn ChatRepository>, gateway: TranslationGateway) -> Self {
        Self {
            repository,
            gateway,
        }
    }

    /// Current state of a session straight from the store.
    pub async fn load(&self, chat_id: &str) -> Result<ChatSession> {
        self.repository
            .get_session(chat_id)
            .await?
            .ok_or_else(|| ChatError::NotFound(format!("chat {}", chat_id)))
    }

    /// Append a message from `sender`.
    ///
    /// Blank text and closed chats are rejected before anything is written.
    /// Agent messages are translated into the customer's language and the
    /// translation is stored with the message; if translation fails the
    /// message is stored without one. Customer messages are stored as typed.
    pub async fn send(
        &self,
        chat_id: &str,
        sender: &Identity,
        text: &str,
        sender_language: &Language,
    ) -> Result<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let session = self.load(chat_id).await?;
        if !session.is_open() {
            log::warn!("[conversation] refusing send to closed chat {}", chat_id);
            return Err(ChatError::ChatClosed(chat_id.to_string()));
        }

        let message = match sender.role() {
            ViewerRole::Customer => {
                NewMessage::customer(&sender.id, text, session.customer_language.clone())
            }
            ViewerRole::Agent => {
                let draft = NewMessage::agent(&sender.id, text, sender_language.clone());
                if *sender_language == session.customer_language {
                    draft
                } else {
                    let outcome = self
                        .gateway
                        .translate(
                            text,
                            &session.customer_language,
                            &SourceLanguage::Known(sender_language.clone()),
                        )
                        .await;
                    match outcome.error {
                        None => draft.with_translation(outcome.translated_text, session.customer_language.clone()),
                        Some(reason) => {
                            log::warn!("[conversation] storing untranslated agent message: {}", reason);
                            draft
                        }
                    }
                }
            }
        };

        self.repository.append_message(chat_id, message).await
    }

    /// Close a chat. Closing an already closed chat is a no-op.
    pub async fn close(&self, chat_id: &str) -> Result<ChatSession> {
        let session = self.load(chat_id).await?;
        if !session.is_open() {
            return Ok(session);
        }
        log::info!("[conversation] closing chat {}", chat_id);
        self.repository
            .update_session_status(chat_id, SessionStatus::Closed)
            .await
    }

    /// Change the language the customer reads the chat in. Later agent
    /// messages are translated into the new language.
    pub async fn change_customer_language(&self, chat_id: &str, language: Language) -> Result<ChatSession> {
        log::info!("[conversation] chat {} customer language -> {}", chat_id, language);
        self.repository.update_session_language(chat_id, language).await
    }
}
