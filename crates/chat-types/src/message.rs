use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Customer,
    Agent,
    /// Scripted pre-chat prompts. Never persisted.
    Bot,
}

/// A persisted chat message. Append-only: nothing mutates a stored message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub sender_type: SenderType,
    pub original_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<Language>,
    /// Send-time translation into the other participant's language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_language: Option<Language>,
    pub timestamp: DateTime<Utc>,
    /// Per-chat append counter, breaks timestamp ties.
    pub seq: u64,
}

impl Message {
    /// The persisted translation, if it targets `language`.
    pub fn translation_for(&self, language: &Language) -> Option<&str> {
        match (&self.translated_text, &self.translated_language) {
            (Some(text), Some(lang)) if lang == language => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_authored_in(&self, language: &Language) -> bool {
        self.original_language.as_ref() == Some(language)
    }
}

/// Message content handed to the repository; id, timestamp and seq are
/// assigned on append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender_id: String,
    pub sender_type: SenderType,
    pub original_text: String,
    pub original_language: Option<Language>,
    pub translated_text: Option<String>,
    pub translated_language: Option<Language>,
}

impl NewMessage {
    pub fn customer(sender_id: impl Into<String>, text: impl Into<String>, language: Language) -> Self {
        Self {
            sender_id: sender_id.into(),
            sender_type: SenderType::Customer,
            original_text: text.into(),
            original_language: Some(language),
            translated_text: None,
            translated_language: None,
        }
    }

    pub fn agent(sender_id: impl Into<String>, text: impl Into<String>, language: Language) -> Self {
        Self {
            sender_id: sender_id.into(),
            sender_type: SenderType::Agent,
            original_text: text.into(),
            original_language: Some(language),
            translated_text: None,
            translated_language: None,
        }
    }

    pub fn with_translation(mut self, text: impl Into<String>, language: Language) -> Self {
        self.translated_text = Some(text.into());
        self.translated_language = Some(language);
        self
    }
}

/// Sorts messages into append order.
pub fn sort_append_order(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.seq.cmp(&b.seq)));
}
