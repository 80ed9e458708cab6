use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Chat {0} is closed")]
    ChatClosed(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Subscription closed")]
    SubscriptionClosed,

    #[error("{0}")]
    Other(String),
}

impl ChatError {
    /// Errors the user can retry from the same screen (store or network hiccups).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChatError::Storage(_)
                | ChatError::Network(_)
                | ChatError::Translation(_)
                | ChatError::Serialization(_)
                | ChatError::SubscriptionClosed
        )
    }

    /// Errors that stop the current screen until the user changes something.
    pub fn is_blocking(&self) -> bool {
        matches!(self, ChatError::Config(_) | ChatError::Auth(_))
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::Serialization(e.to_string())
    }
}
