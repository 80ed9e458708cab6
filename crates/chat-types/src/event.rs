use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::language::Language;

/// Events published by the backend context and background tasks.
/// The UI drains these each frame to update its projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// Sign-in state changed (`None` after sign-out)
    IdentityChanged { identity: Option<Identity> },

    /// A session was resolved (created or reused) for the customer
    SessionReady { chat_id: String, reused: bool },

    /// A message could not be written; the text is kept for retry
    MessageSendFailed { chat_id: String, text: String, reason: String },

    /// The chat was closed while the viewer had it open
    ChatClosed { chat_id: String },

    /// The viewer's preferred language changed
    LanguageChanged { language: Language },

    /// A live subscription died and must be re-established
    SubscriptionLost { reason: String },

    /// An error that blocks the current screen
    BlockingError { title: String, message: String },

    /// Informational toast
    Notice { message: String },
}
