use chat_core::subscription::Subscription;
use chat_types::config::PLACEHOLDER_AGENT_PREFIX;
use chat_types::event::ChatEvent;
use chat_types::session::{sort_newest_first, ChatSession, Department};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBadge {
    Yours,
    OtherAgent,
    Unassigned,
    Closed,
}

impl SessionBadge {
    pub fn for_session(session: &ChatSession, agent_id: &str) -> Self {
        let assigned = session.agent_id.trim();
        if !session.is_open() {
            SessionBadge::Closed
        } else if assigned.is_empty() || assigned.starts_with(PLACEHOLDER_AGENT_PREFIX) {
            SessionBadge::Unassigned
        } else if assigned == agent_id {
            SessionBadge::Yours
        } else {
            SessionBadge::OtherAgent
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionBadge::Yours => "Your Chat",
            SessionBadge::OtherAgent => "Assigned to other agent",
            SessionBadge::Unassigned => "New Chat (Unassigned)",
            SessionBadge::Closed => "Closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub chat_id: String,
    pub title: String,
    pub subtitle: String,
    pub badge: SessionBadge,
    pub selected: bool,
}

/// The signed-in agent's department queue.
pub struct SessionListState {
    agent_id: String,
    department: Department,
    sessions: Vec<ChatSession>,
    subscription: Option<Subscription<ChatSession>>,
    pub selected: Option<String>,
}

impl SessionListState {
    pub fn new(agent_id: impl Into<String>, department: Department) -> Self {
        Self {
            agent_id: agent_id.into(),
            department,
            sessions: Vec::new(),
            subscription: None,
            selected: None,
        }
    }

    pub fn attach(&mut self, subscription: Subscription<ChatSession>) {
        self.subscription = Some(subscription);
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn department(&self) -> Department {
        self.department
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn poll(&mut self) -> (bool, Option<ChatEvent>) {
        let Some(sub) = self.subscription.as_mut() else {
            return (false, None);
        };
        match sub.poll_latest() {
            Ok(Some(mut sessions)) => {
                sort_newest_first(&mut sessions);
                self.sessions = sessions;
                (true, None)
            }
            Ok(None) => (false, None),
            Err(e) => {
                log::warn!("[sessions] {} queue stream ended: {}", self.department, e);
                self.subscription = None;
                (
                    false,
                    Some(ChatEvent::SubscriptionLost {
                        reason: e.to_string(),
                    }),
                )
            }
        }
    }

    pub fn rows(&self) -> Vec<SessionRow> {
        self.sessions
            .iter()
            .map(|session| {
                let subtitle = match &session.contact {
                    Some(contact) if !contact.phone.is_empty() => format!(
                        "{} · {} · {}",
                        contact.phone,
                        session.customer_language.name(),
                        session.created_at.format("%d %b %H:%M")
                    ),
                    _ => format!(
                        "{} · {}",
                        session.customer_language.name(),
                        session.created_at.format("%d %b %H:%M")
                    ),
                };
                SessionRow {
                    chat_id: session.id.clone(),
                    title: session.display_title(),
                    subtitle,
                    badge: SessionBadge::for_session(session, &self.agent_id),
                    selected: self.selected.as_deref() == Some(session.id.as_str()),
                }
            })
            .collect()
    }
}
