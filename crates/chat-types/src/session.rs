use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Support department a chat is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Doctor,
    Payments,
}

impl Department {
    pub fn all() -> &'static [Department] {
        &[Department::Doctor, Department::Payments]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Department::Doctor => "Doctor",
            Department::Payments => "Payments",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Doctor => "doctor",
            Department::Payments => "payments",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Closed,
}

impl SessionStatus {
    /// `Closed` is terminal: a session never goes back to `Open`.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        !(self == SessionStatus::Closed && next == SessionStatus::Open)
    }
}

/// Contact details gathered by the pre-chat bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub phone: String,
}

/// A conversation between one customer and one department agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub customer_id: String,
    pub agent_id: String,
    pub department: Department,
    pub customer_language: Language,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<CustomerContact>,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Label shown to customers in place of the agent id.
    pub fn display_title(&self) -> String {
        match &self.contact {
            Some(contact) if !contact.name.is_empty() => {
                format!("{} ({})", contact.name, self.department.label())
            }
            _ => format!("{} chat", self.department.label()),
        }
    }
}

/// Fields supplied by the caller when opening a new session.
/// Id, status and timestamps are assigned by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub customer_id: String,
    pub agent_id: String,
    pub department: Department,
    pub customer_language: Language,
    pub contact: Option<CustomerContact>,
}

/// Exact-match filter over sessions. `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionQuery {
    pub customer_id: Option<String>,
    pub agent_id: Option<String>,
    pub department: Option<Department>,
    pub status: Option<SessionStatus>,
    pub customer_language: Option<Language>,
}

impl SessionQuery {
    pub fn open() -> Self {
        Self {
            status: Some(SessionStatus::Open),
            ..Self::default()
        }
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn department(mut self, department: Department) -> Self {
        self.department = Some(department);
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.customer_language = Some(language);
        self
    }

    pub fn matches(&self, session: &ChatSession) -> bool {
        self.customer_id.as_ref().map_or(true, |id| *id == session.customer_id)
            && self.agent_id.as_ref().map_or(true, |id| *id == session.agent_id)
            && self.department.map_or(true, |d| d == session.department)
            && self.status.map_or(true, |s| s == session.status)
            && self
                .customer_language
                .as_ref()
                .map_or(true, |lang| *lang == session.customer_language)
    }
}

/// Sorts sessions newest first, the order every session listing uses.
pub fn sort_newest_first(sessions: &mut [ChatSession]) {
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}
