use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IdentityKind {
    /// A customer with a per-device id and no credentials.
    Anonymous,
    Agent { email: String },
}

/// The signed-in principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub kind: IdentityKind,
}

impl Identity {
    pub fn anonymous(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: IdentityKind::Anonymous,
        }
    }

    pub fn agent(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: IdentityKind::Agent { email: email.into() },
        }
    }

    pub fn is_agent(&self) -> bool {
        matches!(self.kind, IdentityKind::Agent { .. })
    }

    pub fn role(&self) -> ViewerRole {
        if self.is_agent() {
            ViewerRole::Agent
        } else {
            ViewerRole::Customer
        }
    }
}

/// Which side of a conversation a viewer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerRole {
    Customer,
    Agent,
}
