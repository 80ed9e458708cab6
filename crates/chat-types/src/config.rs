use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::language::Language;
use crate::session::Department;

/// Storage key the app persists [`ChatConfig`] under.
pub const CONFIG_STORAGE_KEY: &str = "livechat:config";

/// Prefix marking an agent id that was never filled in.
pub const PLACEHOLDER_AGENT_PREFIX: &str = "YOUR_AGENT";

/// Top-level live chat configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    pub translation: TranslationConfig,
    pub storage: StorageConfig,
    /// Department to agent routing table.
    pub departments: Vec<DepartmentAssignment>,
    /// Agent accounts accepted by the local identity provider.
    pub agents: Vec<AgentAccount>,
    pub default_language: Language,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            translation: TranslationConfig::default(),
            storage: StorageConfig::default(),
            departments: vec![
                DepartmentAssignment::new(Department::Doctor, "agent-doctor"),
                DepartmentAssignment::new(Department::Payments, "agent-payments"),
            ],
            agents: vec![
                AgentAccount::new("agent-doctor", "doctor@livechat.local", "doctor", Department::Doctor),
                AgentAccount::new("agent-payments", "payments@livechat.local", "payments", Department::Payments),
            ],
            default_language: Language::english(),
        }
    }
}

impl ChatConfig {
    pub fn agent_for(&self, department: Department) -> Option<&str> {
        self.departments
            .iter()
            .find(|a| a.department == department)
            .map(|a| a.agent_id.as_str())
    }

    pub fn account_by_email(&self, email: &str) -> Option<&AgentAccount> {
        let email = email.trim();
        self.agents.iter().find(|a| a.email.eq_ignore_ascii_case(email))
    }

    /// Rejects duplicate department rows and accounts with no email.
    pub fn validate(&self) -> Result<(), ChatError> {
        for (i, a) in self.departments.iter().enumerate() {
            if self.departments[..i].iter().any(|b| b.department == a.department) {
                return Err(ChatError::Config(format!(
                    "department {} is assigned more than once",
                    a.department
                )));
            }
        }
        if let Some(account) = self.agents.iter().find(|a| a.email.trim().is_empty()) {
            return Err(ChatError::Config(format!(
                "agent account {} has no email",
                account.agent_id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentAssignment {
    pub department: Department,
    pub agent_id: String,
}

impl DepartmentAssignment {
    pub fn new(department: Department, agent_id: impl Into<String>) -> Self {
        Self {
            department,
            agent_id: agent_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAccount {
    pub agent_id: String,
    pub email: String,
    pub password: String,
    pub department: Department,
}

impl AgentAccount {
    pub fn new(
        agent_id: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        department: Department,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            email: email.into(),
            password: password.into(),
            department,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationConfig {
    pub provider: TranslationProvider,
    pub api_key: String,
    pub endpoint: Option<String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::Google,
            api_key: String::new(),
            endpoint: None,
        }
    }
}

impl TranslationConfig {
    /// The provider actually used: Google without a key falls back to the mock.
    pub fn effective_provider(&self) -> TranslationProvider {
        match self.provider {
            TranslationProvider::Google if self.api_key.trim().is_empty() => TranslationProvider::Mock,
            other => other,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| self.provider.default_endpoint())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationProvider {
    Google,
    Mock,
}

impl TranslationProvider {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            TranslationProvider::Google => "https://translation.googleapis.com/language/translate/v2",
            TranslationProvider::Mock => "",
        }
    }

    pub fn all() -> &'static [TranslationProvider] {
        &[TranslationProvider::Google, TranslationProvider::Mock]
    }

    pub fn label(&self) -> &'static str {
        match self {
            TranslationProvider::Google => "Google Translate",
            TranslationProvider::Mock => "Mock (offline)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackendType,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendType::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// Auto-detect best available backend
    Auto,
    Memory,
    IndexedDb,
}
