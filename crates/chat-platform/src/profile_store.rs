//! Agent profile documents kept in the shared document store.

use std::rc::Rc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chat_core::ports::{ProfilePort, StoragePort};
use chat_types::{language::Language, Result};

const PROFILE_PREFIX: &str = "agent:profile:";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AgentProfileDoc {
    agent_id: String,
    preferred_language: Language,
    updated_at: DateTime<Utc>,
}

pub struct StorageProfileStore {
    storage: Rc<dyn StoragePort>,
}

impl StorageProfileStore {
    pub fn new(storage: Rc<dyn StoragePort>) -> Self {
        Self { storage }
    }
}

#[async_trait(?Send)]
impl ProfilePort for StorageProfileStore {
    async fn load_preferred_language(&self, agent_id: &str) -> Result<Option<Language>> {
        let key = format!("{}{}", PROFILE_PREFIX, agent_id);
        match self.storage.get(&key).await? {
            Some(bytes) => {
                let doc: AgentProfileDoc = serde_json::from_slice(&bytes)?;
                Ok(Some(doc.preferred_language))
            }
            None => Ok(None),
        }
    }

    async fn save_preferred_language(&self, agent_id: &str, language: &Language) -> Result<()> {
        let doc = AgentProfileDoc {
            agent_id: agent_id.to_string(),
            preferred_language: language.clone(),
            updated_at: Utc::now(),
        };
        let key = format!("{}{}", PROFILE_PREFIX, agent_id);
        self.storage.set(&key, &serde_json::to_vec(&doc)?).await
    }
}
