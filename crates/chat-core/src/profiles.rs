//! Agent preferred-language profiles.
//!
//! The persistent profile store is authoritative. A local storage copy
//! keeps the preference usable when that store is unreachable.

use std::rc::Rc;

use chat_types::{language::Language, Result};

use crate::ports::{ProfilePort, StoragePort};

const LOCAL_PREFIX: &str = "livechat:profile:";

#[derive(Clone)]
pub struct AgentProfiles {
    remote: Rc<dyn ProfilePort>,
    local: Rc<dyn StoragePort>,
}

impl AgentProfiles {
    pub fn new(remote: Rc<dyn ProfilePort>, local: Rc<dyn StoragePort>) -> Self {
        Self { remote, local }
    }

    /// Remote value, else the local copy, else English.
    pub async fn preferred_language(&self, agent_id: &str) -> Language {
        match self.remote.load_preferred_language(agent_id).await {
            Ok(Some(language)) => {
                if let Err(e) = self.write_local(agent_id, &language).await {
                    log::debug!("[profiles] local copy not refreshed: {}", e);
                }
                return language;
            }
            Ok(None) => {}
            Err(e) => log::warn!("[profiles] profile store unavailable for {}: {}", agent_id, e),
        }

        match self.read_local(agent_id).await {
            Ok(Some(language)) => language,
            Ok(None) => Language::english(),
            Err(e) => {
                log::warn!("[profiles] local profile unreadable: {}", e);
                Language::english()
            }
        }
    }

    /// Save locally, then remotely. `Ok(false)` means only the local copy
    /// was written.
    pub async fn set_preferred_language(&self, agent_id: &str, language: &Language) -> Result<bool> {
        self.write_local(agent_id, language).await?;
        match self.remote.save_preferred_language(agent_id, language).await {
            Ok(()) => Ok(true),
            Err(e) => {
                log::warn!("[profiles] kept {} locally only: {}", language, e);
                Ok(false)
            }
        }
    }

    async fn read_local(&self, agent_id: &str) -> Result<Option<Language>> {
        let key = format!("{}{}", LOCAL_PREFIX, agent_id);
        match self.local.get(&key).await? {
            Some(bytes) => {
                let language: Language = serde_json::from_slice(&bytes)?;
                Ok(Some(language).filter(|l| !l.code().is_empty()))
            }
            None => Ok(None),
        }
    }

    async fn write_local(&self, agent_id: &str, language: &Language) -> Result<()> {
        let key = format!("{}{}", LOCAL_PREFIX, agent_id);
        let json = serde_json::to_vec(language)?;
        self.local.set(&key, &json).await
    }
}
