//! Local identity provider.
//!
//! Customers get a per-device anonymous id that survives reloads. Agents
//! sign in against the accounts listed in the config. The signed-in
//! identity is persisted so a reload restores it.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use uuid::Uuid;

use chat_core::ports::{IdentityPort, StoragePort};
use chat_types::{
    config::AgentAccount,
    identity::{Identity, IdentityKind},
    ChatError, Result,
};

const DEVICE_ID_KEY: &str = "auth:device_id";
const SESSION_KEY: &str = "auth:session";

pub struct LocalIdentityProvider {
    storage: Rc<dyn StoragePort>,
    accounts: Vec<AgentAccount>,
    current: RefCell<Option<Identity>>,
}

impl LocalIdentityProvider {
    pub fn new(storage: Rc<dyn StoragePort>, accounts: Vec<AgentAccount>) -> Self {
        Self {
            storage,
            accounts,
            current: RefCell::new(None),
        }
    }

    async fn device_id(&self) -> Result<String> {
        if let Some(bytes) = self.storage.get(DEVICE_ID_KEY).await? {
            let id = String::from_utf8_lossy(&bytes).trim().to_string();
            if !id.is_empty() {
                return Ok(id);
            }
        }
        let id = Uuid::new_v4().to_string();
        self.storage.set(DEVICE_ID_KEY, id.as_bytes()).await?;
        Ok(id)
    }

    async fn remember(&self, identity: &Identity) -> Result<()> {
        self.storage
            .set(SESSION_KEY, &serde_json::to_vec(identity)?)
            .await?;
        *self.current.borrow_mut() = Some(identity.clone());
        Ok(())
    }
}

#[async_trait(?Send)]
impl IdentityPort for LocalIdentityProvider {
    fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    async fn restore(&self) -> Result<Option<Identity>> {
        let restored = match self.storage.get(SESSION_KEY).await? {
            Some(bytes) => match serde_json::from_slice::<Identity>(&bytes) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    log::warn!("[identity] discarding unreadable session: {}", e);
                    self.storage.delete(SESSION_KEY).await?;
                    None
                }
            },
            None => None,
        };
        // An agent whose account was removed from the config is signed out.
        let restored = restored.filter(|identity| match &identity.kind {
            IdentityKind::Agent { .. } => {
                self.accounts.iter().any(|a| a.agent_id == identity.id)
            }
            IdentityKind::Anonymous => true,
        });
        *self.current.borrow_mut() = restored.clone();
        Ok(restored)
    }

    async fn sign_in_anonymously(&self) -> Result<Identity> {
        let identity = Identity::anonymous(self.device_id().await?);
        self.remember(&identity).await?;
        log::info!("[identity] anonymous customer {}", identity.id);
        Ok(identity)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ChatError::Auth("Please enter both email and password.".to_string()));
        }
        let account = self
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email) && a.password == password)
            .ok_or_else(|| {
                log::warn!("[identity] failed agent sign-in for {}", email);
                ChatError::Auth("Invalid email or password.".to_string())
            })?;
        let identity = Identity::agent(&account.agent_id, &account.email);
        self.remember(&identity).await?;
        log::info!("[identity] agent {} signed in", identity.id);
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        self.storage.delete(SESSION_KEY).await?;
        *self.current.borrow_mut() = None;
        Ok(())
    }
}
