//! Backend context: every port the client talks to, built once at startup
//! and passed down explicitly.

use std::cell::Cell;
use std::rc::Rc;

use chat_types::{config::ChatConfig, event::ChatEvent, identity::Identity, Result};

use crate::conversation::Conversation;
use crate::directory::DepartmentDirectory;
use crate::event_bus::EventBus;
use crate::ports::{ChatRepository, IdentityPort, ProfilePort, StoragePort, TranslationPort};
use crate::profiles::AgentProfiles;
use crate::resolver::SessionResolver;
use crate::translation::TranslationGateway;

/// The adapters a [`BackendContext`] is assembled from.
pub struct Backends {
    pub repository: Rc<dyn ChatRepository>,
    pub identity: Rc<dyn IdentityPort>,
    pub translator: Rc<dyn TranslationPort>,
    pub profiles: Rc<dyn ProfilePort>,
    pub storage: Rc<dyn StoragePort>,
}

#[derive(Clone)]
pub struct BackendContext {
    pub config: ChatConfig,
    pub repository: Rc<dyn ChatRepository>,
    pub identity: Rc<dyn IdentityPort>,
    pub storage: Rc<dyn StoragePort>,
    pub translator: TranslationGateway,
    pub directory: DepartmentDirectory,
    pub profiles: AgentProfiles,
    pub events: EventBus,
    running: Rc<Cell<bool>>,
}

impl BackendContext {
    pub fn new(config: ChatConfig, backends: Backends, events: EventBus) -> Self {
        let directory = DepartmentDirectory::from_config(&config);
        Self {
            translator: TranslationGateway::new(backends.translator),
            profiles: AgentProfiles::new(backends.profiles, backends.storage.clone()),
            repository: backends.repository,
            identity: backends.identity,
            storage: backends.storage,
            directory,
            config,
            events,
            running: Rc::new(Cell::new(false)),
        }
    }

    pub fn resolver(&self) -> SessionResolver {
        SessionResolver::new(self.repository.clone(), self.directory.clone())
    }

    pub fn conversation(&self) -> Conversation {
        Conversation::new(self.repository.clone(), self.translator.clone())
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Restore the previous sign-in and announce it.
    pub async fn init(&self) -> Result<Option<Identity>> {
        let identity = self.identity.restore().await?;
        log::info!(
            "[context] started with {} translation, identity {:?}",
            self.translator.backend_name(),
            identity.as_ref().map(|i| i.id.as_str())
        );
        self.running.set(true);
        self.events.emit(ChatEvent::IdentityChanged {
            identity: identity.clone(),
        });
        Ok(identity)
    }

    /// Reuse the current identity or sign in anonymously.
    pub async fn ensure_customer(&self) -> Result<Identity> {
        if let Some(identity) = self.identity.current().filter(|i| !i.is_agent()) {
            return Ok(identity);
        }
        let identity = self.identity.sign_in_anonymously().await?;
        self.events.emit(ChatEvent::IdentityChanged {
            identity: Some(identity.clone()),
        });
        Ok(identity)
    }

    pub async fn sign_in_agent(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self.identity.sign_in_with_password(email, password).await?;
        self.events.emit(ChatEvent::IdentityChanged {
            identity: Some(identity.clone()),
        });
        Ok(identity)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.identity.sign_out().await?;
        self.events.emit(ChatEvent::IdentityChanged { identity: None });
        Ok(())
    }

    /// Stop accepting work and drop undelivered events.
    pub fn shutdown(&self) {
        if self.running.replace(false) {
            let dropped = self.events.drain().len();
            log::info!("[context] shut down, {} pending events dropped", dropped);
        }
    }
}
