//! Session resolution: reuse the customer's open chat with a department or
//! open a new one routed to that department's agent.
//!
//! Check-then-create is not atomic. Two concurrent opens from the same
//! customer may both create a session; both stay usable and the newest one
//! wins subsequent lookups.

use std::rc::Rc;

use chat_types::{
    language::Language,
    session::{ChatSession, CustomerContact, Department, NewSession, SessionQuery},
    Result,
};

use crate::directory::DepartmentDirectory;
use crate::ports::ChatRepository;
use crate::subscription::Subscription;

/// Who is asking for a chat and in which language.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    pub customer_id: String,
    pub department: Department,
    pub language: Language,
    pub contact: Option<CustomerContact>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionResolution {
    pub session: ChatSession,
    pub reused: bool,
}

#[derive(Clone)]
pub struct SessionResolver {
    repository: Rc<dyn ChatRepository>,
    directory: DepartmentDirectory,
}

impl SessionResolver {
    pub fn new(repository: Rc<dyn ChatRepository>, directory: DepartmentDirectory) -> Self {
        Self {
            repository,
            directory,
        }
    }

    /// Find or create the customer's open session for a department.
    ///
    /// The agent mapping is checked first so a misconfigured department never
    /// leaves a session behind. Lookup failures propagate instead of falling
    /// through to creation.
    pub async fn resolve_customer_session(&self, request: &SessionRequest) -> Result<SessionResolution> {
        let agent_id = self.directory.agent_for(request.department)?.to_string();

        if let Some(session) = self
            .find_existing(&request.customer_id, request.department, Some(&request.language))
            .await?
        {
            log::info!(
                "[resolver] reusing chat {} for {} / {}",
                session.id,
                request.customer_id,
                request.department
            );
            return Ok(SessionResolution {
                session,
                reused: true,
            });
        }

        let session = self
            .repository
            .create_session(NewSession {
                customer_id: request.customer_id.clone(),
                agent_id,
                department: request.department,
                customer_language: request.language.clone(),
                contact: request.contact.clone(),
            })
            .await?;
        log::info!(
            "[resolver] created chat {} for {} / {} ({})",
            session.id,
            request.customer_id,
            request.department,
            request.language
        );
        Ok(SessionResolution {
            session,
            reused: false,
        })
    }

    /// Open session for (customer, department), optionally restricted to a language.
    pub async fn find_existing(
        &self,
        customer_id: &str,
        department: Department,
        language: Option<&Language>,
    ) -> Result<Option<ChatSession>> {
        let mut query = SessionQuery::open().customer(customer_id).department(department);
        if let Some(language) = language {
            query = query.language(language.clone());
        }
        self.repository.find_open_session(&query).await
    }

    /// Live list of open sessions waiting in a department, newest first.
    /// Never creates anything.
    pub async fn subscribe_department_queue(
        &self,
        department: Department,
    ) -> Result<Subscription<ChatSession>> {
        self.repository
            .subscribe_sessions(SessionQuery::open().department(department))
            .await
    }
}
