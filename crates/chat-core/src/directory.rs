//! Department routing: which agent serves each department.

use chat_types::{
    config::{ChatConfig, DepartmentAssignment, PLACEHOLDER_AGENT_PREFIX},
    session::Department,
    ChatError, Result,
};

/// Department → agent routing table.
#[derive(Debug, Clone, Default)]
pub struct DepartmentDirectory {
    assignments: Vec<DepartmentAssignment>,
}

impl DepartmentDirectory {
    pub fn new(assignments: Vec<DepartmentAssignment>) -> Self {
        Self { assignments }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.departments.clone())
    }

    /// The agent serving `department`. Unmapped, blank and placeholder ids
    /// are configuration errors.
    pub fn agent_for(&self, department: Department) -> Result<&str> {
        let agent = self
            .assignments
            .iter()
            .find(|a| a.department == department)
            .map(|a| a.agent_id.trim())
            .filter(|id| !id.is_empty() && !id.starts_with(PLACEHOLDER_AGENT_PREFIX));

        agent.ok_or_else(|| {
            log::error!("[directory] no agent configured for department {}", department);
            ChatError::Config(format!(
                "Agent for the {} department is not configured. Please contact support.",
                department.label()
            ))
        })
    }

    /// Reverse lookup used to route a signed-in agent to their queue.
    pub fn department_of(&self, agent_id: &str) -> Option<Department> {
        self.assignments
            .iter()
            .find(|a| a.agent_id == agent_id)
            .map(|a| a.department)
    }

    pub fn is_configured(&self, department: Department) -> bool {
        self.agent_for(department).is_ok()
    }
}
