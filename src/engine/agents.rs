//! Agent record store

use crate::models::{Agent, AgentLookup, AgentPatch};

use super::storage::RecordStore;

/// The set of defined agents plus the one currently selected for editing
///
/// Deleting an agent never touches workflows; nodes that referenced it keep
/// their `agentId` and resolve to [`AgentRef::Dangling`].
///
/// [`AgentRef::Dangling`]: crate::models::AgentRef::Dangling
#[derive(Debug, Clone, Default)]
pub struct AgentStore {
    records: RecordStore<Agent>,
    selected: Option<Agent>,
}

impl AgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[Agent] {
        self.records.list()
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.records.revision()
    }

    /// Append a fully formed agent (id and timestamps already set)
    pub fn add(&mut self, agent: Agent) {
        tracing::debug!(agent_id = %agent.id, name = %agent.name, "adding agent");
        self.records.add(agent);
    }

    /// Shallow-merge `patch` into the agent; no-op if the id is absent
    pub fn update(&mut self, id: &str, patch: AgentPatch) -> bool {
        let updated = self.records.update(id, patch);
        if updated {
            self.sync_selection(id);
        }
        updated
    }

    /// Remove the agent; no-op if the id is absent
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.records.delete(id);
        if removed && self.selected.as_ref().is_some_and(|a| a.id == id) {
            self.selected = None;
        }
        removed
    }

    /// Track at most one agent for editing UIs
    pub fn select(&mut self, agent: Option<Agent>) {
        self.selected = agent;
    }

    pub fn selected(&self) -> Option<&Agent> {
        self.selected.as_ref()
    }

    /// Replace every agent, e.g. after listing them from the backend
    ///
    /// The selection is refreshed from the new set, or cleared when its
    /// agent is no longer in it.
    pub fn replace_all(&mut self, agents: Vec<Agent>) {
        self.records.replace_all(agents);
        self.resync_selection();
    }

    /// Replace every agent unless the store changed since `revision_at_request`
    pub fn apply_fetched(&mut self, revision_at_request: u64, agents: Vec<Agent>) -> bool {
        let applied = self.records.apply_fetched(revision_at_request, agents);
        if applied {
            self.resync_selection();
        }
        applied
    }

    fn sync_selection(&mut self, id: &str) {
        if self.selected.as_ref().is_some_and(|a| a.id == id) {
            self.selected = self.records.get(id).cloned();
        }
    }

    fn resync_selection(&mut self) {
        if let Some(id) = self.selected.as_ref().map(|a| a.id.clone()) {
            self.selected = self.records.get(&id).cloned();
            if self.selected.is_none() {
                tracing::debug!(agent_id = %id, "selected agent is gone; clearing selection");
            }
        }
    }
}

impl AgentLookup for AgentStore {
    fn find_agent(&self, id: &str) -> Option<&Agent> {
        self.get(id)
    }
}
