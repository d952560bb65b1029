//! Agent operations against `/api/agents`

use async_trait::async_trait;

use crate::engine::state::RemoteCollection;
use crate::models::{Agent, AgentDraft, AgentPatch};
use super::resource_path;
use crate::{Client, Result};

/// Client for agent operations
#[derive(Debug, Clone)]
pub struct AgentClient {
    client: Client,
}

impl AgentClient {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// List all agents
    pub async fn list(&self) -> Result<Vec<Agent>> {
        self.client.get_json("/api/agents").await
    }

    /// Get an agent by ID
    pub async fn get(&self, id: &str) -> Result<Agent> {
        self.client.get_json(&resource_path("/api/agents", id)).await
    }

    /// Create an agent; model parameters are clamped to their ranges first
    pub async fn create(&self, draft: &AgentDraft) -> Result<Agent> {
        let draft = draft.clone().clamped();
        let agent: Agent = self.client.post_json("/api/agents", &draft).await?;
        tracing::info!(agent_id = %agent.id, name = %agent.name, "created agent");
        Ok(agent)
    }

    /// Update an agent; model parameters are clamped to their ranges first
    pub async fn update(&self, id: &str, patch: &AgentPatch) -> Result<Agent> {
        let patch = patch.clone().clamped();
        self.client
            .put_json(&resource_path("/api/agents", id), &patch)
            .await
    }

    /// Delete an agent
    ///
    /// Workflows that reference it are left alone.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&resource_path("/api/agents", id)).await?;
        tracing::info!(agent_id = %id, "deleted agent");
        Ok(())
    }
}

#[async_trait]
impl RemoteCollection<Agent> for AgentClient {
    async fn fetch_all(&self) -> Result<Vec<Agent>> {
        self.list().await
    }
}
