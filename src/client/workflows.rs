//! Workflow operations against `/api/workflows`

use async_trait::async_trait;

use super::{resource_path, ExecutionAck};
use crate::engine::state::RemoteCollection;
use crate::models::{Workflow, WorkflowDraft, WorkflowPatch};
use crate::{Client, Result};

/// Client for workflow operations
#[derive(Debug, Clone)]
pub struct WorkflowClient {
    client: Client,
}

impl WorkflowClient {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// List all workflows
    pub async fn list(&self) -> Result<Vec<Workflow>> {
        self.client.get_json("/api/workflows").await
    }

    /// Get a workflow by ID
    pub async fn get(&self, id: &str) -> Result<Workflow> {
        self.client.get_json(&resource_path("/api/workflows", id)).await
    }

    pub async fn create(&self, draft: &WorkflowDraft) -> Result<Workflow> {
        let workflow: Workflow = self.client.post_json("/api/workflows", draft).await?;
        tracing::info!(workflow_id = %workflow.id, name = %workflow.name, "created workflow");
        Ok(workflow)
    }

    /// Update a workflow; node and edge lists in the patch replace the stored ones
    pub async fn update(&self, id: &str, patch: &WorkflowPatch) -> Result<Workflow> {
        self.client
            .put_json(&resource_path("/api/workflows", id), patch)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete(&resource_path("/api/workflows", id))
            .await?;
        tracing::info!(workflow_id = %id, "deleted workflow");
        Ok(())
    }

    /// Ask the backend to start running a workflow
    ///
    /// Fire-and-forget: the acknowledgement only means the run was accepted.
    /// Progress is observed through the log stream.
    pub async fn execute(&self, id: &str) -> Result<ExecutionAck> {
        let ack: ExecutionAck = self
            .client
            .post_json(
                &format!("{}/execute", resource_path("/api/workflows", id)),
                &serde_json::json!({}),
            )
            .await?;
        tracing::info!(workflow_id = %id, message = %ack.message, "workflow execution requested");
        Ok(ack)
    }

    /// Validate the graph locally and only trigger execution if it has no
    /// blocking issues
    pub async fn execute_checked(&self, workflow: &Workflow) -> Result<ExecutionAck> {
        workflow.ensure_executable()?;
        self.execute(&workflow.id).await
    }
}

#[async_trait]
impl RemoteCollection<Workflow> for WorkflowClient {
    async fn fetch_all(&self) -> Result<Vec<Workflow>> {
        self.list().await
    }
}
