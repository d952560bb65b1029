//! Team operations against `/api/teams`

use crate::models::{Team, TeamDraft, TeamPatch};
use super::resource_path;
use crate::{Client, Result};

/// Client for team operations
#[derive(Debug, Clone)]
pub struct TeamClient {
    client: Client,
}

impl TeamClient {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Team>> {
        self.client.get_json("/api/teams").await
    }

    pub async fn get(&self, id: &str) -> Result<Team> {
        self.client.get_json(&resource_path("/api/teams", id)).await
    }

    pub async fn create(&self, draft: &TeamDraft) -> Result<Team> {
        self.client.post_json("/api/teams", draft).await
    }

    pub async fn update(&self, id: &str, patch: &TeamPatch) -> Result<Team> {
        self.client
            .put_json(&resource_path("/api/teams", id), patch)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&resource_path("/api/teams", id)).await
    }
}
