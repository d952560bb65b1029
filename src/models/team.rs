//! Teams - named groups of agents, optionally bound to a workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::agent::Agent;

/// A team as returned by the backend
///
/// The backend embeds full agent records; `workflowId` is a weak reference
/// just like a node's `agentId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::models::timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn agent_ids(&self) -> Vec<&str> {
        self.agents.iter().map(|agent| agent.id.as_str()).collect()
    }
}

/// Create payload for a team
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub agent_ids: Vec<String>,
}

impl TeamDraft {
    pub fn new<N: Into<String>, D: Into<String>>(name: N, description: D) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent_ids: Vec::new(),
        }
    }

    pub fn with_agent<S: Into<String>>(mut self, agent_id: S) -> Self {
        self.agent_ids.push(agent_id.into());
        self
    }
}

/// Partial update for a team
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_ids: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_from_backend_json() {
        let json = serde_json::json!({
            "id": "t1",
            "name": "Research",
            "description": "finds things",
            "agents": [],
            "workflowId": null,
            "createdAt": "2024-01-01T00:00:00",
            "updatedAt": "2024-01-01T00:00:00"
        });
        let team: Team = serde_json::from_value(json).unwrap();
        assert_eq!(team.name, "Research");
        assert!(team.workflow_id.is_none());
        assert!(team.agent_ids().is_empty());
    }

    #[test]
    fn test_draft_payload() {
        let draft = TeamDraft::new("Research", "").with_agent("a1").with_agent("a2");
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["agentIds"], serde_json::json!(["a1", "a2"]));
    }
}
