// Agent definitions - LLM-backed worker configurations

//! # Agents
//!
//! An [`Agent`] is a configured worker: descriptive fields, an LLM binding
//! (provider, model, system prompt, sampling parameters) and a lifecycle
//! status. Agents are created from an [`AgentDraft`] (the create form / API
//! payload) and changed through [`AgentPatch`] partial updates.
//!
//! ## Boundary Clamping
//!
//! `temperature` lives in `[0, 2]` and `maxTokens` in `[100, 100000]`. Values
//! are clamped where they enter the system (draft conversion, patch
//! application, API payloads) and are not re-checked deeper in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const MIN_TEMPERATURE: f64 = 0.0;
pub const MAX_TEMPERATURE: f64 = 2.0;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const MIN_MAX_TOKENS: u32 = 100;
pub const MAX_MAX_TOKENS: u32 = 100_000;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_MODEL: &str = "llama2";

/// Clamp a sampling temperature into `[0, 2]`; NaN falls back to the default
pub fn clamp_temperature(value: f64) -> f64 {
    if value.is_nan() {
        DEFAULT_TEMPERATURE
    } else {
        value.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
    }
}

/// Clamp a completion budget into `[100, 100000]`
pub fn clamp_max_tokens(value: u32) -> u32 {
    value.clamp(MIN_MAX_TOKENS, MAX_MAX_TOKENS)
}

/// LLM providers an agent can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Ollama,
    OpenAI,
    Anthropic,
    Custom,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Ollama => write!(f, "ollama"),
            LlmProvider::OpenAI => write!(f, "openai"),
            LlmProvider::Anthropic => write!(f, "anthropic"),
            LlmProvider::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai" => Ok(LlmProvider::OpenAI),
            "anthropic" => Ok(LlmProvider::Anthropic),
            "custom" => Ok(LlmProvider::Custom),
            other => Err(format!("unknown LLM provider '{}'", other)),
        }
    }
}

/// Lifecycle status of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Error,
    Completed,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Running => "running",
            AgentStatus::Paused => "paused",
            AgentStatus::Error => "error",
            AgentStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// A defined agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    pub llm_provider: LlmProvider,
    pub model_name: String,
    #[serde(default)]
    pub system_prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::models::timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Create payload for an agent
///
/// Carries everything the agent form collects. The id, status and timestamps
/// are assigned by [`AgentDraft::into_agent`] locally or by the backend on
/// `POST /api/agents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub llm_provider: LlmProvider,
    pub model_name: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl Default for AgentDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            role: String::new(),
            description: String::new(),
            llm_provider: LlmProvider::Ollama,
            model_name: DEFAULT_MODEL.to_string(),
            system_prompt: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl AgentDraft {
    pub fn new<N: Into<String>, R: Into<String>, M: Into<String>>(
        name: N,
        role: R,
        model_name: M,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            model_name: model_name.into(),
            ..Default::default()
        }
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn provider(mut self, provider: LlmProvider) -> Self {
        self.llm_provider = provider;
        self
    }

    pub fn system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Required form fields: name, role and model must be non-blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.role.trim().is_empty() {
            missing.push("role");
        }
        if self.model_name.trim().is_empty() {
            missing.push("modelName");
        }
        missing
    }

    /// Return the draft with sampling parameters clamped into range
    pub fn clamped(mut self) -> Self {
        self.temperature = clamp_temperature(self.temperature);
        self.max_tokens = clamp_max_tokens(self.max_tokens);
        self
    }

    /// Build a complete agent: fresh id, `idle` status, equal timestamps
    pub fn into_agent(self) -> Agent {
        let draft = self.clamped();
        let now = Utc::now();
        Agent {
            id: super::new_id(),
            name: draft.name,
            role: draft.role,
            description: draft.description,
            llm_provider: draft.llm_provider,
            model_name: draft.model_name,
            system_prompt: draft.system_prompt,
            temperature: draft.temperature,
            max_tokens: draft.max_tokens,
            status: AgentStatus::Idle,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an agent
///
/// Only the supplied fields replace the stored ones. `id` and `createdAt` are
/// not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<LlmProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AgentStatus>,
}

impl AgentPatch {
    pub fn is_empty(&self) -> bool {
        *self == AgentPatch::default()
    }

    /// Return the patch with any supplied sampling parameters clamped
    pub fn clamped(mut self) -> Self {
        self.temperature = self.temperature.map(clamp_temperature);
        self.max_tokens = self.max_tokens.map(clamp_max_tokens);
        self
    }

    /// Shallow-merge the supplied fields into `agent` and stamp `updatedAt`
    pub fn apply(self, agent: &mut Agent, now: DateTime<Utc>) {
        let patch = self.clamped();
        if let Some(name) = patch.name {
            agent.name = name;
        }
        if let Some(role) = patch.role {
            agent.role = role;
        }
        if let Some(description) = patch.description {
            agent.description = description;
        }
        if let Some(provider) = patch.llm_provider {
            agent.llm_provider = provider;
        }
        if let Some(model_name) = patch.model_name {
            agent.model_name = model_name;
        }
        if let Some(prompt) = patch.system_prompt {
            agent.system_prompt = prompt;
        }
        if let Some(temperature) = patch.temperature {
            agent.temperature = temperature;
        }
        if let Some(max_tokens) = patch.max_tokens {
            agent.max_tokens = max_tokens;
        }
        if let Some(status) = patch.status {
            agent.status = status;
        }
        agent.updated_at = now;
    }
}

/// Lazy resolution of agent ids
///
/// Workflow nodes refer to agents by id only. Anything that can answer
/// "which agent has this id, if any" implements this trait; an absent answer
/// is a normal outcome, not an error.
pub trait AgentLookup {
    fn find_agent(&self, id: &str) -> Option<&Agent>;
}

impl AgentLookup for [Agent] {
    fn find_agent(&self, id: &str) -> Option<&Agent> {
        self.iter().find(|agent| agent.id == id)
    }
}

impl AgentLookup for Vec<Agent> {
    fn find_agent(&self, id: &str) -> Option<&Agent> {
        self.as_slice().find_agent(id)
    }
}

impl AgentLookup for HashMap<String, Agent> {
    fn find_agent(&self, id: &str) -> Option<&Agent> {
        self.get(id)
    }
}
