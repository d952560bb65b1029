// Core domain models for Agent Orchestrator
// These are the wire-compatible data structures shared with the backend

//! # Domain Models
//!
//! Every type here serializes to the JSON shape the orchestration backend
//! speaks (camelCase field names, lowercase enum tags), so the same structs
//! travel through the local stores and over the wire unchanged.
//!
//! - [`agent`]: agent definitions, drafts, partial updates and boundary clamping
//! - [`workflow`]: the workflow graph and its consistency contract
//! - [`team`]: groups of agents
//! - [`log`]: execution log records and metrics
//! - [`llm`]: provider connection parameters and probe results
//! - [`timestamp`]: lenient timestamp (de)serialization

// Agent definitions with LLM bindings
pub mod agent;

// Workflow graph: nodes, edges, validation and execution planning
pub mod workflow;

// Teams of agents
pub mod team;

// Execution logs
pub mod log;

// LLM provider configuration
pub mod llm;

// Serde helpers for backend timestamps
pub mod timestamp;

pub use agent::{
    clamp_max_tokens, clamp_temperature, Agent, AgentDraft, AgentLookup, AgentPatch, AgentStatus,
    LlmProvider,
};
pub use llm::{ConnectionTestResult, LlmConfig, OllamaModel};
pub use log::{ExecutionLog, ExecutionMetrics, LogLevel};
pub use team::{Team, TeamDraft, TeamPatch};
pub use workflow::{
    AgentRef, EdgeId, ExecutionStep, GraphIssue, NodeData, NodeId, NodeType, Position, Severity,
    ValidationReport, Workflow, WorkflowDraft, WorkflowEdge, WorkflowNode, WorkflowPatch,
    WorkflowStatus,
};

/// Generate a collision-resistant identifier for a new record
///
/// Stores never check uniqueness themselves, so every locally created agent,
/// workflow and canvas node gets its id from here.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
