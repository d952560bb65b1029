// Agent Orchestrator - Rust Edition
// Client-side core for a no-code agent orchestration platform

//! # Agent Orchestrator Library
//!
//! This is the library root for the Agent Orchestrator client core. It holds the
//! data model that gets handed to the orchestration backend, the local record
//! stores that front ends mutate, and the HTTP/SSE gateway to the backend.
//!
//! ## Core Components
//!
//! ### Domain Models
//! - [`Agent`]: An LLM-backed worker definition (role, prompt, model parameters)
//! - [`Workflow`]: A graph of [`WorkflowNode`]s and [`WorkflowEdge`]s
//! - [`ValidationReport`]: Result of checking a workflow graph before execution
//! - [`Team`], [`ExecutionLog`], [`LlmConfig`]: Wire types for the remaining resources
//!
//! ### Stores
//! - [`AgentStore`]: Agent records plus the "selected" agent
//! - [`WorkflowStore`]: Workflow records plus the workflow being edited
//! - [`Studio`]: Explicit state container owning both stores
//!
//! ### API Gateway
//! - [`Client`]: Uniform HTTP client for agents, workflows, teams, logs and LLM utilities
//! - [`LogStreamHandle`]: Cancellable live log subscription over Server-Sent Events
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use agent_orchestrator::{AgentDraft, Client, Studio, Workflow};
//!
//! # async fn run() -> agent_orchestrator::Result<()> {
//! let mut studio = Studio::new();
//!
//! // Create an agent locally
//! let agent = AgentDraft::new("Researcher", "R", "llama2").into_agent();
//! studio.agents.add(agent.clone());
//!
//! // Build and check a workflow before handing it to the backend
//! let workflow = Workflow::new("Research", "Single agent pipeline");
//! let report = workflow.validate(&studio.agents);
//! assert!(report.is_executable());
//!
//! // Talk to the backend
//! let client = Client::builder().base_url("http://localhost:8000")?.build()?;
//! let remote = client.workflows().list().await?;
//! println!("{} workflows on the server", remote.len());
//! # Ok(())
//! # }
//! ```

// Core domain models (agents, workflow graphs, teams, logs)
pub mod models;

// Local record stores and the state container
pub mod engine;

// HTTP and event-stream gateway to the orchestration backend
pub mod client;

// Locally persisted settings blob
pub mod settings;

// Re-export core domain types for easy access
pub use models::{
    clamp_max_tokens, clamp_temperature, new_id, Agent, AgentDraft, AgentLookup, AgentPatch,
    AgentRef, AgentStatus, ConnectionTestResult, EdgeId, ExecutionLog, ExecutionMetrics,
    ExecutionStep, GraphIssue, LlmConfig, LlmProvider, LogLevel, NodeData, NodeId, NodeType,
    OllamaModel, Position, Severity, Team, TeamDraft, TeamPatch, ValidationReport, Workflow,
    WorkflowDraft, WorkflowEdge, WorkflowNode, WorkflowPatch, WorkflowStatus,
};

// Re-export store types
pub use engine::{
    canvas::Canvas,
    state::{refresh_agents, refresh_workflows, RemoteCollection, SharedStudio, Studio},
    storage::{Patch, Record, RecordStore},
    AgentStore, WorkflowStore,
};

// Re-export gateway types
pub use client::{
    logs::{LogStreamHandle, LogSubscription},
    probe_ollama, Client, ClientBuilder, ClientConfig,
};

pub use settings::{SandboxType, Settings, SettingsStore};

use thiserror::Error;

/// Error types for Agent Orchestrator operations
///
/// The variants keep the three failure families of the gateway apart so a
/// caller can decide what to do with each one:
/// - **Transport** failures never reached the backend (connection refused, DNS, timeout)
/// - **Backend** failures are non-2xx responses
/// - **Malformed payloads** are event-stream messages that did not decode
///
/// Local failures (graph validation, settings I/O, configuration) get their own
/// variants. Store operations never fail.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The request could not be delivered or the connection broke mid-response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request exceeded the configured client timeout
    #[error("Timeout: request took longer than {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The backend answered with a non-success status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The backend answered 404 for the addressed resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend answered but the body is not the expected JSON document
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// An event-stream message carried a payload that is not a log record
    #[error("Malformed event payload: {0}")]
    MalformedEvent(String),

    /// A workflow graph failed validation and cannot be executed
    #[error("Invalid workflow graph: {0}")]
    InvalidGraph(String),

    /// Client or CLI configuration is unusable (bad URL, bad header value)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The settings blob could not be read or written
    #[error("Settings error: {0}")]
    Settings(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local file system errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`OrchestratorError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Backend,
    MalformedPayload,
    Local,
}

impl OrchestratorError {
    /// Which failure family this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestratorError::Transport(_) | OrchestratorError::Timeout { .. } => {
                ErrorKind::Transport
            }
            OrchestratorError::Server { .. } | OrchestratorError::NotFound(_) => {
                ErrorKind::Backend
            }
            OrchestratorError::MalformedEvent(_) | OrchestratorError::InvalidResponse(_) => {
                ErrorKind::MalformedPayload
            }
            _ => ErrorKind::Local,
        }
    }

    /// Whether repeating the same request could succeed
    ///
    /// Transport failures and 5xx responses qualify. Nothing in this crate
    /// retries on its own; callers decide.
    pub fn is_retryable(&self) -> bool {
        match self {
            OrchestratorError::Transport(_) | OrchestratorError::Timeout { .. } => true,
            OrchestratorError::Server { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Conversion without access to the client configuration
///
/// [`Client`] maps timeouts itself so that [`OrchestratorError::Timeout`]
/// carries the timeout that was actually configured; here a timeout is only a
/// transport failure.
impl From<reqwest::Error> for OrchestratorError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            OrchestratorError::InvalidResponse(error.to_string())
        } else if error.is_timeout() {
            OrchestratorError::Transport(format!("Request timed out: {}", error))
        } else if error.is_connect() {
            OrchestratorError::Transport(format!("Connection failed: {}", error))
        } else {
            OrchestratorError::Transport(error.to_string())
        }
    }
}

impl From<url::ParseError> for OrchestratorError {
    fn from(error: url::ParseError) -> Self {
        OrchestratorError::Configuration(format!("Invalid URL: {}", error))
    }
}

/// Type alias for Results that use our error type
pub type Result<T> = std::result::Result<T, OrchestratorError>;
