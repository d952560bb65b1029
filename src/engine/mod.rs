// Agent Orchestrator Engine
// Local record stores, the canvas editor session and the state container

//! # Engine Module
//!
//! This module is the layer between the domain models and the front ends.
//! It holds the in-memory state a UI or CLI mutates between calls to the
//! backend.
//!
//! ## Engine Components
//!
//! ### Storage (`storage` module)
//! - Generic ordered record collection with shallow-merge updates
//! - Revision counter used to drop stale fetch results
//!
//! ### Stores (`agents`, `workflows` modules)
//! - `AgentStore`: agents plus the selected agent
//! - `WorkflowStore`: workflows plus the workflow open in the editor
//!
//! ### Canvas (`canvas` module)
//! - Working copy of a workflow graph with node/edge editing helpers
//!
//! ### State (`state` module)
//! - `Studio` container and backend refresh helpers
//!
//! ## Rust Learning Notes:
//!
//! ### Re-exports for API Design
//! The `pub use` statements flatten the module hierarchy so callers can
//! write `engine::AgentStore` instead of `engine::agents::AgentStore`.

/// Generic record storage
pub mod storage;

/// Agent store with selection tracking
pub mod agents;

/// Workflow store with the current (open) workflow
pub mod workflows;

/// Canvas editing session
pub mod canvas;

/// Studio state container and refresh helpers
pub mod state;

pub use agents::AgentStore;
pub use workflows::WorkflowStore;
