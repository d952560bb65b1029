//! # Studio State
//!
//! [`Studio`] is the explicit state container that owns both stores. A
//! front end either holds one directly or shares it across tasks as a
//! [`SharedStudio`].
//!
//! ## Refreshing from the Backend
//!
//! [`refresh_agents`] and [`refresh_workflows`] pull the full list from a
//! [`RemoteCollection`] and install it, unless a local mutation happened
//! while the request was in flight. The lock is never held across the
//! network call.
//!
//! ## Rust Learning Notes:
//!
//! ### Arc<RwLock<T>>
//! `tokio::sync::RwLock` lets many readers inspect the studio at once while
//! writers get exclusive access. Wrapping it in `Arc` gives every task its
//! own handle to the same state.
//!
//! ### async_trait
//! Traits with async methods need the `#[async_trait]` macro so they can be
//! used as `&dyn RemoteCollection<T>` trait objects.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::{Agent, ValidationReport, Workflow};
use crate::Result;

use super::{AgentStore, WorkflowStore};

/// Everything a front end keeps in memory
#[derive(Debug, Clone, Default)]
pub struct Studio {
    pub agents: AgentStore,
    pub workflows: WorkflowStore,
}

/// Studio shared between tasks
pub type SharedStudio = Arc<RwLock<Studio>>;

impl Studio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedStudio {
        Arc::new(RwLock::new(self))
    }

    /// Validate a stored workflow against the agents currently defined
    pub fn validate_workflow(&self, id: &str) -> Option<ValidationReport> {
        self.workflows.get(id).map(|w| w.validate(&self.agents))
    }

    /// Validate the workflow open in the editor
    pub fn validate_current(&self) -> Option<ValidationReport> {
        self.workflows.current().map(|w| w.validate(&self.agents))
    }
}

/// A backend collection that can be listed in full
#[async_trait]
pub trait RemoteCollection<T>: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<T>>;
}

/// Replace the agent list with the backend's; returns `false` if the fetched
/// list was stale and dropped
pub async fn refresh_agents(
    studio: &SharedStudio,
    remote: &dyn RemoteCollection<Agent>,
) -> Result<bool> {
    let revision = studio.read().await.agents.revision();
    let agents = remote.fetch_all().await?;
    let count = agents.len();
    let applied = studio.write().await.agents.apply_fetched(revision, agents);
    if applied {
        info!(count, "refreshed agents");
    } else {
        debug!("agents changed during refresh; keeping local state");
    }
    Ok(applied)
}

/// Replace the workflow list with the backend's; returns `false` if the
/// fetched list was stale and dropped
pub async fn refresh_workflows(
    studio: &SharedStudio,
    remote: &dyn RemoteCollection<Workflow>,
) -> Result<bool> {
    let revision = studio.read().await.workflows.revision();
    let workflows = remote.fetch_all().await?;
    let count = workflows.len();
    let applied = studio.write().await.workflows.apply_fetched(revision, workflows);
    if applied {
        info!(count, "refreshed workflows");
    } else {
        debug!("workflows changed during refresh; keeping local state");
    }
    Ok(applied)
}
