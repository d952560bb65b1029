//! Workflow record store
//!
//! Besides the list of workflows this store tracks the *current* workflow:
//! the one open in the canvas editor. The current workflow is a copy; graph
//! edits made through [`WorkflowStore::set_current_nodes`] and
//! [`WorkflowStore::set_current_edges`] are written back into the list entry
//! with the same id so the two never drift apart.

use chrono::{DateTime, Utc};

use crate::models::{Workflow, WorkflowEdge, WorkflowNode, WorkflowPatch};

use super::storage::{Patch, RecordStore};

#[derive(Debug, Clone, Default)]
pub struct WorkflowStore {
    records: RecordStore<Workflow>,
    current: Option<Workflow>,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[Workflow] {
        self.records.list()
    }

    pub fn get(&self, id: &str) -> Option<&Workflow> {
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

    pub fn add(&mut self, workflow: Workflow) {
        tracing::debug!(workflow_id = %workflow.id, name = %workflow.name, "adding workflow");
        self.records.add(workflow);
    }

    /// Shallow-merge `patch` into the workflow and into the current copy if
    /// it is the same workflow; no-op if the id is absent
    pub fn update(&mut self, id: &str, patch: WorkflowPatch) -> bool {
        self.update_at(id, patch, Utc::now())
    }

    fn update_at(&mut self, id: &str, patch: WorkflowPatch, now: DateTime<Utc>) -> bool {
        let updated = self.records.update_at(id, patch.clone(), now);
        if updated {
            if let Some(current) = self.current.as_mut().filter(|w| w.id == id) {
                patch.apply_to(current, now);
            }
        }
        updated
    }

    /// Remove the workflow; clears the current workflow if it was this one
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.records.delete(id);
        if self.current.as_ref().is_some_and(|w| w.id == id) {
            self.current = None;
        }
        removed
    }

    /// Open a workflow in the editor, or close the editor with `None`
    pub fn set_current(&mut self, workflow: Option<Workflow>) {
        self.current = workflow;
    }

    pub fn current(&self) -> Option<&Workflow> {
        self.current.as_ref()
    }

    /// Replace the current workflow's nodes and propagate them to its list
    /// entry; no-op without a current workflow or when nothing changed
    pub fn set_current_nodes(&mut self, nodes: Vec<WorkflowNode>) -> bool {
        self.set_current_graph(Some(nodes), None, Utc::now())
    }

    /// Replace the current workflow's edges and propagate them to its list
    /// entry; no-op without a current workflow or when nothing changed
    pub fn set_current_edges(&mut self, edges: Vec<WorkflowEdge>) -> bool {
        self.set_current_graph(None, Some(edges), Utc::now())
    }

    /// Replace both lists of the current workflow in one step
    pub(crate) fn set_current_graph(
        &mut self,
        nodes: Option<Vec<WorkflowNode>>,
        edges: Option<Vec<WorkflowEdge>>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(current) = self.current.as_mut() else {
            tracing::debug!("no current workflow; ignoring graph edit");
            return false;
        };

        let nodes = nodes.filter(|nodes| *nodes != current.nodes);
        let edges = edges.filter(|edges| *edges != current.edges);
        if nodes.is_none() && edges.is_none() {
            return false;
        }

        if let Some(nodes) = nodes {
            current.nodes = nodes;
        }
        if let Some(edges) = edges {
            current.edges = edges;
        }
        current.updated_at = now;

        let snapshot = current.clone();
        self.records.modify(&snapshot.id, |workflow| {
            workflow.nodes = snapshot.nodes.clone();
            workflow.edges = snapshot.edges.clone();
            workflow.updated_at = now;
        });
        true
    }

    /// Replace every workflow, e.g. after listing them from the backend
    ///
    /// The current workflow is refreshed from the new set, or closed when it
    /// is no longer in it.
    pub fn replace_all(&mut self, workflows: Vec<Workflow>) {
        self.records.replace_all(workflows);
        self.resync_current();
    }

    /// Replace every workflow unless the store changed since `revision_at_request`
    pub fn apply_fetched(&mut self, revision_at_request: u64, workflows: Vec<Workflow>) -> bool {
        let applied = self.records.apply_fetched(revision_at_request, workflows);
        if applied {
            self.resync_current();
        }
        applied
    }

    fn resync_current(&mut self) {
        if let Some(id) = self.current.as_ref().map(|w| w.id.clone()) {
            self.current = self.records.get(&id).cloned();
            if self.current.is_none() {
                tracing::debug!(workflow_id = %id, "current workflow is gone; closing it");
            }
        }
    }
}
