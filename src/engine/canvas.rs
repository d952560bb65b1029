//! Canvas editing session
//!
//! A [`Canvas`] is a working copy of a workflow graph. Editors drop agents
//! onto it, wire nodes together and finally [`commit`](Canvas::commit) the
//! result into the [`WorkflowStore`]'s current workflow in one step.
//!
//! Edge ids follow the `e{source}-{target}` convention, and connecting the
//! same pair twice is ignored.

use crate::models::{
    new_id, workflow::start_node, Agent, AgentLookup, EdgeId, NodeId, NodeType, Position,
    ValidationReport, Workflow, WorkflowEdge, WorkflowNode,
};

use super::WorkflowStore;

#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    workflow_id: Option<String>,
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Blank canvas holding only the start node
    pub fn new() -> Self {
        Self {
            workflow_id: None,
            nodes: vec![start_node()],
            edges: Vec::new(),
        }
    }

    /// Working copy of an existing workflow's graph
    pub fn for_workflow(workflow: &Workflow) -> Self {
        Self {
            workflow_id: Some(workflow.id.clone()),
            nodes: workflow.nodes.clone(),
            edges: workflow.edges.clone(),
        }
    }

    /// Working copy of the store's current workflow, if one is open
    pub fn for_current(store: &WorkflowStore) -> Option<Self> {
        store.current().map(Self::for_workflow)
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }

    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[WorkflowEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn add_node(&mut self, node: WorkflowNode) {
        self.nodes.push(node);
    }

    /// Drop an agent onto the canvas; returns the new node's id
    pub fn add_agent_node(&mut self, agent: &Agent, position: Position) -> NodeId {
        let id = new_id();
        let mut node = WorkflowNode::for_agent(id.clone(), agent);
        node.position = position;
        self.nodes.push(node);
        id
    }

    /// Add a free-standing node of any type; returns the new node's id
    pub fn add_typed_node<L: Into<String>>(
        &mut self,
        node_type: NodeType,
        label: L,
        position: Position,
    ) -> NodeId {
        let id = new_id();
        let mut node = WorkflowNode::new(id.clone(), node_type, label);
        node.position = position;
        self.nodes.push(node);
        id
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        match self.nodes.iter_mut().find(|node| node.id == id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Connect two nodes; `None` if this connection already exists
    ///
    /// Endpoints are not checked here; [`Canvas::validate`] reports
    /// dangling edges.
    pub fn connect(&mut self, source: &str, target: &str) -> Option<EdgeId> {
        self.connect_edge(WorkflowEdge::new(edge_id(source, target), source, target))
    }

    /// Connect with a branch label, e.g. the outcome of a condition node
    pub fn connect_labeled<L: Into<String>>(
        &mut self,
        source: &str,
        target: &str,
        label: L,
    ) -> Option<EdgeId> {
        self.connect_edge(WorkflowEdge::new(edge_id(source, target), source, target).with_label(label))
    }

    fn connect_edge(&mut self, edge: WorkflowEdge) -> Option<EdgeId> {
        let exists = self
            .edges
            .iter()
            .any(|e| e.id == edge.id || (e.source == edge.source && e.target == edge.target));
        if exists {
            return None;
        }
        let id = edge.id.clone();
        self.edges.push(edge);
        Some(id)
    }

    /// Remove a node together with every edge touching it
    pub fn remove_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|edge| edge.source != id && edge.target != id);
        true
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|edge| edge.id != id);
        self.edges.len() != before
    }

    /// Check the working copy as it would be committed
    pub fn validate(&self, agents: &dyn AgentLookup) -> ValidationReport {
        self.preview().validate(agents)
    }

    fn preview(&self) -> Workflow {
        let mut workflow = Workflow::new("canvas", "");
        if let Some(id) = &self.workflow_id {
            workflow.id = id.clone();
        }
        workflow.nodes = self.nodes.clone();
        workflow.edges = self.edges.clone();
        workflow
    }

    /// Write the working copy into the store's current workflow
    ///
    /// Returns `false` when no workflow is open, or when the open workflow
    /// is not the one this canvas was taken from.
    pub fn commit(&self, store: &mut WorkflowStore) -> bool {
        let matches = match (store.current(), &self.workflow_id) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(current), Some(id)) => current.id == *id,
        };
        if !matches {
            tracing::warn!(
                canvas_workflow = ?self.workflow_id,
                "canvas does not belong to the current workflow; not committing"
            );
            return false;
        }
        store.set_current_graph(
            Some(self.nodes.clone()),
            Some(self.edges.clone()),
            chrono::Utc::now(),
        );
        true
    }
}

fn edge_id(source: &str, target: &str) -> EdgeId {
    format!("e{}-{}", source, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentDraft, GraphIssue};

    #[test]
    fn test_new_canvas_has_start_node() {
        let canvas = Canvas::new();
        assert_eq!(canvas.nodes().len(), 1);
        assert_eq!(canvas.nodes()[0].id, "1");
        assert_eq!(canvas.nodes()[0].node_type, NodeType::Input);
    }

    #[test]
    fn test_connect_uses_edge_convention_and_dedupes() {
        let mut canvas = Canvas::new();
        let agent = AgentDraft::new("Researcher", "R", "llama2").into_agent();
        let node = canvas.add_agent_node(&agent, Position::new(250.0, 150.0));

        let edge = canvas.connect("1", &node).unwrap();
        assert_eq!(edge, format!("e1-{}", node));
        assert!(canvas.connect("1", &node).is_none());
        assert_eq!(canvas.edges().len(), 1);
    }

    #[test]
    fn test_remove_node_drops_incident_edges() {
        let mut canvas = Canvas::new();
        let a = canvas.add_typed_node(NodeType::Agent, "A", Position::default());
        let b = canvas.add_typed_node(NodeType::Output, "B", Position::default());
        canvas.connect("1", &a);
        canvas.connect(&a, &b);

        assert!(canvas.remove_node(&a));
        assert!(canvas.edges().is_empty());
        assert!(!canvas.remove_node(&a));
    }

    #[test]
    fn test_validate_flags_dangling_edge() {
        let mut canvas = Canvas::new();
        canvas.connect("1", "missing");

        let report = canvas.validate(&Vec::<Agent>::new());
        assert!(!report.is_executable());
        assert!(report
            .errors()
            .any(|issue| matches!(issue, GraphIssue::DanglingEdgeTarget { .. })));
    }

    #[test]
    fn test_commit_requires_matching_current_workflow() {
        let mut store = WorkflowStore::new();
        let workflow = Workflow::new("W", "");
        store.add(workflow.clone());

        let mut canvas = Canvas::for_workflow(&workflow);
        let node = canvas.add_typed_node(NodeType::Output, "Done", Position::default());
        canvas.connect("1", &node);

        // Nothing open yet
        assert!(!canvas.commit(&mut store));

        store.set_current(Some(Workflow::new("Other", "")));
        assert!(!canvas.commit(&mut store));

        store.set_current(Some(workflow.clone()));
        assert!(canvas.commit(&mut store));
        assert_eq!(store.get(&workflow.id).unwrap().edges.len(), 1);
        assert_eq!(store.current().unwrap().nodes.len(), 2);
    }
}
