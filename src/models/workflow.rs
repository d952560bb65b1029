// Workflow definitions - node/edge graphs wiring agents together

//! # Workflow Graphs
//!
//! A [`Workflow`] is a graph of [`WorkflowNode`]s connected by
//! [`WorkflowEdge`]s. Nodes may reference an agent by id; edges reference
//! nodes by id. This is the structure handed to the orchestration backend.
//!
//! ## Consistency Contract
//!
//! The stores accept any graph. Before a workflow is considered executable it
//! must pass [`Workflow::validate`], which reports:
//! - **Errors**: duplicate node/edge ids, edges whose `source` or `target`
//!   names no node in the same workflow
//! - **Warnings**: node `agentId`s that resolve to no agent, cycles, and nodes
//!   unreachable from any input node
//!
//! Cycles are representable on purpose (revision loops, retries) and never
//! make a workflow invalid on their own.
//!
//! ## Weak Agent References
//!
//! `data.agentId` is a plain id, resolved lazily through [`AgentLookup`].
//! Agents can be deleted independently of the workflows that mention them,
//! so every resolution yields an [`AgentRef`] that may be
//! [`AgentRef::Dangling`].
//!
//! ## Rust Learning Notes:
//!
//! This file demonstrates:
//! - Graph algorithms over index-based adjacency lists
//! - Iterative DFS (no recursion depth limits on large graphs)
//! - Collecting every problem into a report instead of failing fast
//! - Lifetimes tying borrowed results to the workflow they came from

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use super::agent::{Agent, AgentLookup};
use crate::{OrchestratorError, Result};

/// Node identifier, unique within its workflow
pub type NodeId = String;

/// Edge identifier, unique within its workflow
pub type EdgeId = String;

/// Label shown for node references whose agent no longer exists
pub const UNKNOWN_AGENT_LABEL: &str = "unknown agent";

/// Kinds of workflow nodes
///
/// The canvas library's generic `default` node type is read as `agent`,
/// which is how agent nodes are dropped onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    #[serde(alias = "default")]
    Agent,
    Condition,
    Input,
    Output,
    Group,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeType::Agent => "agent",
            NodeType::Condition => "condition",
            NodeType::Input => "input",
            NodeType::Output => "output",
            NodeType::Group => "group",
        };
        f.write_str(label)
    }
}

/// Canvas position; layout only, no semantic meaning
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    /// Weak reference to an agent; may dangle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<HashMap<String, serde_json::Value>>,
}

/// A node in the workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
}

impl WorkflowNode {
    pub fn new<I: Into<String>, L: Into<String>>(id: I, node_type: NodeType, label: L) -> Self {
        Self {
            id: id.into(),
            node_type,
            position: Position::default(),
            data: NodeData {
                label: label.into(),
                agent_id: None,
                config: None,
            },
        }
    }

    /// Node bound to an agent, labelled with the agent's name
    pub fn for_agent<I: Into<String>>(id: I, agent: &Agent) -> Self {
        Self::new(id, NodeType::Agent, agent.name.clone()).with_agent(agent.id.clone())
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_agent<S: Into<String>>(mut self, agent_id: S) -> Self {
        self.data.agent_id = Some(agent_id.into());
        self
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.data.agent_id.as_deref()
    }

    /// Resolve this node's agent reference, if it has one
    pub fn resolve_agent<'a>(&'a self, agents: &'a dyn AgentLookup) -> Option<AgentRef<'a>> {
        self.agent_id().map(|id| match agents.find_agent(id) {
            Some(agent) => AgentRef::Resolved(agent),
            None => AgentRef::Dangling(id),
        })
    }
}

/// A directed edge between two nodes of the same workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Branching semantics, e.g. the outcome of a condition node
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
}

impl WorkflowEdge {
    pub fn new<I: Into<String>, S: Into<String>, T: Into<String>>(id: I, source: S, target: T) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
            edge_type: None,
        }
    }

    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_type<S: Into<String>>(mut self, edge_type: S) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }
}

/// Lifecycle status of a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
    Error,
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkflowStatus::Draft => "draft",
            WorkflowStatus::Active => "active",
            WorkflowStatus::Paused => "paused",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// A workflow: metadata plus its node/edge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::models::timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Create payload for a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

impl WorkflowDraft {
    pub fn new<N: Into<String>, D: Into<String>>(name: N, description: D) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            nodes: vec![start_node()],
            edges: Vec::new(),
        }
    }

    /// Build a complete draft-status workflow with a fresh id
    pub fn into_workflow(self) -> Workflow {
        let now = Utc::now();
        Workflow {
            id: super::new_id(),
            name: self.name,
            description: self.description,
            nodes: self.nodes,
            edges: self.edges,
            status: WorkflowStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a workflow; node and edge lists replace wholesale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<WorkflowNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<WorkflowEdge>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,
}

impl WorkflowPatch {
    pub fn is_empty(&self) -> bool {
        *self == WorkflowPatch::default()
    }

    /// Shallow-merge the supplied fields into `workflow` and stamp `updatedAt`
    pub fn apply(self, workflow: &mut Workflow, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            workflow.name = name;
        }
        if let Some(description) = self.description {
            workflow.description = description;
        }
        if let Some(nodes) = self.nodes {
            workflow.nodes = nodes;
        }
        if let Some(edges) = self.edges {
            workflow.edges = edges;
        }
        if let Some(status) = self.status {
            workflow.status = status;
        }
        workflow.updated_at = now;
    }
}

/// The node every new canvas starts with
pub(crate) fn start_node() -> WorkflowNode {
    WorkflowNode::new("1", NodeType::Input, "Start").at(250.0, 25.0)
}

/// How bad a graph issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks execution
    Error,
    /// Reported, tolerated
    Warning,
}

/// A single problem found in a workflow graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum GraphIssue {
    #[serde(rename_all = "camelCase")]
    DuplicateNodeId { node_id: NodeId },
    #[serde(rename_all = "camelCase")]
    DuplicateEdgeId { edge_id: EdgeId },
    #[serde(rename_all = "camelCase")]
    DanglingEdgeSource { edge_id: EdgeId, node_id: NodeId },
    #[serde(rename_all = "camelCase")]
    DanglingEdgeTarget { edge_id: EdgeId, node_id: NodeId },
    #[serde(rename_all = "camelCase")]
    DanglingAgentReference { node_id: NodeId, agent_id: String },
    #[serde(rename_all = "camelCase")]
    Cycle { node_ids: Vec<NodeId> },
    #[serde(rename_all = "camelCase")]
    UnreachableNode { node_id: NodeId },
}

impl GraphIssue {
    pub fn severity(&self) -> Severity {
        match self {
            GraphIssue::DuplicateNodeId { .. }
            | GraphIssue::DuplicateEdgeId { .. }
            | GraphIssue::DanglingEdgeSource { .. }
            | GraphIssue::DanglingEdgeTarget { .. } => Severity::Error,
            GraphIssue::DanglingAgentReference { .. }
            | GraphIssue::Cycle { .. }
            | GraphIssue::UnreachableNode { .. } => Severity::Warning,
        }
    }

    /// The edge this issue is about, if any
    pub fn edge_id(&self) -> Option<&str> {
        match self {
            GraphIssue::DuplicateEdgeId { edge_id }
            | GraphIssue::DanglingEdgeSource { edge_id, .. }
            | GraphIssue::DanglingEdgeTarget { edge_id, .. } => Some(edge_id),
            _ => None,
        }
    }
}

impl fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphIssue::DuplicateNodeId { node_id } => {
                write!(f, "node id '{}' is used more than once", node_id)
            }
            GraphIssue::DuplicateEdgeId { edge_id } => {
                write!(f, "edge id '{}' is used more than once", edge_id)
            }
            GraphIssue::DanglingEdgeSource { edge_id, node_id } => {
                write!(f, "edge '{}' starts at missing node '{}'", edge_id, node_id)
            }
            GraphIssue::DanglingEdgeTarget { edge_id, node_id } => {
                write!(f, "edge '{}' ends at missing node '{}'", edge_id, node_id)
            }
            GraphIssue::DanglingAgentReference { node_id, agent_id } => {
                write!(f, "node '{}' references {} '{}'", node_id, UNKNOWN_AGENT_LABEL, agent_id)
            }
            GraphIssue::Cycle { node_ids } => write!(f, "cycle through {}", node_ids.join(" -> ")),
            GraphIssue::UnreachableNode { node_id } => {
                write!(f, "node '{}' is not reachable from any input node", node_id)
            }
        }
    }
}

/// Every issue found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<GraphIssue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &GraphIssue> {
        self.issues.iter().filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &GraphIssue> {
        self.issues.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// No error-severity issues
    pub fn is_executable(&self) -> bool {
        self.errors().next().is_none()
    }

    /// No issues of any severity
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Ids of edges flagged with an error, in report order, without repeats
    pub fn invalid_edges(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.errors()
            .filter_map(GraphIssue::edge_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Convert into a `Result`, listing every error in the message
    pub fn into_result(self) -> Result<()> {
        if self.is_executable() {
            return Ok(());
        }
        let messages: Vec<String> = self.errors().map(ToString::to_string).collect();
        Err(OrchestratorError::InvalidGraph(messages.join("; ")))
    }
}

/// Resolution of a node's weak agent reference
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentRef<'a> {
    Resolved(&'a Agent),
    Dangling(&'a str),
}

impl<'a> AgentRef<'a> {
    pub fn agent(&self) -> Option<&'a Agent> {
        match *self {
            AgentRef::Resolved(agent) => Some(agent),
            AgentRef::Dangling(_) => None,
        }
    }

    pub fn agent_id(&self) -> &'a str {
        match *self {
            AgentRef::Resolved(agent) => &agent.id,
            AgentRef::Dangling(id) => id,
        }
    }

    /// Agent name, or "unknown agent" when the reference dangles
    pub fn display_name(&self) -> &'a str {
        match *self {
            AgentRef::Resolved(agent) => &agent.name,
            AgentRef::Dangling(_) => UNKNOWN_AGENT_LABEL,
        }
    }
}

/// One agent invocation in an execution plan
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionStep<'a> {
    pub node_id: &'a str,
    pub label: &'a str,
    pub agent: AgentRef<'a>,
}

/// Index-based view of the graph restricted to well-formed edges
///
/// Duplicate node ids map to their first occurrence; edges with a missing
/// endpoint are left out.
struct GraphIndex<'a> {
    ids: Vec<&'a str>,
    adjacency: Vec<Vec<usize>>,
}

impl<'a> GraphIndex<'a> {
    fn build(workflow: &'a Workflow) -> Self {
        let mut index_of: HashMap<&str, usize> = HashMap::new();
        let mut ids = Vec::new();
        for node in &workflow.nodes {
            if !index_of.contains_key(node.id.as_str()) {
                index_of.insert(&node.id, ids.len());
                ids.push(node.id.as_str());
            }
        }

        let mut adjacency = vec![Vec::new(); ids.len()];
        for edge in &workflow.edges {
            if let (Some(&s), Some(&t)) = (
                index_of.get(edge.source.as_str()),
                index_of.get(edge.target.as_str()),
            ) {
                adjacency[s].push(t);
            }
        }

        Self { ids, adjacency }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    /// Strongly connected components that form cycles (Kosaraju, iterative)
    fn cyclic_components(&self) -> Vec<Vec<usize>> {
        let n = self.len();

        // First pass: post-order over the forward graph
        let mut visited = vec![false; n];
        let mut post_order = Vec::with_capacity(n);
        for root in 0..n {
            if visited[root] {
                continue;
            }
            visited[root] = true;
            let mut stack = vec![(root, 0usize)];
            while let Some((node, next_child)) = stack.pop() {
                if let Some(&child) = self.adjacency[node].get(next_child) {
                    stack.push((node, next_child + 1));
                    if !visited[child] {
                        visited[child] = true;
                        stack.push((child, 0));
                    }
                } else {
                    post_order.push(node);
                }
            }
        }

        // Second pass: components over the transposed graph
        let mut reverse = vec![Vec::new(); n];
        for (source, targets) in self.adjacency.iter().enumerate() {
            for &target in targets {
                reverse[target].push(source);
            }
        }

        let mut assigned = vec![false; n];
        let mut components = Vec::new();
        for &root in post_order.iter().rev() {
            if assigned[root] {
                continue;
            }
            assigned[root] = true;
            let mut component = vec![root];
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                for &prev in &reverse[node] {
                    if !assigned[prev] {
                        assigned[prev] = true;
                        component.push(prev);
                        stack.push(prev);
                    }
                }
            }

            let self_loop = component.len() == 1 && self.adjacency[root].contains(&root);
            if component.len() > 1 || self_loop {
                component.sort_unstable();
                components.push(component);
            }
        }

        components.sort_by_key(|c| c[0]);
        components
    }

    /// Kahn's algorithm; ties broken by declaration order
    fn topological_order(&self) -> Option<Vec<usize>> {
        let n = self.len();
        let mut in_degree = vec![0usize; n];
        for targets in &self.adjacency {
            for &target in targets {
                in_degree[target] += 1;
            }
        }

        let mut ready: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(node) = ready.pop_front() {
            order.push(node);
            for &target in &self.adjacency[node] {
                in_degree[target] -= 1;
                if in_degree[target] == 0 {
                    ready.push_back(target);
                }
            }
        }

        (order.len() == n).then_some(order)
    }

    /// Nodes reachable from any of `roots`
    fn reachable_from(&self, roots: impl IntoIterator<Item = usize>) -> Vec<bool> {
        let mut reachable = vec![false; self.len()];
        let mut to_visit: Vec<usize> = roots.into_iter().collect();
        while let Some(node) = to_visit.pop() {
            if !reachable[node] {
                reachable[node] = true;
                to_visit.extend(self.adjacency[node].iter().copied().filter(|&n| !reachable[n]));
            }
        }
        reachable
    }
}

impl Workflow {
    /// New draft workflow seeded with the canvas start node
    pub fn new<N: Into<String>, D: Into<String>>(name: N, description: D) -> Self {
        WorkflowDraft::new(name, description).into_workflow()
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&WorkflowEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    /// Edges leaving `node_id`
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a WorkflowEdge> + 'a {
        self.edges.iter().filter(move |edge| edge.source == node_id)
    }

    /// Edges arriving at `node_id`
    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a WorkflowEdge> + 'a {
        self.edges.iter().filter(move |edge| edge.target == node_id)
    }

    /// Distinct agent ids referenced by nodes, in node order
    pub fn agent_references(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.nodes
            .iter()
            .filter_map(WorkflowNode::agent_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn has_cycle(&self) -> bool {
        !GraphIndex::build(self).cyclic_components().is_empty()
    }

    /// Node ids in dependency order, or `None` if the graph has a cycle
    pub fn topological_order(&self) -> Option<Vec<&str>> {
        let index = GraphIndex::build(self);
        index
            .topological_order()
            .map(|order| order.into_iter().map(|i| index.ids[i]).collect())
    }

    /// Structural checks only: ids, edge endpoints, cycles, reachability
    pub fn validate_structure(&self) -> ValidationReport {
        let mut issues = Vec::new();

        // Node ids must be unique
        let mut node_ids = HashSet::new();
        let mut reported = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) && reported.insert(node.id.as_str()) {
                issues.push(GraphIssue::DuplicateNodeId {
                    node_id: node.id.clone(),
                });
            }
        }

        // Edge ids must be unique and both endpoints must exist
        let mut edge_ids = HashSet::new();
        let mut reported = HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) && reported.insert(edge.id.as_str()) {
                issues.push(GraphIssue::DuplicateEdgeId {
                    edge_id: edge.id.clone(),
                });
            }
            if !node_ids.contains(edge.source.as_str()) {
                issues.push(GraphIssue::DanglingEdgeSource {
                    edge_id: edge.id.clone(),
                    node_id: edge.source.clone(),
                });
            }
            if !node_ids.contains(edge.target.as_str()) {
                issues.push(GraphIssue::DanglingEdgeTarget {
                    edge_id: edge.id.clone(),
                    node_id: edge.target.clone(),
                });
            }
        }

        let index = GraphIndex::build(self);

        for component in index.cyclic_components() {
            issues.push(GraphIssue::Cycle {
                node_ids: component.iter().map(|&i| index.ids[i].to_string()).collect(),
            });
        }

        let inputs: Vec<usize> = self
            .nodes
            .iter()
            .filter(|node| node.node_type == NodeType::Input)
            .filter_map(|node| index.ids.iter().position(|id| *id == node.id))
            .collect();
        if !inputs.is_empty() {
            let reachable = index.reachable_from(inputs);
            for (i, id) in index.ids.iter().enumerate() {
                if !reachable[i] {
                    issues.push(GraphIssue::UnreachableNode {
                        node_id: id.to_string(),
                    });
                }
            }
        }

        ValidationReport { issues }
    }

    /// Full validation, including resolution of agent references
    pub fn validate(&self, agents: &dyn AgentLookup) -> ValidationReport {
        let mut report = self.validate_structure();
        for node in &self.nodes {
            if let Some(AgentRef::Dangling(agent_id)) = node.resolve_agent(agents) {
                report.issues.push(GraphIssue::DanglingAgentReference {
                    node_id: node.id.clone(),
                    agent_id: agent_id.to_string(),
                });
            }
        }
        report
    }

    /// Fail with [`OrchestratorError::InvalidGraph`] unless the graph is executable
    pub fn ensure_executable(&self) -> Result<()> {
        self.validate_structure().into_result()
    }

    /// Agent-bound nodes in the order an engine would visit them
    ///
    /// Uses dependency order when the graph is acyclic and declaration order
    /// otherwise. Nodes whose agent is gone stay in the plan as
    /// [`AgentRef::Dangling`] so the caller decides how to degrade.
    pub fn execution_plan<'a>(&'a self, agents: &'a dyn AgentLookup) -> Vec<ExecutionStep<'a>> {
        let ordered: Vec<&WorkflowNode> = match self.topological_order() {
            Some(order) => order.into_iter().filter_map(|id| self.node(id)).collect(),
            None => self.nodes.iter().collect(),
        };

        ordered
            .into_iter()
            .filter_map(|node| {
                node.resolve_agent(agents).map(|agent| ExecutionStep {
                    node_id: &node.id,
                    label: &node.data.label,
                    agent,
                })
            })
            .collect()
    }
}
