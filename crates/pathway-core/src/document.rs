//! # Graph Document
//!
//! The in-memory workflow being authored: nodes keyed by id, an edge list
//! and the designated entry node.
//!
//! Every mutation is pure. It takes `&self`, returns a new document, and on
//! error leaves the caller holding the unchanged original. Structural
//! invariants are only partially enforced here (ids, node kinds, outgoing
//! limits); whole-graph properties such as reachability are the validator's
//! job, because an author passes through incomplete states while editing.

use crate::node::{Edge, Node, NodeKind};
use crate::primitives::{
    DEFAULT_ENTRY_LABEL, DEFAULT_EXIT_LABEL, EDGE_ID_PREFIX, ENTRY_ID_PREFIX, EXIT_ID_PREFIX,
    MAX_ID_LENGTH,
};
use crate::registry::{NodeRegistry, NodeType, OutgoingRule};
use crate::{BranchLabel, EdgeId, NodeId, PathwayError, Position};
use std::collections::BTreeMap;

/// A learning workflow graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphDocument {
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    entry_node_id: NodeId,
}

impl Default for GraphDocument {
    fn default() -> Self {
        Self::create_empty()
    }
}

impl GraphDocument {
    /// A fresh document: one Entry node, one Exit node, no edges.
    #[must_use]
    pub fn create_empty() -> Self {
        let entry_id = NodeId::new(format!("{}-1", ENTRY_ID_PREFIX));
        let exit_id = NodeId::new(format!("{}-1", EXIT_ID_PREFIX));

        let mut nodes = BTreeMap::new();
        nodes.insert(
            entry_id.clone(),
            Node::entry(entry_id.clone(), DEFAULT_ENTRY_LABEL, Position::new(250.0, 50.0)),
        );
        nodes.insert(
            exit_id.clone(),
            Node::exit(exit_id, DEFAULT_EXIT_LABEL, Position::new(250.0, 450.0)),
        );

        Self {
            nodes,
            edges: Vec::new(),
            entry_node_id: entry_id,
        }
    }

    /// Assemble a document from raw parts without any checks.
    ///
    /// The result may violate every structural rule; run the validator on it.
    #[must_use]
    pub fn from_parts(
        nodes: BTreeMap<NodeId, Node>,
        edges: Vec<Edge>,
        entry_node_id: NodeId,
    ) -> Self {
        Self {
            nodes,
            edges,
            entry_node_id,
        }
    }

    #[must_use]
    pub fn into_parts(self) -> (BTreeMap<NodeId, Node>, Vec<Edge>, NodeId) {
        (self.nodes, self.edges, self.entry_node_id)
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn entry_node_id(&self) -> &NodeId {
        &self.entry_node_id
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Edges leaving a node, in insertion order.
    pub fn outgoing<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    /// Nodes of one type, in id order.
    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .filter(move |n| n.node_type() == node_type)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // -------------------------------------------------------------------------
    // Id generation
    // -------------------------------------------------------------------------

    /// Smallest unused `<prefix>-<n>` node id, `n >= 1`.
    #[must_use]
    pub fn fresh_node_id(&self, prefix: &str) -> NodeId {
        let mut n: u64 = 1;
        loop {
            let candidate = NodeId::new(format!("{}-{}", prefix, n));
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
            n = n.saturating_add(1);
        }
    }

    /// Smallest unused `edge-<n>` edge id, `n >= 1`.
    #[must_use]
    pub fn fresh_edge_id(&self) -> EdgeId {
        let mut n: u64 = 1;
        loop {
            let candidate = EdgeId::new(format!("{}-{}", EDGE_ID_PREFIX, n));
            if self.edge(&candidate).is_none() {
                return candidate;
            }
            n = n.saturating_add(1);
        }
    }

    // -------------------------------------------------------------------------
    // Mutations (pure)
    // -------------------------------------------------------------------------

    /// Add a node.
    ///
    /// Fails with `InvalidId`, `DuplicateId`, `MultipleEntryPoints` or
    /// `InvalidKind`.
    pub fn add_node(&self, node: Node) -> Result<Self, PathwayError> {
        if node.id.as_str().is_empty() || node.id.as_str().len() > MAX_ID_LENGTH {
            return Err(PathwayError::InvalidId(node.id.0));
        }
        if self.nodes.contains_key(&node.id) {
            return Err(PathwayError::DuplicateId(node.id.0));
        }
        let is_entry = node.node_type() == NodeType::Entry;
        if is_entry && self.nodes_of_type(NodeType::Entry).next().is_some() {
            return Err(PathwayError::MultipleEntryPoints);
        }
        NodeRegistry::check_node(&node)?;

        let mut next = self.clone();
        if is_entry && !next.nodes.contains_key(&next.entry_node_id) {
            next.entry_node_id = node.id.clone();
        }
        next.nodes.insert(node.id.clone(), node);
        Ok(next)
    }

    /// Remove a node and every edge incident to it.
    pub fn remove_node(&self, id: &NodeId) -> Result<Self, PathwayError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| PathwayError::NodeNotFound(id.clone()))?;
        if id == &self.entry_node_id || node.node_type() == NodeType::Entry {
            return Err(PathwayError::CannotRemoveEntry(id.clone()));
        }

        let mut next = self.clone();
        next.nodes.remove(id);
        next.edges.retain(|e| &e.source != id && &e.target != id);
        Ok(next)
    }

    /// Replace a node's type-specific payload.
    ///
    /// A node never changes type: a payload of another type is `InvalidKind`.
    pub fn update_payload(&self, id: &NodeId, kind: NodeKind) -> Result<Self, PathwayError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| PathwayError::NodeNotFound(id.clone()))?;
        if node.node_type() != kind.node_type() {
            return Err(PathwayError::InvalidKind(format!(
                "cannot give {} payload to {} node '{}'",
                kind.node_type(),
                node.node_type(),
                id
            )));
        }

        let mut updated = node.clone();
        updated.kind = kind;
        NodeRegistry::check_node(&updated)?;
        self.with_node_replaced(updated)
    }

    /// Replace a node's label.
    pub fn set_label(&self, id: &NodeId, label: impl Into<String>) -> Result<Self, PathwayError> {
        let mut updated = self
            .nodes
            .get(id)
            .cloned()
            .ok_or_else(|| PathwayError::NodeNotFound(id.clone()))?;
        updated.label = label.into();
        NodeRegistry::check_node(&updated)?;
        self.with_node_replaced(updated)
    }

    /// Move a node on the canvas. Cosmetic only.
    pub fn move_node(&self, id: &NodeId, position: Position) -> Result<Self, PathwayError> {
        let mut updated = self
            .nodes
            .get(id)
            .cloned()
            .ok_or_else(|| PathwayError::NodeNotFound(id.clone()))?;
        updated.position = position;
        self.with_node_replaced(updated)
    }

    /// Connect `source` to `target`.
    ///
    /// - Entry/Exercise sources take no label; an existing outgoing edge is
    ///   replaced rather than joined by a second one.
    /// - Condition sources require a label, one edge per label.
    /// - Exit sources take no outgoing edges.
    pub fn connect(
        &self,
        source: &NodeId,
        target: &NodeId,
        label: Option<BranchLabel>,
    ) -> Result<Self, PathwayError> {
        let source_node = self
            .nodes
            .get(source)
            .ok_or_else(|| PathwayError::NodeNotFound(source.clone()))?;
        if !self.nodes.contains_key(target) {
            return Err(PathwayError::NodeNotFound(target.clone()));
        }

        let mut next = self.clone();
        match NodeRegistry::outgoing_rule(source_node.node_type()) {
            OutgoingRule::None => {
                return Err(PathwayError::OutgoingLimitExceeded(source.clone()));
            }
            OutgoingRule::Single => {
                if let Some(label) = label {
                    return Err(PathwayError::InvalidLabel(format!(
                        "{} node '{}' takes no branch label (got '{}')",
                        source_node.node_type(),
                        source,
                        label
                    )));
                }
                next.edges.retain(|e| &e.source != source);
            }
            OutgoingRule::Branches => {
                let Some(label) = label else {
                    return Err(PathwayError::InvalidLabel(format!(
                        "condition node '{}' requires a 'pass' or 'fail' label",
                        source
                    )));
                };
                let existing: Vec<&Edge> = self.outgoing(source).collect();
                if existing.len() >= OutgoingRule::Branches.max_edges() {
                    return Err(PathwayError::OutgoingLimitExceeded(source.clone()));
                }
                if existing.iter().any(|e| e.label == Some(label)) {
                    return Err(PathwayError::InvalidLabel(format!(
                        "condition node '{}' already has a '{}' edge",
                        source, label
                    )));
                }
            }
        }

        let edge_id = next.fresh_edge_id();
        next.edges.push(Edge::new(
            edge_id,
            source.clone(),
            label,
            target.clone(),
        ));
        Ok(next)
    }

    /// Remove a single edge.
    pub fn disconnect(&self, edge_id: &EdgeId) -> Result<Self, PathwayError> {
        if self.edge(edge_id).is_none() {
            return Err(PathwayError::EdgeNotFound(edge_id.clone()));
        }
        let mut next = self.clone();
        next.edges.retain(|e| &e.id != edge_id);
        Ok(next)
    }

    fn with_node_replaced(&self, node: Node) -> Result<Self, PathwayError> {
        let mut next = self.clone();
        next.nodes.insert(node.id.clone(), node);
        Ok(next)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ConditionPayload, ExercisePayload};
    use crate::registry::{ConditionKind, ExerciseKind};

    fn exercise(id: &str, kind: ExerciseKind) -> Node {
        Node::exercise(
            NodeId::new(id),
            "Exercise",
            Position::default(),
            ExercisePayload::new(kind),
        )
    }

    fn condition(id: &str) -> Node {
        Node::condition(
            NodeId::new(id),
            "Gate",
            Position::default(),
            ConditionPayload::new("score >= 70", ConditionKind::ScoreThreshold),
        )
    }

    #[test]
    fn create_empty_has_entry_and_exit() {
        let doc = GraphDocument::create_empty();
        assert_eq!(doc.node_count(), 2);
        assert_eq!(doc.edge_count(), 0);
        assert_eq!(doc.entry_node_id(), &NodeId::new("entry-1"));
        assert_eq!(doc.nodes_of_type(NodeType::Entry).count(), 1);
        assert_eq!(doc.nodes_of_type(NodeType::Exit).count(), 1);
    }

    #[test]
    fn add_node_rejects_duplicate_id() {
        let doc = GraphDocument::create_empty();
        let result = doc.add_node(Node::exit(NodeId::new("exit-1"), "Again", Position::default()));
        assert!(matches!(result, Err(PathwayError::DuplicateId(_))));
    }

    #[test]
    fn add_node_rejects_second_entry() {
        let doc = GraphDocument::create_empty();
        let result = doc.add_node(Node::entry(NodeId::new("entry-2"), "Other", Position::default()));
        assert!(matches!(result, Err(PathwayError::MultipleEntryPoints)));
    }

    #[test]
    fn add_node_rejects_empty_id() {
        let doc = GraphDocument::create_empty();
        let result = doc.add_node(Node::exit(NodeId::new(""), "End", Position::default()));
        assert!(matches!(result, Err(PathwayError::InvalidId(_))));
    }

    #[test]
    fn add_node_is_pure() {
        let doc = GraphDocument::create_empty();
        let next = doc
            .add_node(exercise("exercise-1", ExerciseKind::Listening))
            .expect("add");
        assert_eq!(doc.node_count(), 2);
        assert_eq!(next.node_count(), 3);
    }

    #[test]
    fn remove_entry_fails() {
        let doc = GraphDocument::create_empty();
        let result = doc.remove_node(&NodeId::new("entry-1"));
        assert!(matches!(result, Err(PathwayError::CannotRemoveEntry(_))));
    }

    #[test]
    fn remove_missing_node_fails() {
        let doc = GraphDocument::create_empty();
        let result = doc.remove_node(&NodeId::new("ghost"));
        assert!(matches!(result, Err(PathwayError::NodeNotFound(_))));
    }

    #[test]
    fn remove_node_drops_incident_edges() {
        let entry = NodeId::new("entry-1");
        let exit = NodeId::new("exit-1");
        let ex = NodeId::new("exercise-1");
        let doc = GraphDocument::create_empty()
            .add_node(exercise("exercise-1", ExerciseKind::Grammar))
            .and_then(|d| d.connect(&entry, &ex, None))
            .and_then(|d| d.connect(&ex, &exit, None))
            .expect("build");
        assert_eq!(doc.edge_count(), 2);

        let removed = doc.remove_node(&ex).expect("remove");
        assert_eq!(removed.edge_count(), 0);
        assert!(!removed.contains_node(&ex));
    }

    #[test]
    fn update_payload_replaces_payload() {
        let id = NodeId::new("exercise-1");
        let doc = GraphDocument::create_empty()
            .add_node(exercise("exercise-1", ExerciseKind::Listening))
            .expect("add");
        let updated = doc
            .update_payload(
                &id,
                NodeKind::Exercise(ExercisePayload::new(ExerciseKind::Writing)),
            )
            .expect("update");
        let node = updated.node(&id).expect("node");
        assert!(matches!(
            &node.kind,
            NodeKind::Exercise(p) if p.exercise_kind == ExerciseKind::Writing
        ));
    }

    #[test]
    fn update_payload_rejects_type_change() {
        let id = NodeId::new("exercise-1");
        let doc = GraphDocument::create_empty()
            .add_node(exercise("exercise-1", ExerciseKind::Listening))
            .expect("add");
        let result = doc.update_payload(
            &id,
            NodeKind::Condition(ConditionPayload::new("x", ConditionKind::CustomLogic)),
        );
        assert!(matches!(result, Err(PathwayError::InvalidKind(_))));
    }

    #[test]
    fn update_payload_missing_node() {
        let doc = GraphDocument::create_empty();
        let result = doc.update_payload(&NodeId::new("nope"), NodeKind::Exit);
        assert!(matches!(result, Err(PathwayError::NodeNotFound(_))));
    }

    #[test]
    fn connect_missing_endpoint() {
        let doc = GraphDocument::create_empty();
        let result = doc.connect(&NodeId::new("entry-1"), &NodeId::new("ghost"), None);
        assert!(matches!(result, Err(PathwayError::NodeNotFound(_))));
    }

    #[test]
    fn connect_label_on_plain_source_fails() {
        let doc = GraphDocument::create_empty();
        let result = doc.connect(
            &NodeId::new("entry-1"),
            &NodeId::new("exit-1"),
            Some(BranchLabel::Pass),
        );
        assert!(matches!(result, Err(PathwayError::InvalidLabel(_))));
    }

    #[test]
    fn connect_from_exit_fails() {
        let doc = GraphDocument::create_empty();
        let result = doc.connect(&NodeId::new("exit-1"), &NodeId::new("entry-1"), None);
        assert!(matches!(result, Err(PathwayError::OutgoingLimitExceeded(_))));
    }

    #[test]
    fn connect_replaces_single_outgoing_edge() {
        let entry = NodeId::new("entry-1");
        let exit = NodeId::new("exit-1");
        let ex = NodeId::new("exercise-1");
        let doc = GraphDocument::create_empty()
            .add_node(exercise("exercise-1", ExerciseKind::Matching))
            .and_then(|d| d.connect(&entry, &exit, None))
            .and_then(|d| d.connect(&entry, &ex, None))
            .expect("build");

        let outgoing: Vec<&Edge> = doc.outgoing(&entry).collect();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].target, ex);
    }

    #[test]
    fn condition_requires_label() {
        let gate = NodeId::new("condition-1");
        let doc = GraphDocument::create_empty()
            .add_node(condition("condition-1"))
            .expect("add");
        let result = doc.connect(&gate, &NodeId::new("exit-1"), None);
        assert!(matches!(result, Err(PathwayError::InvalidLabel(_))));
    }

    #[test]
    fn condition_rejects_duplicate_label() {
        let gate = NodeId::new("condition-1");
        let exit = NodeId::new("exit-1");
        let doc = GraphDocument::create_empty()
            .add_node(condition("condition-1"))
            .and_then(|d| d.connect(&gate, &exit, Some(BranchLabel::Pass)))
            .expect("build");
        let result = doc.connect(&gate, &exit, Some(BranchLabel::Pass));
        assert!(matches!(result, Err(PathwayError::InvalidLabel(_))));
    }

    #[test]
    fn condition_rejects_third_edge() {
        let gate = NodeId::new("condition-1");
        let exit = NodeId::new("exit-1");
        let doc = GraphDocument::create_empty()
            .add_node(condition("condition-1"))
            .and_then(|d| d.connect(&gate, &exit, Some(BranchLabel::Pass)))
            .and_then(|d| d.connect(&gate, &exit, Some(BranchLabel::Fail)))
            .expect("build");
        let result = doc.connect(&gate, &exit, Some(BranchLabel::Fail));
        assert!(matches!(result, Err(PathwayError::OutgoingLimitExceeded(_))));
    }

    #[test]
    fn disconnect_removes_edge() {
        let doc = GraphDocument::create_empty()
            .connect(&NodeId::new("entry-1"), &NodeId::new("exit-1"), None)
            .expect("connect");
        let edge_id = doc.edges()[0].id.clone();
        let next = doc.disconnect(&edge_id).expect("disconnect");
        assert_eq!(next.edge_count(), 0);
        assert!(matches!(
            next.disconnect(&edge_id),
            Err(PathwayError::EdgeNotFound(_))
        ));
    }

    #[test]
    fn fresh_ids_skip_taken() {
        let doc = GraphDocument::create_empty();
        assert_eq!(doc.fresh_node_id("exit"), NodeId::new("exit-2"));
        assert_eq!(doc.fresh_node_id("exercise"), NodeId::new("exercise-1"));
        assert_eq!(doc.fresh_edge_id(), EdgeId::new("edge-1"));
    }

    #[test]
    fn set_label_and_move() {
        let id = NodeId::new("exit-1");
        let doc = GraphDocument::create_empty()
            .set_label(&id, "Finish")
            .and_then(|d| d.move_node(&id, Position::new(1.5, -2.0)))
            .expect("edit");
        let node = doc.node(&id).expect("node");
        assert_eq!(node.label, "Finish");
        assert_eq!(node.position, Position::new(1.5, -2.0));
    }
}
