//! # Edit Operations
//!
//! The user-facing editing actions of the workflow designer, composed from
//! `GraphDocument` primitives.
//!
//! This layer adds no invariants of its own. It resolves raw strings coming
//! from a UI or CLI through the registry, generates fresh ids, and returns
//! whatever the document primitive returned.

use crate::document::GraphDocument;
use crate::node::{ConditionPayload, ExercisePayload, JsonMap, Node, NodeKind};
use crate::primitives::{CONDITION_ID_PREFIX, EXERCISE_ID_PREFIX, EXIT_ID_PREFIX};
use crate::registry::{ConditionKind, ExerciseKind};
use crate::{BranchLabel, EdgeId, NodeId, PathwayError, Position};

/// Composed editing actions.
pub struct Editor;

impl Editor {
    /// Insert an Exercise node under a fresh id.
    pub fn insert_exercise_node(
        doc: &GraphDocument,
        kind: &str,
        label: &str,
        position: Position,
    ) -> Result<(GraphDocument, NodeId), PathwayError> {
        let payload = ExercisePayload::new(resolve_exercise_kind(kind)?);
        let id = doc.fresh_node_id(EXERCISE_ID_PREFIX);
        let next = doc.add_node(Node::exercise(id.clone(), label, position, payload))?;
        Ok((next, id))
    }

    /// Insert a Condition node under a fresh id.
    pub fn insert_condition_node(
        doc: &GraphDocument,
        kind: &str,
        expression: &str,
        label: &str,
        position: Position,
    ) -> Result<(GraphDocument, NodeId), PathwayError> {
        let payload = ConditionPayload::new(expression, resolve_condition_kind(kind)?);
        let id = doc.fresh_node_id(CONDITION_ID_PREFIX);
        let next = doc.add_node(Node::condition(id.clone(), label, position, payload))?;
        Ok((next, id))
    }

    /// Insert an Exit node under a fresh id.
    pub fn insert_exit_node(
        doc: &GraphDocument,
        label: &str,
        position: Position,
    ) -> Result<(GraphDocument, NodeId), PathwayError> {
        let id = doc.fresh_node_id(EXIT_ID_PREFIX);
        let next = doc.add_node(Node::exit(id.clone(), label, position))?;
        Ok((next, id))
    }

    /// Wire two nodes together. `label` is the raw branch name, if any.
    pub fn wire(
        doc: &GraphDocument,
        from: &NodeId,
        to: &NodeId,
        label: Option<&str>,
    ) -> Result<GraphDocument, PathwayError> {
        let label = label.map(BranchLabel::parse).transpose()?;
        doc.connect(from, to, label)
    }

    /// Remove one edge.
    pub fn unwire(doc: &GraphDocument, edge: &EdgeId) -> Result<GraphDocument, PathwayError> {
        doc.disconnect(edge)
    }

    /// Retitle a node.
    pub fn retitle(
        doc: &GraphDocument,
        id: &NodeId,
        label: &str,
    ) -> Result<GraphDocument, PathwayError> {
        doc.set_label(id, label)
    }

    pub fn reposition(
        doc: &GraphDocument,
        id: &NodeId,
        position: Position,
    ) -> Result<GraphDocument, PathwayError> {
        doc.move_node(id, position)
    }

    /// Reconfigure an Exercise node: kind and settings.
    pub fn configure_exercise(
        doc: &GraphDocument,
        id: &NodeId,
        kind: &str,
        settings: JsonMap,
    ) -> Result<GraphDocument, PathwayError> {
        let payload = ExercisePayload::with_settings(resolve_exercise_kind(kind)?, settings);
        doc.update_payload(id, NodeKind::Exercise(payload))
    }

    /// Reconfigure a Condition node: kind and expression.
    pub fn configure_condition(
        doc: &GraphDocument,
        id: &NodeId,
        kind: &str,
        expression: &str,
    ) -> Result<GraphDocument, PathwayError> {
        let payload = ConditionPayload::new(expression, resolve_condition_kind(kind)?);
        doc.update_payload(id, NodeKind::Condition(payload))
    }

    /// Delete a node along with every edge touching it.
    pub fn delete_node(doc: &GraphDocument, id: &NodeId) -> Result<GraphDocument, PathwayError> {
        doc.remove_node(id)
    }
}

fn resolve_exercise_kind(raw: &str) -> Result<ExerciseKind, PathwayError> {
    ExerciseKind::parse(raw)
        .map_err(|_| PathwayError::InvalidKind(format!("unknown exercise kind '{}'", raw)))
}

fn resolve_condition_kind(raw: &str) -> Result<ConditionKind, PathwayError> {
    ConditionKind::parse(raw)
        .map_err(|_| PathwayError::InvalidKind(format!("unknown condition kind '{}'", raw)))
}

// =============================================================================
// TESTS
// =============================================================================
