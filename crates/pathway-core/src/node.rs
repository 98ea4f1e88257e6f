//! # Nodes and Edges
//!
//! A node is a tagged union over the four node types. Each node also carries
//! a label, a cosmetic position and any `data` keys this model does not
//! interpret, which are preserved verbatim for forward compatibility.

use crate::registry::{ConditionKind, ExerciseKind, NodeType};
use crate::{BranchLabel, EdgeId, NodeId, Position};
use serde_json::{Map, Value};

/// Free-form string-keyed JSON object.
pub type JsonMap = Map<String, Value>;

// =============================================================================
// PAYLOADS
// =============================================================================

/// Payload of an Exercise node.
#[derive(Debug, Clone, PartialEq)]
pub struct ExercisePayload {
    pub exercise_kind: ExerciseKind,
    /// Exercise-specific configuration. Not interpreted by the model.
    pub settings: JsonMap,
}

impl ExercisePayload {
    #[must_use]
    pub fn new(exercise_kind: ExerciseKind) -> Self {
        Self {
            exercise_kind,
            settings: JsonMap::new(),
        }
    }

    #[must_use]
    pub fn with_settings(exercise_kind: ExerciseKind, settings: JsonMap) -> Self {
        Self {
            exercise_kind,
            settings,
        }
    }
}

/// Payload of a Condition node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionPayload {
    /// Scoring expression such as `score >= 70`, evaluated by the runtime.
    pub expression: String,
    pub condition_kind: ConditionKind,
}

impl ConditionPayload {
    #[must_use]
    pub fn new(expression: impl Into<String>, condition_kind: ConditionKind) -> Self {
        Self {
            expression: expression.into(),
            condition_kind,
        }
    }
}

/// Type-specific part of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Entry,
    Exit,
    Exercise(ExercisePayload),
    Condition(ConditionPayload),
}

impl NodeKind {
    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        match self {
            Self::Entry => NodeType::Entry,
            Self::Exit => NodeType::Exit,
            Self::Exercise(_) => NodeType::Exercise,
            Self::Condition(_) => NodeType::Condition,
        }
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A node of a workflow graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    pub label: String,
    pub kind: NodeKind,
    /// `data` keys not recognized by the registry, in their original order.
    pub extra: JsonMap,
}

impl Node {
    #[must_use]
    pub fn new(id: NodeId, label: impl Into<String>, position: Position, kind: NodeKind) -> Self {
        Self {
            id,
            position,
            label: label.into(),
            kind,
            extra: JsonMap::new(),
        }
    }

    #[must_use]
    pub fn entry(id: NodeId, label: impl Into<String>, position: Position) -> Self {
        Self::new(id, label, position, NodeKind::Entry)
    }

    #[must_use]
    pub fn exit(id: NodeId, label: impl Into<String>, position: Position) -> Self {
        Self::new(id, label, position, NodeKind::Exit)
    }

    #[must_use]
    pub fn exercise(
        id: NodeId,
        label: impl Into<String>,
        position: Position,
        payload: ExercisePayload,
    ) -> Self {
        Self::new(id, label, position, NodeKind::Exercise(payload))
    }

    #[must_use]
    pub fn condition(
        id: NodeId,
        label: impl Into<String>,
        position: Position,
        payload: ConditionPayload,
    ) -> Self {
        Self::new(id, label, position, NodeKind::Condition(payload))
    }

    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// A directed edge between two nodes.
///
/// `label` is `None` for edges leaving Entry and Exercise nodes and is the
/// branch taken for edges leaving a Condition node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub label: Option<BranchLabel>,
    pub target: NodeId,
}

impl Edge {
    #[must_use]
    pub fn new(id: EdgeId, source: NodeId, label: Option<BranchLabel>, target: NodeId) -> Self {
        Self {
            id,
            source,
            label,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_follows_kind() {
        let node = Node::exercise(
            NodeId::new("exercise-1"),
            "Listen",
            Position::new(10.0, 20.0),
            ExercisePayload::new(ExerciseKind::Listening),
        );
        assert_eq!(node.node_type(), NodeType::Exercise);
        assert!(node.extra.is_empty());
    }
}
