//! # Node Registry
//!
//! The closed set of node kinds and the shape of each kind's payload.
//!
//! Document edits, the validator and the deserializer all ask the registry
//! instead of matching on string tags themselves, so a new exercise kind is
//! added here and nowhere else.

use crate::node::{Node, NodeKind};
use crate::primitives::{MAX_EXPRESSION_LENGTH, MAX_LABEL_LENGTH};
use crate::PathwayError;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// DATA FIELD NAMES
// =============================================================================

/// Display label, common to every node kind.
pub const FIELD_LABEL: &str = "label";
/// Exercise kind tag inside an exercise payload.
pub const FIELD_EXERCISE_KIND: &str = "exerciseKind";
/// Free-form exercise configuration.
pub const FIELD_SETTINGS: &str = "settings";
/// Scoring expression of a condition.
pub const FIELD_EXPRESSION: &str = "expression";
/// Condition kind tag inside a condition payload.
pub const FIELD_CONDITION_KIND: &str = "conditionKind";

// =============================================================================
// NODE TYPE
// =============================================================================

/// The four node variants of a workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Entry,
    Exit,
    Exercise,
    Condition,
}

impl NodeType {
    pub const ALL: [NodeType; 4] = [
        NodeType::Entry,
        NodeType::Exit,
        NodeType::Exercise,
        NodeType::Condition,
    ];

    /// Wire name used in the `type` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
            Self::Exercise => "exercise",
            Self::Condition => "condition",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, PathwayError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == raw)
            .ok_or_else(|| PathwayError::UnknownKind(raw.to_string()))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EXERCISE KIND
// =============================================================================

/// Learner-facing activity carried by an Exercise node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    Storytelling,
    Listening,
    Matching,
    Conversation,
    Writing,
    Grammar,
    Cultural,
    RemedialBasic,
    RemedialAdvanced,
    PhaseRemedial,
    AssessmentCheckpoint,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 11] = [
        ExerciseKind::Storytelling,
        ExerciseKind::Listening,
        ExerciseKind::Matching,
        ExerciseKind::Conversation,
        ExerciseKind::Writing,
        ExerciseKind::Grammar,
        ExerciseKind::Cultural,
        ExerciseKind::RemedialBasic,
        ExerciseKind::RemedialAdvanced,
        ExerciseKind::PhaseRemedial,
        ExerciseKind::AssessmentCheckpoint,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Storytelling => "storytelling",
            Self::Listening => "listening",
            Self::Matching => "matching",
            Self::Conversation => "conversation",
            Self::Writing => "writing",
            Self::Grammar => "grammar",
            Self::Cultural => "cultural",
            Self::RemedialBasic => "remedial-basic",
            Self::RemedialAdvanced => "remedial-advanced",
            Self::PhaseRemedial => "phase-remedial",
            Self::AssessmentCheckpoint => "assessment-checkpoint",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, PathwayError> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == raw)
            .ok_or_else(|| PathwayError::UnknownKind(format!("exercise kind '{}'", raw)))
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONDITION KIND
// =============================================================================

/// What a Condition node measures when the runtime evaluates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionKind {
    ScoreThreshold,
    AttemptLimit,
    TimeLimit,
    AccuracyCheck,
    CustomLogic,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 5] = [
        ConditionKind::ScoreThreshold,
        ConditionKind::AttemptLimit,
        ConditionKind::TimeLimit,
        ConditionKind::AccuracyCheck,
        ConditionKind::CustomLogic,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ScoreThreshold => "score-threshold",
            Self::AttemptLimit => "attempt-limit",
            Self::TimeLimit => "time-limit",
            Self::AccuracyCheck => "accuracy-check",
            Self::CustomLogic => "custom-logic",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, PathwayError> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == raw)
            .ok_or_else(|| PathwayError::UnknownKind(format!("condition kind '{}'", raw)))
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PAYLOAD SHAPES
// =============================================================================

/// Type of a recognized `data` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    ExerciseKind,
    ConditionKind,
    Object,
}

/// One recognized field of a node's `data` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

impl FieldSpec {
    const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
        }
    }
}

/// The recognized `data` fields for one node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadShape {
    pub node_type: NodeType,
    pub fields: Vec<FieldSpec>,
}

impl PayloadShape {
    /// Whether this shape recognizes a field by name.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

/// How many outgoing edges a node type takes, and whether they are labeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutgoingRule {
    /// Terminal node: no outgoing edges at all.
    None,
    /// At most one unlabeled edge; one is required to be wired.
    Single,
    /// Exactly one edge per `BranchLabel`.
    Branches,
}

impl OutgoingRule {
    /// Maximum number of outgoing edges permitted.
    #[must_use]
    pub const fn max_edges(self) -> usize {
        match self {
            Self::None => 0,
            Self::Single => 1,
            Self::Branches => 2,
        }
    }

    /// Whether edges under this rule carry a branch label.
    #[must_use]
    pub const fn is_labeled(self) -> bool {
        matches!(self, Self::Branches)
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Single source of truth for node kinds and payload shapes.
pub struct NodeRegistry;

impl NodeRegistry {
    /// Describe the payload of a node kind.
    ///
    /// Accepts a node type name (`"exercise"`) or a specific exercise or
    /// condition kind (`"listening"`, `"score-threshold"`), which resolves to
    /// the shape of its node type.
    pub fn describe(kind: &str) -> Result<PayloadShape, PathwayError> {
        if let Ok(node_type) = NodeType::parse(kind) {
            return Ok(Self::shape_of(node_type));
        }
        if Self::is_known_exercise_kind(kind) {
            return Ok(Self::shape_of(NodeType::Exercise));
        }
        if Self::is_known_condition_kind(kind) {
            return Ok(Self::shape_of(NodeType::Condition));
        }
        Err(PathwayError::UnknownKind(kind.to_string()))
    }

    /// Payload shape of a node type.
    #[must_use]
    pub fn shape_of(node_type: NodeType) -> PayloadShape {
        let mut fields = vec![FieldSpec::required(FIELD_LABEL, FieldType::Text)];
        match node_type {
            NodeType::Entry | NodeType::Exit => {}
            NodeType::Exercise => {
                fields.push(FieldSpec::required(
                    FIELD_EXERCISE_KIND,
                    FieldType::ExerciseKind,
                ));
                fields.push(FieldSpec::required(FIELD_SETTINGS, FieldType::Object));
            }
            NodeType::Condition => {
                fields.push(FieldSpec::required(FIELD_EXPRESSION, FieldType::Text));
                fields.push(FieldSpec::required(
                    FIELD_CONDITION_KIND,
                    FieldType::ConditionKind,
                ));
            }
        }
        PayloadShape { node_type, fields }
    }

    #[must_use]
    pub fn is_known_exercise_kind(kind: &str) -> bool {
        ExerciseKind::parse(kind).is_ok()
    }

    #[must_use]
    pub fn is_known_condition_kind(kind: &str) -> bool {
        ConditionKind::parse(kind).is_ok()
    }

    /// Outgoing-edge rule of a node type.
    #[must_use]
    pub const fn outgoing_rule(node_type: NodeType) -> OutgoingRule {
        match node_type {
            NodeType::Exit => OutgoingRule::None,
            NodeType::Entry | NodeType::Exercise => OutgoingRule::Single,
            NodeType::Condition => OutgoingRule::Branches,
        }
    }

    /// Check that a node's payload is a shape this registry recognizes.
    ///
    /// Extra `data` keys are allowed and preserved, but they may not shadow
    /// a field of the node's own type: such a node would serialize
    /// ambiguously. Field names of other node types are plain extras.
    pub fn check_node(node: &Node) -> Result<(), PathwayError> {
        if node.label.len() > MAX_LABEL_LENGTH {
            return Err(PathwayError::InvalidKind(format!(
                "label of node '{}' exceeds {} bytes",
                node.id, MAX_LABEL_LENGTH
            )));
        }
        if let NodeKind::Condition(payload) = &node.kind
            && payload.expression.len() > MAX_EXPRESSION_LENGTH
        {
            return Err(PathwayError::InvalidKind(format!(
                "expression of node '{}' exceeds {} bytes",
                node.id, MAX_EXPRESSION_LENGTH
            )));
        }

        let shape = Self::shape_of(node.node_type());
        if let Some(key) = node.extra.keys().find(|k| shape.has_field(k.as_str())) {
            return Err(PathwayError::InvalidKind(format!(
                "{} node '{}' carries reserved field '{}'",
                node.node_type(),
                node.id,
                key
            )));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ConditionPayload;
    use crate::{NodeId, Position};

    #[test]
    fn describe_node_types() {
        let shape = NodeRegistry::describe("exercise").expect("describe");
        assert_eq!(shape.node_type, NodeType::Exercise);
        assert!(shape.has_field(FIELD_EXERCISE_KIND));
        assert!(shape.has_field(FIELD_SETTINGS));

        let entry = NodeRegistry::describe("entry").expect("describe");
        assert_eq!(entry.fields.len(), 1);
        assert!(entry.has_field(FIELD_LABEL));
    }

    #[test]
    fn describe_specific_kinds_resolves_to_node_type() {
        let shape = NodeRegistry::describe("remedial-advanced").expect("describe");
        assert_eq!(shape.node_type, NodeType::Exercise);

        let shape = NodeRegistry::describe("accuracy-check").expect("describe");
        assert_eq!(shape.node_type, NodeType::Condition);
    }

    #[test]
    fn describe_unknown_kind_fails() {
        assert!(matches!(
            NodeRegistry::describe("karaoke"),
            Err(PathwayError::UnknownKind(_))
        ));
    }

    #[test]
    fn known_kinds() {
        assert!(NodeRegistry::is_known_exercise_kind("phase-remedial"));
        assert!(!NodeRegistry::is_known_exercise_kind("score-threshold"));
        assert!(NodeRegistry::is_known_condition_kind("custom-logic"));
        assert!(!NodeRegistry::is_known_condition_kind("listening"));
    }

    #[test]
    fn wire_names_match_serde() {
        for kind in ExerciseKind::ALL {
            let json = serde_json::to_value(kind).expect("serialize");
            assert_eq!(json.as_str(), Some(kind.as_str()));
        }
        for kind in ConditionKind::ALL {
            let json = serde_json::to_value(kind).expect("serialize");
            assert_eq!(json.as_str(), Some(kind.as_str()));
        }
    }

    #[test]
    fn outgoing_rules() {
        assert_eq!(NodeRegistry::outgoing_rule(NodeType::Exit).max_edges(), 0);
        assert_eq!(NodeRegistry::outgoing_rule(NodeType::Entry).max_edges(), 1);
        assert_eq!(NodeRegistry::outgoing_rule(NodeType::Exercise).max_edges(), 1);
        assert!(NodeRegistry::outgoing_rule(NodeType::Condition).is_labeled());
    }

    #[test]
    fn check_node_rejects_shadowed_field() {
        let mut node = Node::entry(NodeId::new("entry-1"), "Start", Position::default());
        node.extra
            .insert(FIELD_LABEL.to_string(), serde_json::json!("Again"));
        assert!(matches!(
            NodeRegistry::check_node(&node),
            Err(PathwayError::InvalidKind(_))
        ));

        let mut gate = Node::new(
            NodeId::new("condition-1"),
            "Gate",
            Position::default(),
            NodeKind::Condition(ConditionPayload::new(
                "score >= 70",
                ConditionKind::ScoreThreshold,
            )),
        );
        gate.extra
            .insert(FIELD_EXPRESSION.to_string(), serde_json::json!("score >= 50"));
        assert!(matches!(
            NodeRegistry::check_node(&gate),
            Err(PathwayError::InvalidKind(_))
        ));
    }

    #[test]
    fn check_node_accepts_fields_of_other_types() {
        let mut exit = Node::exit(NodeId::new("exit-1"), "End", Position::default());
        exit.extra
            .insert(FIELD_SETTINGS.to_string(), serde_json::json!({}));
        exit.extra
            .insert(FIELD_EXERCISE_KIND.to_string(), serde_json::json!("listening"));
        assert!(NodeRegistry::check_node(&exit).is_ok());

        let mut entry = Node::entry(NodeId::new("entry-1"), "Start", Position::default());
        entry
            .extra
            .insert(FIELD_CONDITION_KIND.to_string(), serde_json::json!("custom"));
        assert!(NodeRegistry::check_node(&entry).is_ok());
    }

    #[test]
    fn check_node_accepts_unknown_extras() {
        let mut node = Node::new(
            NodeId::new("condition-1"),
            "Gate",
            Position::default(),
            NodeKind::Condition(ConditionPayload::new(
                "score >= 70",
                ConditionKind::ScoreThreshold,
            )),
        );
        node.extra
            .insert("color".to_string(), serde_json::json!("#ffaa00"));
        assert!(NodeRegistry::check_node(&node).is_ok());
    }
}
