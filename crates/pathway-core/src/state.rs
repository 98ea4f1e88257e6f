//! # Derived Node States
//!
//! Presentation state of each node during editing:
//! `Unconfigured -> Configured -> Wired -> Valid`.
//!
//! Nothing here is stored. States are recomputed from payload presence,
//! outgoing edges and the validator's traversal on every call.

use crate::document::GraphDocument;
use crate::node::{Edge, Node, NodeKind};
use crate::registry::{NodeRegistry, OutgoingRule};
use crate::validator::{OutgoingIndex, validate};
use crate::{BranchLabel, NodeId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Editing state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    /// Label or required payload text is blank.
    Unconfigured,
    /// Payload supplied, required outgoing edges missing.
    Configured,
    /// Required outgoing edges present.
    Wired,
    /// Wired, reachable from the entry node, and cited by no issue.
    Valid,
}

impl NodeState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Configured => "configured",
            Self::Wired => "wired",
            Self::Valid => "valid",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the state of every node.
#[must_use]
pub fn node_states(doc: &GraphDocument) -> BTreeMap<NodeId, NodeState> {
    let index = OutgoingIndex::build(doc);
    let reachable = index.reachable_from(doc, doc.entry_node_id());
    let validation = validate(doc);
    let cited: BTreeSet<&NodeId> = validation
        .issues()
        .iter()
        .flat_map(|issue| issue.node_ids.iter())
        .collect();

    doc.nodes()
        .map(|node| {
            let state = if !is_configured(node) {
                NodeState::Unconfigured
            } else if !is_wired(index.of(&node.id), node) {
                NodeState::Configured
            } else if !reachable.contains(&node.id) || cited.contains(&node.id) {
                NodeState::Wired
            } else {
                NodeState::Valid
            };
            (node.id.clone(), state)
        })
        .collect()
}

fn is_configured(node: &Node) -> bool {
    if node.label.trim().is_empty() {
        return false;
    }
    match &node.kind {
        NodeKind::Condition(payload) => !payload.expression.trim().is_empty(),
        NodeKind::Entry | NodeKind::Exit | NodeKind::Exercise(_) => true,
    }
}

fn is_wired(outgoing: &[&Edge], node: &Node) -> bool {
    match NodeRegistry::outgoing_rule(node.node_type()) {
        OutgoingRule::None => true,
        OutgoingRule::Single => outgoing.len() == 1,
        OutgoingRule::Branches => BranchLabel::ALL
            .into_iter()
            .all(|label| outgoing.iter().any(|e| e.label == Some(label))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::Editor;
    use crate::Position;

    #[test]
    fn states_progress_with_edits() {
        let doc = GraphDocument::create_empty();
        let entry = doc.entry_node_id().clone();
        let exit = NodeId::new("exit-1");
        let (doc, gate) =
            Editor::insert_condition_node(&doc, "accuracy-check", "", "Gate", Position::default())
                .expect("insert");

        let states = node_states(&doc);
        assert_eq!(states[&gate], NodeState::Unconfigured);
        assert_eq!(states[&entry], NodeState::Configured);

        let doc = Editor::configure_condition(&doc, &gate, "accuracy-check", "accuracy >= 0.8")
            .and_then(|d| Editor::wire(&d, &entry, &gate, None))
            .and_then(|d| Editor::wire(&d, &gate, &exit, Some("pass")))
            .expect("edit");
        let states = node_states(&doc);
        assert_eq!(states[&gate], NodeState::Configured);
        assert_eq!(states[&entry], NodeState::Valid);

        let doc = Editor::wire(&doc, &gate, &exit, Some("fail")).expect("wire");
        let states = node_states(&doc);
        assert!(states.values().all(|s| *s == NodeState::Valid));
    }

    #[test]
    fn unreachable_wired_node_is_not_valid() {
        let doc = GraphDocument::create_empty();
        let (doc, orphan) =
            Editor::insert_exercise_node(&doc, "matching", "Pairs", Position::default())
                .expect("insert");
        let doc = Editor::wire(&doc, &orphan, &NodeId::new("exit-1"), None).expect("wire");
        assert_eq!(node_states(&doc)[&orphan], NodeState::Wired);
    }
}
