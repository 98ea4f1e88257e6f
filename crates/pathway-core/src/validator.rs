//! # Graph Validator
//!
//! Structural checks over a `GraphDocument`.
//!
//! Every rule runs on every call; nothing short-circuits, so an author sees
//! the whole checklist at once. Problems are returned as data. A malformed
//! document (an edge naming a deleted node, a missing entry pointer) is
//! reported, never a reason to fail.
//!
//! Issue order is deterministic: rules in invariant order, nodes in id
//! order, edges in document order.

use crate::document::GraphDocument;
use crate::node::Edge;
use crate::registry::{NodeRegistry, NodeType, OutgoingRule};
use crate::{BranchLabel, EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

// =============================================================================
// RULES & ISSUES
// =============================================================================

/// The structural rule an issue reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rule {
    MissingEntryPoint,
    MultipleEntryPoints,
    EntryPointMismatch,
    DanglingReference,
    OutgoingLimitExceeded,
    InvalidBranchLabel,
    MissingBranch,
    DuplicateBranch,
    UnreachableNode,
    NoReachableExit,
}

impl Rule {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingEntryPoint => "MissingEntryPoint",
            Self::MultipleEntryPoints => "MultipleEntryPoints",
            Self::EntryPointMismatch => "EntryPointMismatch",
            Self::DanglingReference => "DanglingReference",
            Self::OutgoingLimitExceeded => "OutgoingLimitExceeded",
            Self::InvalidBranchLabel => "InvalidBranchLabel",
            Self::MissingBranch => "MissingBranch",
            Self::DuplicateBranch => "DuplicateBranch",
            Self::UnreachableNode => "UnreachableNode",
            Self::NoReachableExit => "NoReachableExit",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported structural defect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub rule_violated: Rule,
    pub node_ids: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edge_ids: Vec<EdgeId>,
    pub message: String,
}

impl ValidationIssue {
    fn new(rule: Rule, node_ids: Vec<NodeId>, message: String) -> Self {
        Self {
            rule_violated: rule,
            node_ids,
            edge_ids: Vec::new(),
            message,
        }
    }

    fn with_edges(mut self, edge_ids: Vec<EdgeId>) -> Self {
        self.edge_ids = edge_ids;
        self
    }
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    /// Non-empty, ordered.
    Invalid(Vec<ValidationIssue>),
}

impl ValidationResult {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        if issues.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(issues)
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Valid => &[],
            Self::Invalid(issues) => issues,
        }
    }

    #[must_use]
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        match self {
            Self::Valid => Vec::new(),
            Self::Invalid(issues) => issues,
        }
    }

    /// Whether any issue reports the given rule.
    #[must_use]
    pub fn violates(&self, rule: Rule) -> bool {
        self.issues().iter().any(|i| i.rule_violated == rule)
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Validate a document against every structural rule.
///
/// O((nodes + edges) log nodes): outgoing edges are indexed once and shared
/// by every rule.
#[must_use]
pub fn validate(doc: &GraphDocument) -> ValidationResult {
    let index = OutgoingIndex::build(doc);
    let mut issues = Vec::new();
    check_entry_point(doc, &mut issues);
    check_dangling_references(doc, &mut issues);
    check_outgoing_edges(doc, &index, &mut issues);

    let reachable = index.reachable_from(doc, doc.entry_node_id());
    check_reachability(doc, &reachable, &mut issues);
    check_reachable_exit(doc, &reachable, &mut issues);

    ValidationResult::from_issues(issues)
}

/// Every node reachable from `start` by following edges forward.
///
/// Breadth-first; edges whose target is missing are skipped. `start` is
/// included when it exists.
#[must_use]
pub fn reachable_from(doc: &GraphDocument, start: &NodeId) -> BTreeSet<NodeId> {
    OutgoingIndex::build(doc).reachable_from(doc, start)
}

// =============================================================================
// OUTGOING INDEX
// =============================================================================

/// Outgoing edges grouped by source node, in document order.
pub(crate) struct OutgoingIndex<'a> {
    by_source: BTreeMap<&'a NodeId, Vec<&'a Edge>>,
}

impl<'a> OutgoingIndex<'a> {
    pub(crate) fn build(doc: &'a GraphDocument) -> Self {
        let mut by_source: BTreeMap<&NodeId, Vec<&Edge>> = BTreeMap::new();
        for edge in doc.edges() {
            by_source.entry(&edge.source).or_default().push(edge);
        }
        Self { by_source }
    }

    /// Edges leaving `id`; empty for unknown ids.
    pub(crate) fn of(&self, id: &NodeId) -> &[&'a Edge] {
        self.by_source
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn reachable_from(&self, doc: &GraphDocument, start: &NodeId) -> BTreeSet<NodeId> {
        let mut visited = BTreeSet::new();
        if !doc.contains_node(start) {
            return visited;
        }

        let mut queue = VecDeque::new();
        visited.insert(start.clone());
        queue.push_back(start.clone());

        while let Some(current) = queue.pop_front() {
            for edge in self.of(&current) {
                if doc.contains_node(&edge.target) && visited.insert(edge.target.clone()) {
                    queue.push_back(edge.target.clone());
                }
            }
        }

        visited
    }
}

/// Invariant 1: exactly one Entry node, and the entry pointer names it.
fn check_entry_point(doc: &GraphDocument, issues: &mut Vec<ValidationIssue>) {
    let entries: Vec<NodeId> = doc
        .nodes_of_type(NodeType::Entry)
        .map(|n| n.id.clone())
        .collect();

    match entries.len() {
        0 => issues.push(ValidationIssue::new(
            Rule::MissingEntryPoint,
            Vec::new(),
            "The workflow has no entry node".to_string(),
        )),
        1 => {}
        n => issues.push(ValidationIssue::new(
            Rule::MultipleEntryPoints,
            entries.clone(),
            format!("The workflow has {} entry nodes; exactly one is allowed", n),
        )),
    }

    let pointer = doc.entry_node_id();
    let points_at_entry = doc
        .node(pointer)
        .is_some_and(|n| n.node_type() == NodeType::Entry);
    if !points_at_entry {
        issues.push(ValidationIssue::new(
            Rule::EntryPointMismatch,
            vec![pointer.clone()],
            format!("Entry pointer '{}' does not name an entry node", pointer),
        ));
    }
}

/// Invariant 2: every edge endpoint exists.
fn check_dangling_references(doc: &GraphDocument, issues: &mut Vec<ValidationIssue>) {
    for edge in doc.edges() {
        let missing: Vec<NodeId> = [&edge.source, &edge.target]
            .into_iter()
            .filter(|id| !doc.contains_node(id))
            .cloned()
            .collect();
        if missing.is_empty() {
            continue;
        }
        let names: Vec<&str> = missing.iter().map(NodeId::as_str).collect();
        issues.push(
            ValidationIssue::new(
                Rule::DanglingReference,
                missing.clone(),
                format!(
                    "Edge '{}' references missing node(s): {}",
                    edge.id,
                    names.join(", ")
                ),
            )
            .with_edges(vec![edge.id.clone()]),
        );
    }
}

/// Invariants 3, 4 and 7: outgoing edge counts and branch labels.
fn check_outgoing_edges(
    doc: &GraphDocument,
    index: &OutgoingIndex<'_>,
    issues: &mut Vec<ValidationIssue>,
) {
    for node in doc.nodes() {
        let outgoing = index.of(&node.id);
        let rule = NodeRegistry::outgoing_rule(node.node_type());

        // Labels must be present exactly when the rule is labeled.
        let mislabeled: Vec<EdgeId> = outgoing
            .iter()
            .filter(|e| e.label.is_some() != rule.is_labeled())
            .map(|e| e.id.clone())
            .collect();
        if !mislabeled.is_empty() {
            let message = if rule.is_labeled() {
                format!(
                    "Condition node '{}' has outgoing edge(s) without a pass/fail label",
                    node.id
                )
            } else {
                format!(
                    "{} node '{}' has labeled outgoing edge(s); only conditions branch",
                    node.node_type(),
                    node.id
                )
            };
            issues.push(
                ValidationIssue::new(Rule::InvalidBranchLabel, vec![node.id.clone()], message)
                    .with_edges(mislabeled),
            );
        }

        match rule {
            OutgoingRule::None | OutgoingRule::Single => {
                if outgoing.len() > rule.max_edges() {
                    issues.push(
                        ValidationIssue::new(
                            Rule::OutgoingLimitExceeded,
                            vec![node.id.clone()],
                            format!(
                                "{} node '{}' has {} outgoing edges; at most {} allowed",
                                node.node_type(),
                                node.id,
                                outgoing.len(),
                                rule.max_edges()
                            ),
                        )
                        .with_edges(outgoing.iter().map(|e| e.id.clone()).collect()),
                    );
                }
            }
            OutgoingRule::Branches => {
                for label in BranchLabel::ALL {
                    let with_label: Vec<EdgeId> = outgoing
                        .iter()
                        .filter(|e| e.label == Some(label))
                        .map(|e| e.id.clone())
                        .collect();
                    match with_label.len() {
                        0 => issues.push(ValidationIssue::new(
                            Rule::MissingBranch,
                            vec![node.id.clone()],
                            format!("Condition node '{}' has no '{}' edge", node.id, label),
                        )),
                        1 => {}
                        n => issues.push(
                            ValidationIssue::new(
                                Rule::DuplicateBranch,
                                vec![node.id.clone()],
                                format!(
                                    "Condition node '{}' has {} '{}' edges; exactly one allowed",
                                    node.id, n, label
                                ),
                            )
                            .with_edges(with_label),
                        ),
                    }
                }
            }
        }
    }
}

/// Invariant 5: no orphaned content.
fn check_reachability(
    doc: &GraphDocument,
    reachable: &BTreeSet<NodeId>,
    issues: &mut Vec<ValidationIssue>,
) {
    for node in doc.nodes() {
        if !reachable.contains(&node.id) {
            issues.push(ValidationIssue::new(
                Rule::UnreachableNode,
                vec![node.id.clone()],
                format!(
                    "{} node '{}' is unreachable from the entry node",
                    node.node_type(),
                    node.id
                ),
            ));
        }
    }
}

/// Invariant 6: some path terminates.
fn check_reachable_exit(
    doc: &GraphDocument,
    reachable: &BTreeSet<NodeId>,
    issues: &mut Vec<ValidationIssue>,
) {
    let exit_reached = doc
        .nodes_of_type(NodeType::Exit)
        .any(|n| reachable.contains(&n.id));
    if !exit_reached {
        issues.push(ValidationIssue::new(
            Rule::NoReachableExit,
            vec![doc.entry_node_id().clone()],
            "No exit node is reachable from the entry node".to_string(),
        ));
    }
}

// =============================================================================
// TESTS
// =============================================================================
