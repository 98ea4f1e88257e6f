//! # Persisted JSON Contract
//!
//! The wire shape shared by the workflow designer and the learner runtime:
//!
//! ```text
//! {
//!   "nodes": { "<id>": { "id", "type", "position": {x, y}, "data": {...} } },
//!   "edges": [ { "id", "source", "sourceHandle": "pass"|"fail"|null, "target" } ],
//!   "entryNodeId": "<id>"
//! }
//! ```
//!
//! Loading is strict. Anything this model cannot represent faithfully is a
//! `DeserializationError` with a reason; nothing is dropped or coerced. A
//! node key may appear once. Keys in `data` that the node's type does not
//! recognize are kept, in order, and written back on save. Any other key
//! outside `data` is rejected, so forward-compatible extras belong in
//! `data`.

use crate::document::GraphDocument;
use crate::node::{ConditionPayload, Edge, ExercisePayload, JsonMap, Node, NodeKind};
use crate::primitives::{
    MAX_DOCUMENT_BYTES, MAX_ID_LENGTH, MAX_IMPORT_EDGE_COUNT, MAX_IMPORT_NODE_COUNT,
};
use crate::registry::{
    ConditionKind, ExerciseKind, FIELD_CONDITION_KIND, FIELD_EXERCISE_KIND, FIELD_EXPRESSION,
    FIELD_LABEL, FIELD_SETTINGS, NodeRegistry, NodeType,
};
use crate::{BranchLabel, EdgeId, NodeId, PathwayError, Position};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// WIRE TYPES
// =============================================================================

/// A persisted workflow document, exactly as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WireDocument {
    #[serde(deserialize_with = "unique_node_keys")]
    pub nodes: BTreeMap<String, WireNode>,
    pub edges: Vec<WireEdge>,
    /// Optional on input only so a missing pointer gets a precise reason.
    #[serde(default)]
    pub entry_node_id: Option<String>,
}

/// A persisted node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub position: Position,
    pub data: JsonMap,
}

/// A persisted edge. `sourceHandle` is always written, `null` when unlabeled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WireEdge {
    pub id: String,
    pub source: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    pub target: String,
}

/// `nodes` map that fails on a repeated key instead of keeping the last one.
fn unique_node_keys<'de, D>(deserializer: D) -> Result<BTreeMap<String, WireNode>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueKeys;

    impl<'de> Visitor<'de> for UniqueKeys {
        type Value = BTreeMap<String, WireNode>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an object of nodes keyed by id")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut nodes = BTreeMap::new();
            while let Some((key, node)) = access.next_entry::<String, WireNode>()? {
                match nodes.entry(key) {
                    Entry::Occupied(slot) => {
                        return Err(de::Error::custom(format!(
                            "duplicate node key '{}'",
                            slot.key()
                        )));
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(node);
                    }
                }
            }
            Ok(nodes)
        }
    }

    deserializer.deserialize_map(UniqueKeys)
}

// =============================================================================
// SERIALIZE
// =============================================================================

/// Render a document in the persisted shape.
#[must_use]
pub fn serialize(doc: &GraphDocument) -> WireDocument {
    let nodes = doc
        .nodes()
        .map(|node| (node.id.0.clone(), serialize_node(node)))
        .collect();

    let edges = doc
        .edges()
        .iter()
        .map(|edge| WireEdge {
            id: edge.id.0.clone(),
            source: edge.source.0.clone(),
            source_handle: edge.label.map(|l| l.as_str().to_string()),
            target: edge.target.0.clone(),
        })
        .collect();

    WireDocument {
        nodes,
        edges,
        entry_node_id: Some(doc.entry_node_id().0.clone()),
    }
}

fn serialize_node(node: &Node) -> WireNode {
    let mut data = JsonMap::new();
    data.insert(FIELD_LABEL.to_string(), Value::String(node.label.clone()));
    match &node.kind {
        NodeKind::Entry | NodeKind::Exit => {}
        NodeKind::Exercise(payload) => {
            data.insert(
                FIELD_EXERCISE_KIND.to_string(),
                Value::String(payload.exercise_kind.as_str().to_string()),
            );
            data.insert(
                FIELD_SETTINGS.to_string(),
                Value::Object(payload.settings.clone()),
            );
        }
        NodeKind::Condition(payload) => {
            data.insert(
                FIELD_EXPRESSION.to_string(),
                Value::String(payload.expression.clone()),
            );
            data.insert(
                FIELD_CONDITION_KIND.to_string(),
                Value::String(payload.condition_kind.as_str().to_string()),
            );
        }
    }
    for (key, value) in &node.extra {
        data.insert(key.clone(), value.clone());
    }

    WireNode {
        id: node.id.0.clone(),
        node_type: node.node_type().as_str().to_string(),
        position: node.position,
        data,
    }
}

// =============================================================================
// DESERIALIZE
// =============================================================================

fn reject(reason: impl Into<String>) -> PathwayError {
    PathwayError::DeserializationError(reason.into())
}

/// Build a document from the persisted shape.
///
/// Does not run the validator; callers decide when to validate.
pub fn deserialize(wire: &WireDocument) -> Result<GraphDocument, PathwayError> {
    if wire.nodes.len() > MAX_IMPORT_NODE_COUNT {
        return Err(reject(format!(
            "node count {} exceeds maximum {}",
            wire.nodes.len(),
            MAX_IMPORT_NODE_COUNT
        )));
    }
    if wire.edges.len() > MAX_IMPORT_EDGE_COUNT {
        return Err(reject(format!(
            "edge count {} exceeds maximum {}",
            wire.edges.len(),
            MAX_IMPORT_EDGE_COUNT
        )));
    }

    let entry_node_id = wire
        .entry_node_id
        .as_deref()
        .ok_or_else(|| reject("missing entryNodeId"))?;

    let mut nodes = BTreeMap::new();
    for (key, wire_node) in &wire.nodes {
        if key != &wire_node.id {
            return Err(reject(format!(
                "node stored under key '{}' has id '{}'",
                key, wire_node.id
            )));
        }
        let node = deserialize_node(wire_node)?;
        nodes.insert(node.id.clone(), node);
    }

    let entry_node_id = NodeId::new(entry_node_id);
    if !nodes.contains_key(&entry_node_id) {
        return Err(reject(format!(
            "entryNodeId '{}' references an absent node",
            entry_node_id
        )));
    }

    let mut seen_edges = BTreeSet::new();
    let mut edges = Vec::with_capacity(wire.edges.len());
    for wire_edge in &wire.edges {
        if !seen_edges.insert(wire_edge.id.as_str()) {
            return Err(reject(format!("duplicate edge id '{}'", wire_edge.id)));
        }
        edges.push(deserialize_edge(wire_edge, &nodes)?);
    }

    Ok(GraphDocument::from_parts(nodes, edges, entry_node_id))
}

fn deserialize_node(wire: &WireNode) -> Result<Node, PathwayError> {
    if wire.id.is_empty() || wire.id.len() > MAX_ID_LENGTH {
        return Err(reject(format!("invalid node id {:?}", wire.id)));
    }
    let node_type = NodeType::parse(&wire.node_type).map_err(|_| {
        reject(format!(
            "node '{}' has unknown type '{}'",
            wire.id, wire.node_type
        ))
    })?;

    let data = &wire.data;
    let label = get_string(data, &wire.id, FIELD_LABEL)?;

    let kind = match node_type {
        NodeType::Entry => NodeKind::Entry,
        NodeType::Exit => NodeKind::Exit,
        NodeType::Exercise => {
            let raw_kind = get_string(data, &wire.id, FIELD_EXERCISE_KIND)?;
            let exercise_kind = ExerciseKind::parse(&raw_kind).map_err(|_| {
                reject(format!(
                    "node '{}' has unknown exercise kind '{}'",
                    wire.id, raw_kind
                ))
            })?;
            let settings = match data.get(FIELD_SETTINGS) {
                Some(Value::Object(map)) => map.clone(),
                Some(_) => {
                    return Err(reject(format!(
                        "node '{}': '{}' must be an object",
                        wire.id, FIELD_SETTINGS
                    )));
                }
                None => {
                    return Err(reject(format!(
                        "node '{}': missing '{}'",
                        wire.id, FIELD_SETTINGS
                    )));
                }
            };
            NodeKind::Exercise(ExercisePayload::with_settings(exercise_kind, settings))
        }
        NodeType::Condition => {
            let expression = get_string(data, &wire.id, FIELD_EXPRESSION)?;
            let raw_kind = get_string(data, &wire.id, FIELD_CONDITION_KIND)?;
            let condition_kind = ConditionKind::parse(&raw_kind).map_err(|_| {
                reject(format!(
                    "node '{}' has unknown condition kind '{}'",
                    wire.id, raw_kind
                ))
            })?;
            NodeKind::Condition(ConditionPayload::new(expression, condition_kind))
        }
    };

    let shape = NodeRegistry::shape_of(node_type);
    let mut node = Node::new(NodeId::new(wire.id.as_str()), label, wire.position, kind);
    node.extra = data
        .iter()
        .filter(|(key, _)| !shape.has_field(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    NodeRegistry::check_node(&node).map_err(|e| reject(e.to_string()))?;
    Ok(node)
}

fn get_string(data: &JsonMap, node_id: &str, field: &str) -> Result<String, PathwayError> {
    match data.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(reject(format!(
            "node '{}': '{}' must be a string",
            node_id, field
        ))),
        None => Err(reject(format!("node '{}': missing '{}'", node_id, field))),
    }
}

fn deserialize_edge(
    wire: &WireEdge,
    nodes: &BTreeMap<NodeId, Node>,
) -> Result<Edge, PathwayError> {
    let source = NodeId::new(wire.source.as_str());
    let target = NodeId::new(wire.target.as_str());

    let Some(source_node) = nodes.get(&source) else {
        return Err(reject(format!(
            "edge '{}' references absent source node '{}'",
            wire.id, source
        )));
    };
    if !nodes.contains_key(&target) {
        return Err(reject(format!(
            "edge '{}' references absent target node '{}'",
            wire.id, target
        )));
    }

    let label = wire
        .source_handle
        .as_deref()
        .map(BranchLabel::parse)
        .transpose()
        .map_err(|_| {
            reject(format!(
                "edge '{}' has unknown sourceHandle {:?}",
                wire.id, wire.source_handle
            ))
        })?;

    let labeled = NodeRegistry::outgoing_rule(source_node.node_type()).is_labeled();
    if label.is_some() != labeled {
        return Err(reject(if labeled {
            format!(
                "edge '{}' leaves condition node '{}' without a sourceHandle",
                wire.id, source
            )
        } else {
            format!(
                "edge '{}' leaves {} node '{}' with a sourceHandle",
                wire.id,
                source_node.node_type(),
                source
            )
        }));
    }

    Ok(Edge::new(EdgeId::new(wire.id.as_str()), source, label, target))
}

// =============================================================================
// TEXT HELPERS
// =============================================================================

/// Compact JSON text of a document.
pub fn to_json_string(doc: &GraphDocument) -> Result<String, PathwayError> {
    serde_json::to_string(&serialize(doc))
        .map_err(|e| PathwayError::SerializationError(e.to_string()))
}

/// Indented JSON text of a document.
pub fn to_json_pretty(doc: &GraphDocument) -> Result<String, PathwayError> {
    serde_json::to_string_pretty(&serialize(doc))
        .map_err(|e| PathwayError::SerializationError(e.to_string()))
}

/// Parse JSON text into the wire shape, without building a document.
///
/// The size limit is checked before any parsing.
pub fn wire_from_str(text: &str) -> Result<WireDocument, PathwayError> {
    if text.len() > MAX_DOCUMENT_BYTES {
        return Err(reject(format!(
            "document size {} bytes exceeds maximum {} bytes",
            text.len(),
            MAX_DOCUMENT_BYTES
        )));
    }
    serde_json::from_str(text).map_err(|e| reject(e.to_string()))
}

/// Parse JSON text into a document.
pub fn from_json_str(text: &str) -> Result<GraphDocument, PathwayError> {
    deserialize(&wire_from_str(text)?)
}

// =============================================================================
// TESTS
// =============================================================================
