//! # API Request/Response Types
//!
//! JSON bodies of the HTTP API. Workflow documents themselves travel in the
//! persisted wire shape and are not wrapped.

use pathway_core::{
    ConditionKind, ExerciseKind, FieldSpec, NodeRegistry, NodeType, OutgoingRule,
    ValidationIssue,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// KINDS RESPONSE
// =============================================================================

/// One recognized `data` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldJson {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
}

impl From<&FieldSpec> for FieldJson {
    fn from(spec: &FieldSpec) -> Self {
        Self {
            name: spec.name.to_string(),
            field_type: serde_json::to_value(spec.field_type)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            required: spec.required,
        }
    }
}

/// Shape and wiring rule of one node type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTypeJson {
    pub name: String,
    pub fields: Vec<FieldJson>,
    /// `none`, `single` or `branches`.
    pub outgoing: String,
    pub max_outgoing: usize,
}

/// Everything the editor palette needs from the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindsResponse {
    pub node_types: Vec<NodeTypeJson>,
    pub exercise_kinds: Vec<String>,
    pub condition_kinds: Vec<String>,
}

impl KindsResponse {
    #[must_use]
    pub fn from_registry() -> Self {
        let node_types = NodeType::ALL
            .into_iter()
            .map(|node_type| {
                let shape = NodeRegistry::shape_of(node_type);
                let rule = NodeRegistry::outgoing_rule(node_type);
                NodeTypeJson {
                    name: node_type.as_str().to_string(),
                    fields: shape.fields.iter().map(FieldJson::from).collect(),
                    outgoing: outgoing_name(rule).to_string(),
                    max_outgoing: rule.max_edges(),
                }
            })
            .collect();

        Self {
            node_types,
            exercise_kinds: ExerciseKind::ALL
                .iter()
                .map(|k| k.as_str().to_string())
                .collect(),
            condition_kinds: ConditionKind::ALL
                .iter()
                .map(|k| k.as_str().to_string())
                .collect(),
        }
    }
}

fn outgoing_name(rule: OutgoingRule) -> &'static str {
    match rule {
        OutgoingRule::None => "none",
        OutgoingRule::Single => "single",
        OutgoingRule::Branches => "branches",
    }
}

// =============================================================================
// WORKFLOW RESPONSES
// =============================================================================

/// Stored workflow ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowListResponse {
    pub workflows: Vec<String>,
}

/// Validation outcome; issues are data, never an error status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

/// Result of `PUT /workflows/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    pub saved: bool,
    pub id: String,
    /// The checklist that blocked the save; empty when saved.
    #[serde(default)]
    pub issues: Vec<ValidationIssue>,
}

/// Document fingerprints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashResponse {
    pub id: String,
    /// FNV-1a checksum, 16 hex digits.
    pub checksum: String,
    pub blake3: String,
}

/// Error body for every non-2xx response produced by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
