//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the workflow model:
//! - Identifiers (`NodeId`, `EdgeId`, `WorkflowId`)
//! - Cosmetic layout data (`Position`)
//! - Branch labels for Condition edges (`BranchLabel`)
//! - Error types (`PathwayError`, `ErrorCategory`)
//!
//! ## Determinism Guarantees
//!
//! Identifiers implement `Ord` so every collection keyed by them can be a
//! `BTreeMap`/`BTreeSet`, which keeps iteration and issue order stable.

use crate::primitives::MAX_WORKFLOW_ID_LENGTH;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a node, unique within its document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node id from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of an edge, unique within its document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create an edge id from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Key under which a whole workflow document is stored by a gateway.
///
/// Restricted to `[A-Za-z0-9_-]`, 1 to `MAX_WORKFLOW_ID_LENGTH` chars, so it
/// is safe to use as a file name or a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Parse and validate a workflow id.
    pub fn parse(raw: &str) -> Result<Self, PathwayError> {
        let well_formed = !raw.is_empty()
            && raw.len() <= MAX_WORKFLOW_ID_LENGTH
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(PathwayError::InvalidWorkflowId(raw.to_string()))
        }
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for WorkflowId {
    type Err = PathwayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// POSITION (cosmetic)
// =============================================================================

/// Canvas position of a node.
///
/// Layout metadata only. It round-trips losslessly but never takes part in
/// validation or execution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// BRANCH LABEL
// =============================================================================

/// Label of an edge leaving a Condition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchLabel {
    Pass,
    Fail,
}

impl BranchLabel {
    /// Both labels, in the order they are checked and reported.
    pub const ALL: [BranchLabel; 2] = [BranchLabel::Pass, BranchLabel::Fail];

    /// Wire name of the label (`"pass"` / `"fail"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }

    /// Parse a wire name. Anything else is an `InvalidLabel`.
    pub fn parse(raw: &str) -> Result<Self, PathwayError> {
        match raw {
            "pass" => Ok(Self::Pass),
            "fail" => Ok(Self::Fail),
            other => Err(PathwayError::InvalidLabel(format!(
                "unknown branch label '{}' (expected 'pass' or 'fail')",
                other
            ))),
        }
    }
}

impl fmt::Display for BranchLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Pathway model.
///
/// - No silent failures
/// - A rejected edit never touches the document it was applied to
/// - Validation problems are NOT errors; see `validator::ValidationIssue`
#[derive(Debug, Error)]
pub enum PathwayError {
    /// A node or edge id is already taken in this document.
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// A node id is empty or too long.
    #[error("Invalid id: {0:?}")]
    InvalidId(String),

    /// The node kind or payload shape is not recognized by the registry.
    #[error("Invalid kind: {0}")]
    InvalidKind(String),

    /// A second Entry node was offered to a document that already has one.
    #[error("Document already has an entry point")]
    MultipleEntryPoints,

    /// The entry node cannot be removed.
    #[error("Cannot remove entry node: {0}")]
    CannotRemoveEntry(NodeId),

    /// The requested node was not found in the document.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The requested edge was not found in the document.
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// A branch label was supplied where none is allowed, omitted where one
    /// is required, or duplicated.
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// The source node cannot take another outgoing edge.
    #[error("Outgoing edge limit exceeded for node: {0}")]
    OutgoingLimitExceeded(NodeId),

    /// The registry was asked about a kind outside its enumerated sets.
    #[error("Unknown kind: {0}")]
    UnknownKind(String),

    /// A persisted document could not be turned into a graph document.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// A graph document could not be rendered as JSON.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The gateway holds no document under this id.
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    /// The workflow id is not a valid storage key.
    #[error("Invalid workflow id: {0:?}")]
    InvalidWorkflowId(String),

    /// An I/O error occurred in a storage backend.
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Coarse classification of a `PathwayError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected edit; the prior document is still current.
    Structural,
    /// A single load attempt failed; the process carries on.
    Deserialization,
    /// Storage round trip failed; the caller may retry.
    Gateway,
}

impl PathwayError {
    /// Classify this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateId(_)
            | Self::InvalidId(_)
            | Self::InvalidKind(_)
            | Self::MultipleEntryPoints
            | Self::CannotRemoveEntry(_)
            | Self::NodeNotFound(_)
            | Self::EdgeNotFound(_)
            | Self::InvalidLabel(_)
            | Self::OutgoingLimitExceeded(_)
            | Self::UnknownKind(_) => ErrorCategory::Structural,
            Self::DeserializationError(_) => ErrorCategory::Deserialization,
            Self::SerializationError(_)
            | Self::WorkflowNotFound(_)
            | Self::InvalidWorkflowId(_)
            | Self::IoError(_) => ErrorCategory::Gateway,
        }
    }

    /// Whether retrying the same call can succeed without changing input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::IoError(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
