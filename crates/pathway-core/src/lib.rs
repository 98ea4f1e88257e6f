//! # pathway-core
//!
//! The learning-workflow graph model for Pathway - THE MODEL.
//!
//! A workflow is a directed graph of typed nodes. Entry and Exit nodes bound
//! the path, Exercise nodes are learning activities, and Condition nodes
//! branch on a learner's result through a `pass` edge and a `fail` edge.
//!
//! ## Layers
//!
//! - `registry`: the closed set of node types, kinds and payload shapes
//! - `document`: the graph itself, with pure structural edits
//! - `validator`: whole-graph checks producing issues as data
//! - `edit`: user-facing editing actions composed from document edits
//! - `formats`: the persisted JSON contract
//! - `session`, `gateway`, `storage`: editing sessions and persistence
//!
//! ## Architectural Constraints
//!
//! - Edits never mutate their input; a rejected edit changes nothing
//! - Validation reports problems, it never fixes them
//! - Loading is strict: a corrupt document is an error, never repaired
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod document;
pub mod edit;
pub mod fingerprint;
pub mod formats;
pub mod gateway;
pub mod node;
pub mod primitives;
pub mod registry;
pub mod session;
pub mod state;
pub mod storage;
pub mod types;
pub mod validator;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    BranchLabel, EdgeId, ErrorCategory, NodeId, PathwayError, Position, WorkflowId,
};

// =============================================================================
// RE-EXPORTS: Model
// =============================================================================

pub use document::GraphDocument;
pub use edit::Editor;
pub use node::{ConditionPayload, Edge, ExercisePayload, JsonMap, Node, NodeKind};
pub use registry::{
    ConditionKind, ExerciseKind, FieldSpec, FieldType, NodeRegistry, NodeType, OutgoingRule,
    PayloadShape,
};
pub use state::{NodeState, node_states};
pub use validator::{Rule, ValidationIssue, ValidationResult, reachable_from, validate};

// =============================================================================
// RE-EXPORTS: Persistence
// =============================================================================

pub use fingerprint::{canonical_bytes, checksum, verify_checksum};
#[cfg(feature = "crypto-hash")]
pub use fingerprint::blake3_hex;
pub use formats::{WireDocument, WireEdge, WireNode, from_json_str, to_json_pretty, to_json_string};
pub use gateway::{InMemoryGateway, PersistenceGateway};
pub use session::{SaveOutcome, Session, save_document};
pub use storage::{BackendKind, DirectoryGateway, RedbGateway, Store};
