//! # Model Primitives
//!
//! Hardcoded limits and naming constants for the workflow model.
//!
//! These are compiled into the binary and are immutable at runtime. The
//! limits bound the cost of loading a document that came from storage or
//! from the network.

/// Maximum number of nodes accepted when deserializing a document.
pub const MAX_IMPORT_NODE_COUNT: usize = 10_000;

/// Maximum number of edges accepted when deserializing a document.
///
/// A Condition node has two outgoing edges, every other node at most one,
/// so twice the node limit covers every well-formed document.
pub const MAX_IMPORT_EDGE_COUNT: usize = 2 * MAX_IMPORT_NODE_COUNT;

/// Maximum size of a JSON document accepted by `from_json_str` (4 MiB).
pub const MAX_DOCUMENT_BYTES: usize = 4 * 1024 * 1024;

/// Maximum length of a node or edge id.
pub const MAX_ID_LENGTH: usize = 128;

/// Maximum length of a workflow id used as a storage key.
pub const MAX_WORKFLOW_ID_LENGTH: usize = 128;

/// Maximum length of a node label.
pub const MAX_LABEL_LENGTH: usize = 512;

/// Maximum length of a Condition expression.
pub const MAX_EXPRESSION_LENGTH: usize = 1024;

// =============================================================================
// ID PREFIXES
// =============================================================================

/// Prefix for generated Entry node ids.
pub const ENTRY_ID_PREFIX: &str = "entry";

/// Prefix for generated Exit node ids.
pub const EXIT_ID_PREFIX: &str = "exit";

/// Prefix for generated Exercise node ids.
pub const EXERCISE_ID_PREFIX: &str = "exercise";

/// Prefix for generated Condition node ids.
pub const CONDITION_ID_PREFIX: &str = "condition";

/// Prefix for generated edge ids.
pub const EDGE_ID_PREFIX: &str = "edge";

/// Label given to the Entry node of a fresh document.
pub const DEFAULT_ENTRY_LABEL: &str = "Start";

/// Label given to the Exit node of a fresh document.
pub const DEFAULT_EXIT_LABEL: &str = "End";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_limit_covers_two_branches_per_node() {
        assert_eq!(MAX_IMPORT_EDGE_COUNT, 2 * MAX_IMPORT_NODE_COUNT);
    }
}
