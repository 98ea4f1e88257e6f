//! # Session Module
//!
//! One editing session: the current document and the workflow id it is
//! stored under.
//!
//! - A rejected edit leaves the current document untouched
//! - Loading is a gateway fetch followed by a strict deserialize
//! - Saving validates first; an invalid document is never persisted and the
//!   issues come back as the checklist

use crate::document::GraphDocument;
use crate::formats::{from_json_str, to_json_string};
use crate::gateway::PersistenceGateway;
use crate::state::{NodeState, node_states};
use crate::validator::{ValidationIssue, ValidationResult, validate};
use crate::{NodeId, PathwayError, WorkflowId};
use std::collections::BTreeMap;

/// Result of a save attempt that reached validation.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The document was valid and is now stored.
    Saved,
    /// The document was invalid; nothing was stored.
    Blocked(Vec<ValidationIssue>),
}

impl SaveOutcome {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

/// An editing session over a single workflow document.
#[derive(Debug, Clone, Default)]
pub struct Session {
    document: GraphDocument,
    workflow_id: Option<WorkflowId>,
}

impl Session {
    /// Start a session on a fresh, unsaved document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session on an existing document.
    #[must_use]
    pub fn with_document(document: GraphDocument, workflow_id: Option<WorkflowId>) -> Self {
        Self {
            document,
            workflow_id,
        }
    }

    #[must_use]
    pub fn document(&self) -> &GraphDocument {
        &self.document
    }

    #[must_use]
    pub fn workflow_id(&self) -> Option<&WorkflowId> {
        self.workflow_id.as_ref()
    }

    pub fn set_workflow_id(&mut self, id: WorkflowId) {
        self.workflow_id = Some(id);
    }

    // =========================================================================
    // EDITING
    // =========================================================================

    /// Apply an edit. The document is replaced only if the edit succeeds.
    pub fn apply<F>(&mut self, op: F) -> Result<(), PathwayError>
    where
        F: FnOnce(&GraphDocument) -> Result<GraphDocument, PathwayError>,
    {
        self.document = op(&self.document)?;
        Ok(())
    }

    /// Apply an insertion and return the id it generated.
    pub fn apply_insert<F>(&mut self, op: F) -> Result<NodeId, PathwayError>
    where
        F: FnOnce(&GraphDocument) -> Result<(GraphDocument, NodeId), PathwayError>,
    {
        let (next, id) = op(&self.document)?;
        self.document = next;
        Ok(id)
    }

    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        validate(&self.document)
    }

    #[must_use]
    pub fn node_states(&self) -> BTreeMap<NodeId, NodeState> {
        node_states(&self.document)
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Load a stored workflow into a new session.
    pub fn load<G>(gateway: &G, id: WorkflowId) -> Result<Self, PathwayError>
    where
        G: PersistenceGateway + ?Sized,
    {
        let text = gateway.load(&id)?;
        let document = from_json_str(&text)?;
        Ok(Self::with_document(document, Some(id)))
    }

    /// Save under the session's workflow id.
    ///
    /// Fails `InvalidWorkflowId` if the session was never given one.
    pub fn save<G>(&self, gateway: &mut G) -> Result<SaveOutcome, PathwayError>
    where
        G: PersistenceGateway + ?Sized,
    {
        let id = self
            .workflow_id
            .as_ref()
            .ok_or_else(|| PathwayError::InvalidWorkflowId(String::new()))?;
        save_document(gateway, id, &self.document)
    }

    /// Save under `id` and adopt it as the session's workflow id.
    ///
    /// The id is adopted only once the document has been stored.
    pub fn save_as<G>(
        &mut self,
        gateway: &mut G,
        id: WorkflowId,
    ) -> Result<SaveOutcome, PathwayError>
    where
        G: PersistenceGateway + ?Sized,
    {
        let outcome = save_document(gateway, &id, &self.document)?;
        if outcome.is_saved() {
            self.workflow_id = Some(id);
        }
        Ok(outcome)
    }
}

/// Validate, then persist. Blocked documents never reach the gateway.
pub fn save_document<G>(
    gateway: &mut G,
    id: &WorkflowId,
    document: &GraphDocument,
) -> Result<SaveOutcome, PathwayError>
where
    G: PersistenceGateway + ?Sized,
{
    if let ValidationResult::Invalid(issues) = validate(document) {
        return Ok(SaveOutcome::Blocked(issues));
    }
    let text = to_json_string(document)?;
    gateway.save(id, &text)?;
    Ok(SaveOutcome::Saved)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::Editor;
    use crate::gateway::InMemoryGateway;
    use crate::validator::Rule;
    use crate::Position;

    fn wid(raw: &str) -> WorkflowId {
        WorkflowId::parse(raw).expect("id")
    }

    /// Gateway that fails every call.
    struct Offline;

    impl PersistenceGateway for Offline {
        fn load(&self, _id: &WorkflowId) -> Result<String, PathwayError> {
            Err(PathwayError::IoError("connection refused".to_string()))
        }

        fn save(&mut self, _id: &WorkflowId, _json: &str) -> Result<(), PathwayError> {
            Err(PathwayError::IoError("connection refused".to_string()))
        }

        fn list(&self) -> Result<Vec<WorkflowId>, PathwayError> {
            Err(PathwayError::IoError("connection refused".to_string()))
        }
    }

    fn wired_session() -> Session {
        let mut session = Session::new();
        session
            .apply(|d| Editor::wire(d, &NodeId::new("entry-1"), &NodeId::new("exit-1"), None))
            .expect("wire");
        session
    }

    #[test]
    fn failed_edit_keeps_document() {
        let mut session = Session::new();
        let before = session.document().clone();
        let result = session.apply(|d| d.remove_node(&NodeId::new("entry-1")));
        assert!(matches!(result, Err(PathwayError::CannotRemoveEntry(_))));
        assert_eq!(session.document(), &before);
    }

    #[test]
    fn apply_insert_returns_generated_id() {
        let mut session = Session::new();
        let id = session
            .apply_insert(|d| Editor::insert_exit_node(d, "Alt end", Position::default()))
            .expect("insert");
        assert_eq!(id, NodeId::new("exit-2"));
        assert!(session.document().contains_node(&id));
    }

    #[test]
    fn invalid_document_is_blocked_and_not_stored() {
        let mut gateway = InMemoryGateway::new();
        let mut session = Session::new();
        let outcome = session.save_as(&mut gateway, wid("draft")).expect("save");

        assert!(matches!(
            &outcome,
            SaveOutcome::Blocked(issues)
                if issues.iter().any(|i| i.rule_violated == Rule::NoReachableExit)
        ));
        assert!(gateway.list().expect("list").is_empty());
        assert!(session.workflow_id().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut gateway = InMemoryGateway::new();
        let mut session = wired_session();
        let outcome = session.save_as(&mut gateway, wid("intro")).expect("save");
        assert_eq!(outcome, SaveOutcome::Saved);

        let loaded = Session::load(&gateway, wid("intro")).expect("load");
        assert_eq!(loaded.document(), session.document());
        assert_eq!(loaded.workflow_id(), Some(&wid("intro")));
    }

    #[test]
    fn save_without_id_fails() {
        let mut gateway = InMemoryGateway::new();
        let result = wired_session().save(&mut gateway);
        assert!(matches!(result, Err(PathwayError::InvalidWorkflowId(_))));
    }

    #[test]
    fn gateway_failure_leaves_session_intact() {
        let mut session = wired_session();
        session.set_workflow_id(wid("intro"));
        let before = session.document().clone();

        let err = session.save(&mut Offline).expect_err("offline");
        assert!(err.is_retryable());
        assert_eq!(session.document(), &before);
        assert!(Session::load(&Offline, wid("intro")).is_err());
    }

    #[test]
    fn corrupt_stored_document_fails_to_load() {
        let mut gateway = InMemoryGateway::new();
        gateway.save(&wid("broken"), "{\"nodes\":").expect("save");
        let result = Session::load(&gateway, wid("broken"));
        assert!(matches!(result, Err(PathwayError::DeserializationError(_))));
    }
}
