//! # Persistence Gateway
//!
//! The boundary between the editing model and wherever workflow documents
//! live. A gateway moves JSON text keyed by `WorkflowId`; it knows nothing
//! about graphs. Parsing and validation happen on the model side.
//!
//! Every save replaces the whole document. There is no concurrency token:
//! the last write wins.

use crate::{PathwayError, WorkflowId};
use std::collections::BTreeMap;

/// Storage for persisted workflow documents.
pub trait PersistenceGateway {
    /// Fetch the stored JSON text. Fails `WorkflowNotFound` if absent.
    fn load(&self, id: &WorkflowId) -> Result<String, PathwayError>;

    /// Store JSON text under `id`, replacing any previous document.
    fn save(&mut self, id: &WorkflowId, json: &str) -> Result<(), PathwayError>;

    /// Every stored workflow id, in ascending order.
    fn list(&self) -> Result<Vec<WorkflowId>, PathwayError>;
}

/// Volatile gateway backed by a `BTreeMap`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    documents: BTreeMap<WorkflowId, String>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceGateway for InMemoryGateway {
    fn load(&self, id: &WorkflowId) -> Result<String, PathwayError> {
        self.documents
            .get(id)
            .cloned()
            .ok_or_else(|| PathwayError::WorkflowNotFound(id.to_string()))
    }

    fn save(&mut self, id: &WorkflowId, json: &str) -> Result<(), PathwayError> {
        self.documents.insert(id.clone(), json.to_string());
        Ok(())
    }

    fn list(&self) -> Result<Vec<WorkflowId>, PathwayError> {
        Ok(self.documents.keys().cloned().collect())
    }
}
