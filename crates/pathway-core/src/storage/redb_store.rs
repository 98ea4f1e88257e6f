//! # redb-backed Gateway
//!
//! Stores each workflow's JSON text in a single redb table keyed by
//! workflow id. Saves are one write transaction each, so a crash never
//! leaves a half-written document behind.

use crate::gateway::PersistenceGateway;
use crate::{PathwayError, WorkflowId};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for documents: workflow id -> JSON bytes
const WORKFLOWS: TableDefinition<&str, &[u8]> = TableDefinition::new("workflows");

fn io_err(e: impl std::fmt::Display) -> PathwayError {
    PathwayError::IoError(e.to_string())
}

/// A disk-backed gateway using redb.
pub struct RedbGateway {
    db: Database,
}

impl std::fmt::Debug for RedbGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbGateway").finish_non_exhaustive()
    }
}

impl RedbGateway {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PathwayError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Create the table so readers never see it missing
        let write_txn = db.begin_write().map_err(io_err)?;
        {
            let _ = write_txn.open_table(WORKFLOWS).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;

        Ok(Self { db })
    }
}

impl PersistenceGateway for RedbGateway {
    fn load(&self, id: &WorkflowId) -> Result<String, PathwayError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(WORKFLOWS).map_err(io_err)?;
        let guard = table
            .get(id.as_str())
            .map_err(io_err)?
            .ok_or_else(|| PathwayError::WorkflowNotFound(id.to_string()))?;
        String::from_utf8(guard.value().to_vec())
            .map_err(|e| PathwayError::DeserializationError(e.to_string()))
    }

    fn save(&mut self, id: &WorkflowId, json: &str) -> Result<(), PathwayError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(WORKFLOWS).map_err(io_err)?;
            table.insert(id.as_str(), json.as_bytes()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<WorkflowId>, PathwayError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(WORKFLOWS).map_err(io_err)?;
        let mut ids = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (key, _) = entry.map_err(io_err)?;
            ids.push(WorkflowId::parse(key.value())?);
        }
        Ok(ids)
    }
}
