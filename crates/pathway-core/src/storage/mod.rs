//! # Storage Backends
//!
//! Concrete `PersistenceGateway` implementations and the `Store` that
//! dispatches over them.
//!
//! - `memory`: `InMemoryGateway`, volatile
//! - `redb`: `RedbGateway`, one ACID database file
//! - `dir`: `DirectoryGateway`, one JSON file per workflow

mod dir_store;
mod redb_store;

pub use dir_store::DirectoryGateway;
pub use redb_store::RedbGateway;

use crate::gateway::{InMemoryGateway, PersistenceGateway};
use crate::{PathwayError, WorkflowId};
use std::fmt;
use std::path::Path;

/// Backend selector, as written in config files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    Memory,
    #[default]
    Redb,
    Dir,
}

impl BackendKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb => "redb",
            Self::Dir => "dir",
        }
    }

    /// Parse a backend name. Unknown names fail with `UnknownKind`.
    pub fn parse(raw: &str) -> Result<Self, PathwayError> {
        match raw.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redb" => Ok(Self::Redb),
            "dir" | "directory" => Ok(Self::Dir),
            _ => Err(PathwayError::UnknownKind(format!("backend '{}'", raw))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = PathwayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A gateway selected at runtime.
#[derive(Debug)]
pub enum Store {
    Memory(InMemoryGateway),
    Redb(RedbGateway),
    Dir(DirectoryGateway),
}

impl Default for Store {
    fn default() -> Self {
        Self::Memory(InMemoryGateway::new())
    }
}

impl Store {
    /// Open the backend of the given kind. `path` is ignored for `memory`.
    pub fn open(kind: BackendKind, path: impl AsRef<Path>) -> Result<Self, PathwayError> {
        match kind {
            BackendKind::Memory => Ok(Self::Memory(InMemoryGateway::new())),
            BackendKind::Redb => RedbGateway::open(path).map(Self::Redb),
            BackendKind::Dir => DirectoryGateway::open(path).map(Self::Dir),
        }
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Memory(_) => BackendKind::Memory,
            Self::Redb(_) => BackendKind::Redb,
            Self::Dir(_) => BackendKind::Dir,
        }
    }
}

impl PersistenceGateway for Store {
    fn load(&self, id: &WorkflowId) -> Result<String, PathwayError> {
        match self {
            Self::Memory(g) => g.load(id),
            Self::Redb(g) => g.load(id),
            Self::Dir(g) => g.load(id),
        }
    }

    fn save(&mut self, id: &WorkflowId, json: &str) -> Result<(), PathwayError> {
        match self {
            Self::Memory(g) => g.save(id, json),
            Self::Redb(g) => g.save(id, json),
            Self::Dir(g) => g.save(id, json),
        }
    }

    fn list(&self) -> Result<Vec<WorkflowId>, PathwayError> {
        match self {
            Self::Memory(g) => g.list(),
            Self::Redb(g) => g.list(),
            Self::Dir(g) => g.list(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn backend_kind_parses_names() {
        assert_eq!(BackendKind::parse("REDB").expect("parse"), BackendKind::Redb);
        assert_eq!(BackendKind::parse("directory").expect("parse"), BackendKind::Dir);
        assert!(matches!(
            BackendKind::parse("s3"),
            Err(PathwayError::UnknownKind(_))
        ));
    }

    #[test]
    fn every_backend_round_trips_text() {
        let temp = tempdir().expect("temp dir");
        let id = WorkflowId::parse("intro").expect("id");

        for (kind, path) in [
            (BackendKind::Memory, temp.path().join("unused")),
            (BackendKind::Redb, temp.path().join("store.redb")),
            (BackendKind::Dir, temp.path().join("workflows")),
        ] {
            let mut store = Store::open(kind, &path).expect("open");
            assert_eq!(store.kind(), kind);
            store.save(&id, "{\"a\":1}").expect("save");
            assert_eq!(store.load(&id).expect("load"), "{\"a\":1}");
            assert_eq!(store.list().expect("list"), vec![id.clone()]);
        }
    }
}
