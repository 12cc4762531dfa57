// Module for the durable catalog client interface and its implementations
pub mod in_memory;
pub mod sqlite_catalog;

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::metadata::QualifiedName;

pub use in_memory::InMemoryCatalog;
pub use sqlite_catalog::{SqliteCatalog, SqliteCatalogConfig};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
    #[error("Object '{0}' already exists")]
    AlreadyExists(QualifiedName),
    #[error("Invalid catalog record: {0}")]
    InvalidRecord(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::Unavailable(err.to_string())
    }
}

/// The kind of a catalog object. Closed on purpose: adding a kind must force
/// every `match` over it to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectKind {
    BaseTable,
    View,
    MaterializedView,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::BaseTable => "BASE_TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::MaterializedView => "MATERIALIZED_VIEW",
        }
    }

    /// Human-readable form with an article, used in user-facing errors
    pub fn described(&self) -> &'static str {
        match self {
            ObjectKind::BaseTable => "a base table",
            ObjectKind::View => "a view",
            ObjectKind::MaterializedView => "a materialized view",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BASE_TABLE" => Ok(ObjectKind::BaseTable),
            "VIEW" => Ok(ObjectKind::View),
            "MATERIALIZED_VIEW" => Ok(ObjectKind::MaterializedView),
            other => Err(CatalogError::InvalidRecord(format!("unknown object kind '{}'", other))),
        }
    }
}

/// Definition metadata stored alongside a catalog object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDefinition {
    /// Defining query for views and materialized views
    pub view_text: Option<String>,
    /// Objects the definition reads from
    pub source_tables: Vec<QualifiedName>,
    /// Whether the materialized view may be used for query rewriting
    pub rewrite_enabled: bool,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Default for ObjectDefinition {
    fn default() -> Self {
        Self {
            view_text: None,
            source_tables: Vec::new(),
            rewrite_enabled: false,
            owner: None,
            created_at: Utc::now(),
        }
    }
}

/// Durable record of a table, view or materialized view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogObject {
    pub name: QualifiedName,
    pub kind: ObjectKind,
    pub definition: ObjectDefinition,
}

impl CatalogObject {
    pub fn new(name: QualifiedName, kind: ObjectKind, definition: ObjectDefinition) -> Self {
        Self { name, kind, definition }
    }

    pub fn is_materialized_view(&self) -> bool {
        self.kind == ObjectKind::MaterializedView
    }
}

/// Narrow view of the durable catalog used by DDL operations.
///
/// Implementations may block on storage or network I/O. Callers must not hold
/// any in-memory lock of their own across these calls.
pub trait CatalogClient: Send + Sync {
    /// Fetch the current object at `name`. Absence is `Ok(None)`.
    fn lookup(&self, name: &QualifiedName) -> Result<Option<CatalogObject>, CatalogError>;

    /// Delete the object at `name`; deleting an absent object succeeds.
    /// With `cascade`, objects built on top of it are removed as well.
    fn delete(&self, name: &QualifiedName, cascade: bool) -> Result<(), CatalogError>;

    /// All materialized views currently in the catalog
    fn list_materialized_views(&self) -> Result<Vec<CatalogObject>, CatalogError>;
}

/// Names of the objects in `objects` that (directly or transitively) read from `root`,
/// excluding `root` itself. Shared by catalog implementations for cascading deletes.
pub(crate) fn dependents_of(root: &QualifiedName, objects: &[CatalogObject]) -> Vec<QualifiedName> {
    let mut found: Vec<QualifiedName> = Vec::new();
    let mut frontier = vec![root.clone()];

    while let Some(current) = frontier.pop() {
        for object in objects {
            if object.name != *root
                && !found.contains(&object.name)
                && object.definition.source_tables.contains(&current)
            {
                found.push(object.name.clone());
                frontier.push(object.name.clone());
            }
        }
    }

    found
}
