use std::collections::HashSet;
use std::fmt;
use parking_lot::Mutex;
use crate::catalog::ObjectKind;
use crate::metadata::QualifiedName;

/// Lock strength a write entity asks the lock manager for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteType {
    DdlExclusive,
    DdlShared,
    DdlNoLock,
    Insert,
    InsertOverwrite,
    Update,
    Delete,
}

/// An object touched by a DDL or DML operation, kept for lock and transaction bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteEntity {
    pub name: QualifiedName,
    pub object_kind: ObjectKind,
    pub write_type: WriteType,
}

impl WriteEntity {
    pub fn new(name: QualifiedName, object_kind: ObjectKind, write_type: WriteType) -> Self {
        Self { name, object_kind, write_type }
    }

    /// Identity used for deduplication: `db@object`
    pub fn identity(&self) -> String {
        identity_of(&self.name)
    }
}

fn identity_of(name: &QualifiedName) -> String {
    format!("{}@{}", name.database(), name.object())
}

impl fmt::Display for WriteEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.identity(), self.write_type)
    }
}

#[derive(Default)]
struct Entities {
    ordered: Vec<WriteEntity>,
    identities: HashSet<String>,
}

/// Write entities accumulated by one session, unique by identity
#[derive(Default)]
pub struct WriteEntitySet {
    inner: Mutex<Entities>,
}

impl WriteEntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `entity` unless one with the same identity is already present.
    /// Returns true if it was added.
    pub fn add(&self, entity: WriteEntity) -> bool {
        let mut inner = self.inner.lock();
        if !inner.identities.insert(entity.identity()) {
            return false;
        }
        inner.ordered.push(entity);
        true
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.inner.lock().identities.contains(&identity_of(name))
    }

    /// Snapshot in insertion order
    pub fn entities(&self) -> Vec<WriteEntity> {
        self.inner.lock().ordered.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().ordered.is_empty()
    }
}
