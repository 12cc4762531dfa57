use thiserror::Error;
use tracing::{debug, info, warn};
use crate::catalog::{CatalogError, ObjectKind};
use crate::metadata::QualifiedName;
use crate::session::{WriteEntity, WriteType};
use super::DdlContext;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DropError {
    #[error("cannot drop {} as a materialized view: {name}", .found.described())]
    WrongObjectKind { name: QualifiedName, found: ObjectKind },
    #[error("catalog unavailable while dropping {name}: {source}")]
    CatalogUnavailable {
        name: QualifiedName,
        #[source]
        source: CatalogError,
    },
    #[error("catalog record for {name} is malformed: {source}")]
    InvalidCatalogRecord {
        name: QualifiedName,
        #[source]
        source: CatalogError,
    },
}

/// A `DROP MATERIALIZED VIEW [IF EXISTS] name` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropMaterializedViewDesc {
    pub name: QualifiedName,
    pub if_exists: bool,
}

impl DropMaterializedViewDesc {
    pub fn new(name: QualifiedName, if_exists: bool) -> Self {
        Self { name, if_exists }
    }
}

/// Drops one materialized view from the catalog and keeps the registry in step.
///
/// The catalog delete happens before the registry eviction, and a failed
/// delete leaves the registry untouched. Nothing is mutated before the
/// delete, so abandoning the operation earlier leaves no trace.
pub struct DropMaterializedViewOperation<'a> {
    context: &'a DdlContext,
    desc: DropMaterializedViewDesc,
}

impl<'a> DropMaterializedViewOperation<'a> {
    pub fn new(context: &'a DdlContext, desc: DropMaterializedViewDesc) -> Self {
        Self { context, desc }
    }

    pub fn execute(&self) -> Result<(), DropError> {
        let name = &self.desc.name;

        let object = self
            .context
            .catalog
            .lookup(name)
            .map_err(|source| self.unavailable(source))?;

        // Missing targets are rejected during analysis unless IF EXISTS was given
        let Some(object) = object else {
            debug!("Materialized view {} does not exist, nothing to drop", name);
            return Ok(());
        };

        match object.kind {
            ObjectKind::MaterializedView => {}
            ObjectKind::View | ObjectKind::BaseTable if self.desc.if_exists => {
                debug!(
                    "{} is {}, ignoring drop because of IF EXISTS",
                    name,
                    object.kind.described()
                );
                return Ok(());
            }
            found @ (ObjectKind::View | ObjectKind::BaseTable) => {
                return Err(DropError::WrongObjectKind { name: name.clone(), found });
            }
        }

        self.context
            .catalog
            .delete(name, false)
            .map_err(|source| self.unavailable(source))?;

        self.context.registry.evict(name);
        self.context.outputs.add(WriteEntity::new(
            object.name,
            ObjectKind::MaterializedView,
            WriteType::DdlNoLock,
        ));

        info!("Dropped materialized view {}", name);
        Ok(())
    }

    fn unavailable(&self, source: CatalogError) -> DropError {
        warn!("Catalog failure dropping materialized view {}: {}", self.desc.name, source);
        let name = self.desc.name.clone();
        match source {
            CatalogError::InvalidRecord(_) => DropError::InvalidCatalogRecord { name, source },
            CatalogError::Unavailable(_) | CatalogError::AlreadyExists(_) => {
                DropError::CatalogUnavailable { name, source }
            }
        }
    }
}

/// Entry point used by the DDL dispatcher
pub fn drop_materialized_view(
    context: &DdlContext,
    name: QualifiedName,
    if_exists: bool,
) -> Result<(), DropError> {
    let desc = DropMaterializedViewDesc::new(name, if_exists);
    DropMaterializedViewOperation::new(context, desc).execute()
}
