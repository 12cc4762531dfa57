use std::sync::Arc;
use crate::cache::MaterializedViewRegistry;
use crate::catalog::CatalogClient;
use crate::session::WriteEntitySet;

/// Collaborators a DDL operation runs against.
///
/// The catalog and registry are shared by every session in the process; the
/// write entity set belongs to the session issuing the statement.
#[derive(Clone)]
pub struct DdlContext {
    pub catalog: Arc<dyn CatalogClient>,
    pub registry: Arc<MaterializedViewRegistry>,
    pub outputs: Arc<WriteEntitySet>,
}

impl DdlContext {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        registry: Arc<MaterializedViewRegistry>,
        outputs: Arc<WriteEntitySet>,
    ) -> Self {
        Self { catalog, registry, outputs }
    }

    /// Same shared catalog and registry, fresh write entity set for another session
    pub fn for_new_session(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            registry: Arc::clone(&self.registry),
            outputs: Arc::new(WriteEntitySet::new()),
        }
    }
}
