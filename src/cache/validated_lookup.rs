use std::sync::Arc;
use tracing::debug;
use crate::catalog::{CatalogClient, CatalogError};
use crate::metadata::QualifiedName;
use super::{MaterializedViewDescriptor, MaterializedViewRegistry};

/// Registry lookup for consumers that must not act on a view the catalog no longer has.
///
/// A drop deletes from the catalog before it evicts from the registry, so a
/// reader racing the drop can see a registry hit for a deleted view. With
/// `validate_on_hit` set, every hit is checked against the catalog; entries
/// that are gone or no longer materialized views are evicted and reported as
/// misses, and entries whose catalog definition changed are refreshed unless a
/// concurrent writer got there first.
pub struct ValidatingLookup {
    catalog: Arc<dyn CatalogClient>,
    registry: Arc<MaterializedViewRegistry>,
}

impl ValidatingLookup {
    pub fn new(catalog: Arc<dyn CatalogClient>, registry: Arc<MaterializedViewRegistry>) -> Self {
        Self { catalog, registry }
    }

    pub fn get(
        &self,
        name: &QualifiedName,
    ) -> Result<Option<Arc<MaterializedViewDescriptor>>, CatalogError> {
        let Some(cached) = self.registry.lookup(name) else {
            return Ok(None);
        };
        if !self.registry.config().validate_on_hit {
            return Ok(Some(cached));
        }

        let current = match self.catalog.lookup(name)? {
            Some(object) if object.is_materialized_view() => object,
            _ => {
                debug!("Registry entry {} no longer backed by the catalog", name);
                self.registry.evict_if_same(name, &cached);
                return Ok(None);
            }
        };

        let fresh = MaterializedViewDescriptor::try_from(&current)?;
        if fresh == *cached {
            return Ok(Some(cached));
        }

        debug!("Refreshing registry entry {} from catalog", name);
        Ok(self.registry.replace_if_same(&cached, fresh))
    }

    /// Validated rewrite candidates of one database
    pub fn rewriting_candidates(
        &self,
        database: &str,
    ) -> Result<Vec<Arc<MaterializedViewDescriptor>>, CatalogError> {
        let mut validated = Vec::new();
        for candidate in self.registry.rewriting_candidates(database) {
            if let Some(descriptor) = self.get(&candidate.name)?
                && descriptor.rewrite_enabled
            {
                validated.push(descriptor);
            }
        }
        Ok(validated)
    }
}
