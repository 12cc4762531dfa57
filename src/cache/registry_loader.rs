use tracing::{info, warn};
use crate::catalog::{CatalogClient, CatalogError};
use super::{MaterializedViewDescriptor, MaterializedViewRegistry};

/// Warm `registry` with every materialized view currently in `catalog`.
///
/// Catalog records that cannot be projected into a descriptor are skipped
/// with a warning. Returns the number of views registered.
pub fn load_registry(
    catalog: &dyn CatalogClient,
    registry: &MaterializedViewRegistry,
) -> Result<usize, CatalogError> {
    if !registry.config().enabled {
        info!("Materialized view registry disabled, skipping initial load");
        return Ok(0);
    }

    let mut loaded = 0;
    for object in catalog.list_materialized_views()? {
        match MaterializedViewDescriptor::try_from(&object) {
            Ok(descriptor) => {
                registry.insert(descriptor);
                loaded += 1;
            }
            Err(e) => warn!("Skipping materialized view {}: {}", object.name, e),
        }
    }

    info!("Loaded {} materialized view(s) into registry", loaded);
    Ok(loaded)
}
