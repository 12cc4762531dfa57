// Module for the in-memory materialized view registry
pub mod matview_registry;
pub mod registry_loader;
pub mod validated_lookup;

pub use matview_registry::{
    MaterializedViewDescriptor, MaterializedViewRegistry, RegistryConfig, RegistryStats,
};
pub use registry_loader::load_registry;
pub use validated_lookup::ValidatingLookup;
