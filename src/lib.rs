// In-memory materialized-view registry kept consistent with a durable catalog
pub mod cache;
pub mod catalog;
pub mod ddl;
pub mod metadata;
pub mod session;

pub use cache::{
    MaterializedViewDescriptor, MaterializedViewRegistry, RegistryConfig, RegistryStats,
    ValidatingLookup, load_registry,
};
pub use catalog::{
    CatalogClient, CatalogError, CatalogObject, InMemoryCatalog, ObjectDefinition, ObjectKind,
    SqliteCatalog, SqliteCatalogConfig,
};
pub use ddl::{
    DdlContext, DropError, DropMaterializedViewDesc, DropMaterializedViewOperation,
    drop_materialized_view,
};
pub use metadata::{NameError, QualifiedName};
pub use session::{WriteEntity, WriteEntitySet, WriteType};
