// Module for DDL operations on materialized views
pub mod context;
pub mod drop_materialized_view;

pub use context::DdlContext;
pub use drop_materialized_view::{
    DropError, DropMaterializedViewDesc, DropMaterializedViewOperation, drop_materialized_view,
};
