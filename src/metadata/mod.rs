// Module for catalog object naming
pub mod qualified_name;

pub use qualified_name::{NameError, QualifiedName};
