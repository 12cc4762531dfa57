// Module for per-session bookkeeping
pub mod write_entity;

pub use write_entity::{WriteEntity, WriteEntitySet, WriteType};
