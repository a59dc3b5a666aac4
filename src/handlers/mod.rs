//! HTTP handlers for resource CRUD.

pub mod crud;
pub use crud::{link_header, location};
