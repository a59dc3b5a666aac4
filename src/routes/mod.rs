//! Route builders.

pub mod common;
pub mod crud;

pub use common::{common_routes, common_routes_with_ready};
pub use crud::{CrudEndpoints, DEFAULT_BODY_LIMIT};
