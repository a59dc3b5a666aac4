//! Framework-agnostic paging, sorting and model declarations.

pub mod model;
pub mod page;
pub mod sort;

pub use model::{resolve_sort, validate_model, Model, ID_FIELD};
pub use page::{Page, PageRequest};
pub use sort::{Direction, Order, Sort};
