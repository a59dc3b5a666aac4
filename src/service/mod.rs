//! CrudService and resource mappers.

mod crud;
mod mapper;
pub use crud::CrudService;
pub use mapper::{Mapper, ModelMapper};
