//! CRUD SDK: generic REST resources over relational and document repositories.
//!
//! Declare a [`Model`], pick a repository ([`SqlRepository`] or
//! [`DocumentRepository`]), describe the request/response shapes with a
//! [`Mapper`], and mount [`CrudEndpoints::router`].

pub mod config;
pub mod domain;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;

pub use config::{init_tracing, Settings};
pub use domain::{Direction, Model, Order, Page, PageRequest, Sort};
pub use error::{AppError, ConfigError, DataError, ServiceError};
pub use repository::{
    CrudRepository, DataResult, DocumentRepository, PagingRepository, SqlRepository, UnitOfWork,
};
pub use response::PageBody;
pub use routes::{common_routes, common_routes_with_ready, CrudEndpoints};
pub use service::{CrudService, Mapper, ModelMapper};
