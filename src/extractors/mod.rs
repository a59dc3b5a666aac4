//! Request extractors for the CRUD handlers.

mod paging;
mod request;

pub use paging::{DefaultPageSize, Pageable, SortParam};
pub use request::{IdPath, RequestUrl, ValidJson, FORWARDED_PROTO_HEADER};
