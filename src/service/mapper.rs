//! Mapping between a resource's create shape, its model and its read shape.

use crate::domain::Model;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Declares the three shapes of one REST resource.
///
/// `Create` is the request body of POST and PUT, `Read` the response body.
pub trait Mapper: Send + Sync + 'static {
    type Model: Model;
    type Create: DeserializeOwned + Send + 'static;
    type Read: Serialize + Send + 'static;

    fn to_model(create: Self::Create) -> Self::Model;

    fn to_read(model: Self::Model) -> Self::Read;
}

/// Uses the model itself as both the create and the read shape.
pub struct ModelMapper<M>(PhantomData<fn() -> M>);

impl<M: Model> Mapper for ModelMapper<M> {
    type Model = M;
    type Create = M;
    type Read = M;

    fn to_model(create: M) -> M {
        create
    }

    fn to_read(model: M) -> M {
        model
    }
}
