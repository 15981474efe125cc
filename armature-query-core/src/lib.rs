// Core library for Armature Query
// Class-keyed metadata reflection, the query model, and the query service seam

pub mod class;
pub mod error;
pub mod logging;
pub mod query;
pub mod reflect;
pub mod service;

pub use class::ClassId;
pub use error::{QueryError, Result};
pub use query::*;
pub use reflect::{
    ArrayReflector, MapReflector, MetadataRegistry, ValueReflector, class_metadata_decorator,
    get_class_metadata,
};
pub use service::{Dto, QueryService};
