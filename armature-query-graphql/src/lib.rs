// GraphQL relation capabilities for Armature Query
// Registration helpers, relation resolver layers, and dynamic schema assembly

pub mod config;
pub mod decorators;
pub mod resolvers;
pub mod schema_builder;
pub mod types;

pub use async_graphql;
pub use async_graphql::dynamic::Schema;

pub use config::RelatableOpts;
pub use resolvers::{
    BaseServiceResolver, FieldTarget, Relatable, RelatableResolver, ResolverField, ResolverLayer,
    ServiceResolver,
};
pub use schema_builder::{FieldSet, ResolverSchemaBuilder};
