//! Resolver layers and relation capabilities

mod args;
pub mod relations;
mod resolver;

pub use relations::{
    AggregateRelationsResolver, MutationField, ReadRelationsResolver, ReferencesRelationResolver,
    Relatable, RelatableResolver, RelationContext, RelationMutation, RemoveRelationsResolver,
    UpdateRelationsResolver,
};
pub use resolver::{BaseServiceResolver, FieldTarget, ResolverField, ResolverLayer, ServiceResolver};
