// Armature Query - relation-aware GraphQL resolvers for Armature
//
// This library records metadata about DTO classes (object types, relations,
// references) and composes GraphQL resolvers that expose those relations.

// Re-export core functionality
pub use armature_query_core::*;

// Re-export the GraphQL layer
#[cfg(feature = "graphql")]
pub use armature_query_graphql as graphql;

#[cfg(feature = "graphql")]
pub use armature_query_graphql::{
    BaseServiceResolver, Relatable, RelatableOpts, RelatableResolver, ResolverSchemaBuilder,
    ServiceResolver,
};

/// Prelude for common imports
///
/// ```
/// use armature_query::prelude::*;
///
/// let registry = MetadataRegistry::new();
/// assert!(!registry.has_metadata("armature-query:relations", ClassId::of::<String>()));
/// ```
pub mod prelude {
    pub use armature_query_core::{
        ClassId, Dto, Filter, MetadataRegistry, Query, QueryError, QueryService, Result,
    };

    #[cfg(feature = "graphql")]
    pub use armature_query_graphql::decorators::{
        FieldMetadata, FieldType, ObjectType, Reference, Relation,
    };
    #[cfg(feature = "graphql")]
    pub use armature_query_graphql::{
        BaseServiceResolver, Relatable, RelatableOpts, ResolverSchemaBuilder,
    };
}
