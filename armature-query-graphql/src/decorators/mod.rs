//! Registration helpers that record GraphQL metadata for DTO classes

mod object_type;
mod reference;
mod relation;

pub use object_type::{
    FIELDS_KEY, FieldMetadata, FieldType, OBJECT_TYPE_KEY, ObjectType, ObjectTypeMetadata,
    find_object_type, get_fields, graphql_type_name, register_field,
};
pub use reference::{REFERENCES_KEY, Reference, ReferenceDescriptor, get_references};
pub use relation::{
    DEFAULT_RESULT_SIZE, MAX_RESULTS_SIZE, PagingStrategy, RELATIONS_KEY, Relation,
    RelationDescriptor, RelationsOpts, get_relations,
};
