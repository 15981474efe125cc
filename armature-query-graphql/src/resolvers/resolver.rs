// Resolver layer traits and the base service resolver

use super::args::{arg_id, to_field_value};
use crate::decorators::graphql_type_name;
use crate::types::NamedType;
use armature_query_core::reflect::MetadataRegistry;
use armature_query_core::{ClassId, Dto, QueryService};
use async_graphql::dynamic::{Field, FieldFuture, InputValue, TypeRef};
use heck::ToLowerCamelCase;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Where a resolver field is attached in the schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldTarget {
    Query,
    Mutation,
    /// Field on the named object type
    Object(String),
}

impl fmt::Display for FieldTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldTarget::Query => f.write_str("Query"),
            FieldTarget::Mutation => f.write_str("Mutation"),
            FieldTarget::Object(name) => f.write_str(name),
        }
    }
}

/// A GraphQL field contributed by a resolver layer
pub struct ResolverField {
    pub name: String,
    pub target: FieldTarget,
    pub field: Field,
}

impl ResolverField {
    pub fn new(target: FieldTarget, name: impl Into<String>, field: Field) -> Self {
        Self {
            name: name.into(),
            target,
            field,
        }
    }

    pub fn query(name: impl Into<String>, field: Field) -> Self {
        Self::new(FieldTarget::Query, name, field)
    }

    pub fn mutation(name: impl Into<String>, field: Field) -> Self {
        Self::new(FieldTarget::Mutation, name, field)
    }

    pub fn object(type_name: impl Into<String>, name: impl Into<String>, field: Field) -> Self {
        Self::new(FieldTarget::Object(type_name.into()), name, field)
    }

    /// `(target, name)` pair identifying the field in the schema
    pub fn key(&self) -> (FieldTarget, String) {
        (self.target.clone(), self.name.clone())
    }
}

impl fmt::Debug for ResolverField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverField")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish()
    }
}

/// A unit of schema contributed by a resolver
///
/// Layers are built once at bootstrap and asked for their fields when the
/// schema is assembled.
pub trait ResolverLayer: Send + Sync {
    fn layer_name(&self) -> &'static str;

    fn fields(&self) -> Vec<ResolverField>;

    /// Support types the fields refer to
    fn types(&self) -> Vec<NamedType> {
        Vec::new()
    }

    /// Classes whose object types the fields refer to
    fn object_classes(&self) -> Vec<ClassId> {
        Vec::new()
    }

    fn field_keys(&self) -> Vec<(FieldTarget, String)> {
        self.fields().iter().map(ResolverField::key).collect()
    }
}

/// A resolver backed by a [`QueryService`] for one DTO type
pub trait ServiceResolver<DTO: Dto>: ResolverLayer {
    fn service(&self) -> Arc<dyn QueryService<DTO>>;

    fn registry(&self) -> &MetadataRegistry;

    fn dto_class(&self) -> ClassId {
        ClassId::of::<DTO>()
    }
}

/// Minimal resolver exposing `{dto}(id: ID!): Dto`
pub struct BaseServiceResolver<DTO: Dto> {
    registry: MetadataRegistry,
    service: Arc<dyn QueryService<DTO>>,
}

impl<DTO: Dto> BaseServiceResolver<DTO> {
    pub fn new(registry: &MetadataRegistry, service: Arc<dyn QueryService<DTO>>) -> Self {
        debug!(dto = std::any::type_name::<DTO>(), "Creating base service resolver");
        Self {
            registry: registry.clone(),
            service,
        }
    }
}

impl<DTO: Dto> ResolverLayer for BaseServiceResolver<DTO> {
    fn layer_name(&self) -> &'static str {
        "base"
    }

    fn fields(&self) -> Vec<ResolverField> {
        let dto_name = graphql_type_name(&self.registry, self.dto_class());
        let name = dto_name.to_lower_camel_case();
        let service = self.service.clone();

        let field = Field::new(name.clone(), TypeRef::named(&dto_name), move |ctx| {
            let service = service.clone();
            FieldFuture::new(async move {
                let id = arg_id(&ctx, "id")?;
                match service.find_by_id(&id).await? {
                    Some(dto) => Ok(Some(to_field_value(&dto)?)),
                    None => Ok(None),
                }
            })
        })
        .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID)));

        vec![ResolverField::query(name, field)]
    }

    fn object_classes(&self) -> Vec<ClassId> {
        vec![self.dto_class()]
    }
}

impl<DTO: Dto> ServiceResolver<DTO> for BaseServiceResolver<DTO> {
    fn service(&self) -> Arc<dyn QueryService<DTO>> {
        self.service.clone()
    }

    fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }
}
