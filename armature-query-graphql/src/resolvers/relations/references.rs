// References layer

use super::RelationContext;
use crate::decorators::ReferenceDescriptor;
use crate::resolvers::args::parent_json;
use crate::resolvers::resolver::{ResolverField, ResolverLayer};
use armature_query_core::{ClassId, Dto};
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, TypeRef};
use serde_json::{Map, Value as JsonValue};

/// Record stub made of the referenced key fields, or `None` when any key
/// is missing from the parent
pub(crate) fn reference_stub(parent: &JsonValue, keys: &[(String, String)]) -> Option<JsonValue> {
    let mut stub = Map::new();
    for (reference_field, dto_field) in keys {
        match parent.get(dto_field) {
            None | Some(JsonValue::Null) => return None,
            Some(value) => {
                stub.insert(reference_field.clone(), value.clone());
            }
        }
    }
    Some(JsonValue::Object(stub))
}

/// Adds an object field per reference, resolved from the parent's key fields
/// without calling the query service
pub struct ReferencesRelationResolver<DTO: Dto> {
    ctx: RelationContext<DTO>,
    references: Vec<ReferenceDescriptor>,
}

impl<DTO: Dto> ReferencesRelationResolver<DTO> {
    pub fn new(ctx: RelationContext<DTO>, references: Vec<ReferenceDescriptor>) -> Self {
        Self { ctx, references }
    }

    fn reference_field(&self, reference: &ReferenceDescriptor) -> ResolverField {
        let related_type = self.ctx.related_type_name(reference.class);
        let type_ref = if reference.nullable {
            TypeRef::named(&related_type)
        } else {
            TypeRef::named_nn(&related_type)
        };
        let keys = reference.keys.clone();

        let field = Field::new(reference.name.clone(), type_ref, move |rctx| {
            let keys = keys.clone();
            FieldFuture::new(async move {
                let parent = parent_json(&rctx)?;
                Ok(reference_stub(parent, &keys).map(FieldValue::owned_any))
            })
        });
        ResolverField::object(&self.ctx.dto_name, &reference.name, field)
    }
}

impl<DTO: Dto> ResolverLayer for ReferencesRelationResolver<DTO> {
    fn layer_name(&self) -> &'static str {
        "references"
    }

    fn fields(&self) -> Vec<ResolverField> {
        self.references
            .iter()
            .map(|r| self.reference_field(r))
            .collect()
    }

    fn object_classes(&self) -> Vec<ClassId> {
        self.references.iter().map(|r| r.class).collect()
    }
}
