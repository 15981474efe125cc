// Entity object types built from registered metadata

use super::{NamedType, json_scalar};
use crate::decorators::{FieldMetadata, FieldType, find_object_type, get_fields};
use armature_query_core::reflect::MetadataRegistry;
use armature_query_core::{ClassId, QueryError, Result};
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, Object};
use serde_json::Value as JsonValue;

/// Object type for `class` with one resolver per registered field
///
/// Records are carried as JSON objects; each field reads its own key and
/// resolves to null when the key is missing.
pub fn entity_object(registry: &MetadataRegistry, class: ClassId) -> Result<Object> {
    let meta = find_object_type(registry, class).ok_or_else(|| {
        QueryError::Schema(format!("No object type registered for {}", class.type_name()))
    })?;

    let fields = get_fields(registry, class);
    if fields.is_empty() {
        return Err(QueryError::Schema(format!(
            "Object type {} has no fields",
            meta.name
        )));
    }

    let mut object = Object::new(&meta.name);
    if let Some(description) = meta.description {
        object = object.description(description);
    }
    for field in fields {
        object = object.field(scalar_field(field));
    }
    Ok(object)
}

/// Support types the fields of `class` refer to
pub fn entity_types(registry: &MetadataRegistry, class: ClassId) -> Vec<NamedType> {
    let fields = get_fields(registry, class);
    if fields.iter().any(|f| f.field_type == FieldType::Json) {
        vec![json_scalar()]
    } else {
        Vec::new()
    }
}

fn scalar_field(meta: FieldMetadata) -> Field {
    let key = meta.name.clone();
    let field_type = meta.field_type;

    let mut field = Field::new(meta.name.clone(), meta.type_ref(), move |ctx| {
        let key = key.clone();
        FieldFuture::new(async move {
            let record = ctx.parent_value.try_downcast_ref::<JsonValue>()?;
            match record.get(&key) {
                None | Some(JsonValue::Null) => Ok(None),
                Some(value) => Ok(Some(FieldValue::value(field_type.to_graphql_value(value)?))),
            }
        })
    });
    if let Some(description) = meta.description {
        field = field.description(description);
    }
    field
}
