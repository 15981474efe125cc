// Aggregate response types

use super::NamedType;
use crate::decorators::{FieldMetadata, FieldType, get_fields, graphql_type_name};
use armature_query_core::reflect::{MapReflector, MetadataRegistry};
use armature_query_core::{AggregateQuery, AggregateResponse, ClassId};
use async_graphql::SelectionField;
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, Object, TypeRef};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

pub const AGGREGATE_RESPONSE_KEY: &str = "armature-query:aggregate-response-type";

pub const AGGREGATE_FUNCTIONS: [&str; 5] = ["count", "sum", "avg", "min", "max"];

/// One aggregate function group, e.g. `SubTaskSumAggregate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateGroupDef {
    pub function: &'static str,
    pub type_name: String,
    /// Field name and GraphQL output type name
    pub fields: Vec<(String, String)>,
}

/// Definition of `{Dto}AggregateResponse` and its group types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateTypeDef {
    pub name: String,
    pub groups: Vec<AggregateGroupDef>,
}

impl AggregateTypeDef {
    /// Definition for `class`, computed once per registry
    pub fn for_class(registry: &MetadataRegistry, class: ClassId) -> Arc<Self> {
        let dto_name = graphql_type_name(registry, class);
        let name = format!("{}AggregateResponse", dto_name);
        MapReflector::<String, Arc<AggregateTypeDef>>::with_registry(AGGREGATE_RESPONSE_KEY, registry)
            .memoize(class, name.clone(), || {
                trace!(aggregate_type = %name, "Building aggregate response type");
                Arc::new(Self::build(name.clone(), &dto_name, &get_fields(registry, class)))
            })
    }

    fn build(name: String, dto_name: &str, fields: &[FieldMetadata]) -> Self {
        let groups = AGGREGATE_FUNCTIONS
            .iter()
            .copied()
            .filter_map(|function| {
                let fields: Vec<_> = fields
                    .iter()
                    .filter_map(|field| {
                        group_output_type(function, field.field_type)
                            .map(|output| (field.name.clone(), output.to_string()))
                    })
                    .collect();
                if fields.is_empty() {
                    return None;
                }
                Some(AggregateGroupDef {
                    function,
                    type_name: format!("{}{}Aggregate", dto_name, capitalize(function)),
                    fields,
                })
            })
            .collect();

        Self { name, groups }
    }

    /// Dynamic types for the response and each group
    pub fn to_types(&self) -> Vec<NamedType> {
        let mut types = Vec::with_capacity(self.groups.len() + 1);
        let mut response = Object::new(&self.name);

        for group in &self.groups {
            let function = group.function;
            response = response.field(Field::new(
                function,
                TypeRef::named(&group.type_name),
                move |ctx| {
                    FieldFuture::new(async move {
                        let response = ctx.parent_value.try_downcast_ref::<AggregateResponse>()?;
                        Ok(response
                            .group(function)
                            .map(|values| FieldValue::owned_any(values.clone())))
                    })
                },
            ));

            let mut object = Object::new(&group.type_name);
            for (field, output) in &group.fields {
                object = object.field(group_field(field, output));
            }
            types.push(NamedType::new(group.type_name.clone(), object));
        }

        types.insert(0, NamedType::new(self.name.clone(), response));
        types
    }
}

/// Output type of `function` over a field, or `None` when it does not apply
fn group_output_type(function: &str, field_type: FieldType) -> Option<&'static str> {
    match function {
        "count" => Some(TypeRef::INT),
        "sum" | "avg" if field_type.is_numeric() => Some(TypeRef::FLOAT),
        "min" | "max" if field_type.is_comparable() => Some(field_type.graphql_name()),
        _ => None,
    }
}

fn group_field(name: &str, output: &str) -> Field {
    let key = name.to_string();
    Field::new(name, TypeRef::named(output), move |ctx| {
        let key = key.clone();
        FieldFuture::new(async move {
            let values = ctx
                .parent_value
                .try_downcast_ref::<BTreeMap<String, JsonValue>>()?;
            match values.get(&key) {
                None | Some(JsonValue::Null) => Ok(None),
                Some(value) => Ok(Some(FieldValue::value(async_graphql::Value::from_json(
                    value.clone(),
                )?))),
            }
        })
    })
}

fn capitalize(function: &str) -> String {
    let mut chars = function.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Aggregate query for the functions and fields selected under `field`
///
/// `count { id }` requests the count of `id`. Introspection fields are ignored.
pub fn aggregate_query_from_selection(field: SelectionField<'_>) -> AggregateQuery {
    let mut query = AggregateQuery::default();
    for group in field.selection_set() {
        if group.name().starts_with("__") {
            continue;
        }
        for selected in group.selection_set() {
            if selected.name().starts_with("__") {
                continue;
            }
            query.push(group.name(), selected.name());
        }
    }
    query
}
