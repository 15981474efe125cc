// Object type and field registration

use armature_query_core::reflect::{ArrayReflector, MetadataRegistry, ValueReflector};
use armature_query_core::ClassId;
use async_graphql::dynamic::TypeRef;
use serde_json::Value as JsonValue;
use tracing::debug;

pub const OBJECT_TYPE_KEY: &str = "armature-query:object-type";
pub const FIELDS_KEY: &str = "armature-query:fields";

/// Scalar type of a registered field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Id,
    String,
    Int,
    Float,
    Boolean,
    Json,
}

impl FieldType {
    /// GraphQL scalar name
    pub fn graphql_name(&self) -> &'static str {
        match self {
            FieldType::Id => TypeRef::ID,
            FieldType::String => TypeRef::STRING,
            FieldType::Int => TypeRef::INT,
            FieldType::Float => TypeRef::FLOAT,
            FieldType::Boolean => TypeRef::BOOLEAN,
            FieldType::Json => crate::types::JSON_SCALAR,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float)
    }

    /// Whether min/max aggregates make sense for this type
    pub fn is_comparable(&self) -> bool {
        !matches!(self, FieldType::Boolean | FieldType::Json)
    }

    /// Convert a JSON value read from a record into a GraphQL value
    ///
    /// Numeric ids are rendered as strings.
    pub fn to_graphql_value(&self, value: &JsonValue) -> async_graphql::Result<async_graphql::Value> {
        match (self, value) {
            (FieldType::Id, JsonValue::Number(n)) => Ok(async_graphql::Value::String(n.to_string())),
            _ => Ok(async_graphql::Value::from_json(value.clone())?),
        }
    }
}

/// One scalar field of an object type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetadata {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    pub description: Option<String>,
}

impl FieldMetadata {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
            description: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn type_ref(&self) -> TypeRef {
        if self.nullable {
            TypeRef::named(self.field_type.graphql_name())
        } else {
            TypeRef::named_nn(self.field_type.graphql_name())
        }
    }
}

/// Name and description of an object type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTypeMetadata {
    pub name: String,
    pub description: Option<String>,
}

/// Registration builder for a GraphQL object type
///
/// # Example
///
/// ```
/// use armature_query_core::{ClassId, MetadataRegistry};
/// use armature_query_graphql::decorators::{FieldMetadata, FieldType, ObjectType, find_object_type, get_fields};
///
/// struct TodoItem;
///
/// let registry = MetadataRegistry::new();
/// ObjectType::new("TodoItem")
///     .field(FieldMetadata::new("id", FieldType::Id))
///     .field(FieldMetadata::new("title", FieldType::String))
///     .register(&registry, ClassId::of::<TodoItem>());
///
/// let meta = find_object_type(&registry, ClassId::of::<TodoItem>()).unwrap();
/// assert_eq!(meta.name, "TodoItem");
/// assert_eq!(get_fields(&registry, ClassId::of::<TodoItem>()).len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ObjectType {
    metadata: ObjectTypeMetadata,
    fields: Vec<FieldMetadata>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectTypeMetadata {
                name: name.into(),
                description: None,
            },
            fields: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: FieldMetadata) -> Self {
        self.fields.push(field);
        self
    }

    pub fn register(self, registry: &MetadataRegistry, class: ClassId) {
        debug!(
            object_type = %self.metadata.name,
            class = class.type_name(),
            fields = self.fields.len(),
            "Registering object type"
        );
        ValueReflector::with_registry(OBJECT_TYPE_KEY, registry).set(class, self.metadata);
        for field in self.fields {
            register_field(registry, class, field);
        }
    }
}

/// Append a single field to a class
pub fn register_field(registry: &MetadataRegistry, class: ClassId, field: FieldMetadata) {
    ArrayReflector::with_registry(FIELDS_KEY, registry).append(class, field);
}

pub fn find_object_type(registry: &MetadataRegistry, class: ClassId) -> Option<ObjectTypeMetadata> {
    ValueReflector::with_registry(OBJECT_TYPE_KEY, registry).get(class)
}

/// Registered fields in registration order; empty when none were registered
pub fn get_fields(registry: &MetadataRegistry, class: ClassId) -> Vec<FieldMetadata> {
    ArrayReflector::with_registry(FIELDS_KEY, registry)
        .get(class)
        .unwrap_or_default()
}

/// GraphQL name of `class`, falling back to the Rust type name
pub fn graphql_type_name(registry: &MetadataRegistry, class: ClassId) -> String {
    find_object_type(registry, class)
        .map(|meta| meta.name)
        .unwrap_or_else(|| class.short_name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct TodoItem;
    struct Unregistered;

    #[test]
    fn test_fields_accumulate_in_order() {
        let registry = MetadataRegistry::new();
        let class = ClassId::of::<TodoItem>();
        ObjectType::new("TodoItem")
            .field(FieldMetadata::new("id", FieldType::Id))
            .register(&registry, class);
        register_field(
            &registry,
            class,
            FieldMetadata::new("priority", FieldType::Int).nullable(true),
        );

        let names: Vec<_> = get_fields(&registry, class)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["id", "priority"]);
    }

    #[test]
    fn test_type_name_fallback() {
        let registry = MetadataRegistry::new();
        assert!(find_object_type(&registry, ClassId::of::<Unregistered>()).is_none());
        assert_eq!(
            graphql_type_name(&registry, ClassId::of::<Unregistered>()),
            "Unregistered"
        );
        assert!(get_fields(&registry, ClassId::of::<Unregistered>()).is_empty());
    }

    #[test]
    fn test_type_ref_nullability() {
        assert_eq!(FieldMetadata::new("id", FieldType::Id).type_ref().to_string(), "ID!");
        assert_eq!(
            FieldMetadata::new("note", FieldType::String)
                .nullable(true)
                .type_ref()
                .to_string(),
            "String"
        );
    }

    #[test]
    fn test_numeric_ids_render_as_strings() {
        let value = FieldType::Id.to_graphql_value(&json!(42)).unwrap();
        assert_eq!(value, async_graphql::Value::String("42".to_string()));

        let value = FieldType::Int.to_graphql_value(&json!(42)).unwrap();
        assert_eq!(value, async_graphql::Value::from(42));
    }
}
