// Dynamic schema assembly from resolver layers

use crate::resolvers::{FieldTarget, ResolverField, ResolverLayer};
use crate::types::{TypeSet, entity_object, entity_types};
use armature_query_core::reflect::MetadataRegistry;
use armature_query_core::{ClassId, QueryError, Result};
use async_graphql::dynamic::{Object, Schema, SchemaBuilder};
use std::any::Any;
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub const QUERY_ROOT: &str = "Query";
pub const MUTATION_ROOT: &str = "Mutation";

type DataFn = Box<dyn FnOnce(SchemaBuilder) -> SchemaBuilder + Send>;

/// Fields keyed by target and name where a later insert replaces an earlier one
#[derive(Debug, Default)]
pub struct FieldSet {
    index: HashMap<(FieldTarget, String), usize>,
    fields: Vec<ResolverField>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `field`; returns `true` when it shadowed an existing field
    pub fn insert(&mut self, field: ResolverField) -> bool {
        let key = field.key();
        match self.index.get(&key) {
            Some(&position) => {
                warn!(
                    target_type = %key.0,
                    field = %key.1,
                    "Field redefined, later definition wins"
                );
                self.fields[position] = field;
                true
            }
            None => {
                self.index.insert(key, self.fields.len());
                self.fields.push(field);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Split into fields per target, keeping insertion order
    fn into_targets(self) -> (Vec<ResolverField>, Vec<ResolverField>, Vec<ResolverField>) {
        let mut query = Vec::new();
        let mut mutation = Vec::new();
        let mut object = Vec::new();
        for field in self.fields {
            match field.target {
                FieldTarget::Query => query.push(field),
                FieldTarget::Mutation => mutation.push(field),
                FieldTarget::Object(_) => object.push(field),
            }
        }
        (query, mutation, object)
    }
}

/// Builds an executable dynamic schema from resolver layers
///
/// # Example
///
/// ```
/// use armature_query_core::{MetadataRegistry, QueryService, Result};
/// use armature_query_graphql::decorators::{FieldMetadata, FieldType, ObjectType};
/// use armature_query_graphql::{BaseServiceResolver, Relatable, RelatableOpts, ResolverSchemaBuilder};
/// use armature_query_core::ClassId;
/// use async_trait::async_trait;
/// use serde::{Deserialize, Serialize};
/// use std::sync::Arc;
///
/// #[derive(Serialize, Deserialize)]
/// struct TodoItem {
///     id: String,
/// }
///
/// struct TodoItemService;
///
/// #[async_trait]
/// impl QueryService<TodoItem> for TodoItemService {
///     async fn find_by_id(&self, id: &str) -> Result<Option<TodoItem>> {
///         Ok(Some(TodoItem { id: id.to_string() }))
///     }
/// }
///
/// let registry = MetadataRegistry::new();
/// ObjectType::new("TodoItem")
///     .field(FieldMetadata::new("id", FieldType::Id))
///     .register(&registry, ClassId::of::<TodoItem>());
///
/// let base = BaseServiceResolver::<TodoItem>::new(&registry, Arc::new(TodoItemService));
/// let schema = ResolverSchemaBuilder::new(&registry)
///     .resolver(Relatable::<TodoItem>::new(RelatableOpts::new()).apply(base))
///     .build()
///     .unwrap();
///
/// assert!(schema.sdl().contains("todoItem(id: ID!): TodoItem"));
/// ```
pub struct ResolverSchemaBuilder {
    registry: MetadataRegistry,
    resolvers: Vec<Box<dyn ResolverLayer>>,
    data: Vec<DataFn>,
}

impl ResolverSchemaBuilder {
    pub fn new(registry: &MetadataRegistry) -> Self {
        Self {
            registry: registry.clone(),
            resolvers: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Add a resolver; later resolvers shadow earlier ones on name clashes
    pub fn resolver(mut self, resolver: impl ResolverLayer + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Add data available to resolvers through the GraphQL context
    pub fn data<D: Any + Send + Sync>(mut self, data: D) -> Self {
        self.data.push(Box::new(move |builder| builder.data(data)));
        self
    }

    pub fn build(self) -> Result<Schema> {
        let mut fields = FieldSet::new();
        let mut types = TypeSet::new();
        let mut classes: Vec<ClassId> = Vec::new();

        for resolver in &self.resolvers {
            debug!(resolver = resolver.layer_name(), "Collecting resolver");
            for field in resolver.fields() {
                fields.insert(field);
            }
            types.extend(resolver.types());
            for class in resolver.object_classes() {
                if !classes.contains(&class) {
                    classes.push(class);
                }
            }
        }

        let (query_fields, mutation_fields, object_fields) = fields.into_targets();
        if query_fields.is_empty() {
            return Err(QueryError::Schema(
                "Query root has no fields".to_string(),
            ));
        }

        let mut objects: Vec<Object> = Vec::with_capacity(classes.len());
        let mut object_index: HashMap<String, usize> = HashMap::new();
        for class in classes {
            let object = entity_object(&self.registry, class)?;
            types.extend(entity_types(&self.registry, class));
            let name = object.type_name().to_string();
            if object_index.contains_key(&name) {
                return Err(QueryError::Schema(format!(
                    "Object type {} is registered for more than one class",
                    name
                )));
            }
            object_index.insert(name, objects.len());
            objects.push(object);
        }

        for field in object_fields {
            let FieldTarget::Object(type_name) = &field.target else {
                continue;
            };
            let position = *object_index.get(type_name).ok_or_else(|| {
                QueryError::Schema(format!(
                    "Field {} targets unknown object type {}",
                    field.name, type_name
                ))
            })?;
            let object = std::mem::replace(&mut objects[position], Object::new(type_name));
            objects[position] = object.field(field.field);
        }

        let query = root_object(QUERY_ROOT, query_fields);
        let mutation = (!mutation_fields.is_empty()).then(|| root_object(MUTATION_ROOT, mutation_fields));

        info!(
            objects = objects.len(),
            support_types = types.len(),
            has_mutation = mutation.is_some(),
            "Building GraphQL schema"
        );

        let mut builder = Schema::build(
            QUERY_ROOT,
            mutation.as_ref().map(|_| MUTATION_ROOT),
            None,
        )
        .register(query);
        if let Some(mutation) = mutation {
            builder = builder.register(mutation);
        }
        for object in objects {
            builder = builder.register(object);
        }
        for ty in types {
            builder = builder.register(ty.into_type());
        }
        for data in self.data {
            builder = data(builder);
        }

        builder
            .finish()
            .map_err(|e| QueryError::Schema(e.to_string()))
    }
}

fn root_object(name: &str, fields: Vec<ResolverField>) -> Object {
    fields
        .into_iter()
        .fold(Object::new(name), |object, field| object.field(field.field))
}
