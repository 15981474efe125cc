// Relation registration

use armature_query_core::reflect::{ArrayReflector, MetadataRegistry};
use armature_query_core::ClassId;
use tracing::debug;

pub const RELATIONS_KEY: &str = "armature-query:relations";

pub const DEFAULT_RESULT_SIZE: u64 = 10;
pub const MAX_RESULTS_SIZE: u64 = 50;

/// How a many relation is paged when read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PagingStrategy {
    /// `limit`/`offset` paging with a `nodes` connection
    #[default]
    Offset,
    /// Relay style `first`/`after` paging with an `edges` connection
    Cursor,
    /// Plain list, no paging
    None,
}

/// Everything the relation layers need to know about one relation
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDescriptor {
    /// GraphQL field name
    pub name: String,
    /// Relation name passed to the query service, if it differs from `name`
    pub relation_name: Option<String>,
    /// Class of the related DTO
    pub class: ClassId,
    pub is_many: bool,
    pub nullable: bool,
    pub disable_read: bool,
    pub disable_update: bool,
    pub disable_remove: bool,
    pub enable_total_count: bool,
    pub enable_aggregate: bool,
    pub paging_strategy: PagingStrategy,
    pub default_result_size: u64,
    pub max_results_size: u64,
}

impl RelationDescriptor {
    /// Name used when calling the query service
    pub fn service_relation_name(&self) -> &str {
        self.relation_name.as_deref().unwrap_or(&self.name)
    }
}

/// Registration builder for a relation
///
/// # Example
///
/// ```
/// use armature_query_core::{ClassId, MetadataRegistry};
/// use armature_query_graphql::decorators::{Relation, get_relations};
///
/// struct TodoItem;
/// struct User;
/// struct SubTask;
///
/// let registry = MetadataRegistry::new();
/// let todo = ClassId::of::<TodoItem>();
///
/// Relation::one("assignee", ClassId::of::<User>())
///     .nullable(true)
///     .register(&registry, todo);
/// Relation::many("subTasks", ClassId::of::<SubTask>())
///     .disable_remove()
///     .register(&registry, todo);
///
/// let relations = get_relations(&registry, todo);
/// assert_eq!(relations.one.len(), 1);
/// assert_eq!(relations.many[0].name, "subTasks");
/// ```
#[derive(Debug, Clone)]
pub struct Relation {
    descriptor: RelationDescriptor,
}

impl Relation {
    fn build(name: impl Into<String>, class: ClassId, is_many: bool, paging: PagingStrategy) -> Self {
        Self {
            descriptor: RelationDescriptor {
                name: name.into(),
                relation_name: None,
                class,
                is_many,
                nullable: false,
                disable_read: false,
                disable_update: false,
                disable_remove: false,
                enable_total_count: false,
                enable_aggregate: false,
                paging_strategy: paging,
                default_result_size: DEFAULT_RESULT_SIZE,
                max_results_size: MAX_RESULTS_SIZE,
            },
        }
    }

    /// Relation to a single record
    pub fn one(name: impl Into<String>, class: ClassId) -> Self {
        Self::build(name, class, false, PagingStrategy::None)
    }

    /// Relation to many records, read through an offset connection
    pub fn many(name: impl Into<String>, class: ClassId) -> Self {
        Self::build(name, class, true, PagingStrategy::Offset)
    }

    /// Relation to many records, read through a cursor connection
    pub fn cursor_connection(name: impl Into<String>, class: ClassId) -> Self {
        Self::build(name, class, true, PagingStrategy::Cursor)
    }

    /// Relation to many records, read as a plain list
    pub fn unpaged(name: impl Into<String>, class: ClassId) -> Self {
        Self::build(name, class, true, PagingStrategy::None)
    }

    pub fn relation_name(mut self, relation_name: impl Into<String>) -> Self {
        self.descriptor.relation_name = Some(relation_name.into());
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.descriptor.nullable = nullable;
        self
    }

    pub fn disable_read(mut self) -> Self {
        self.descriptor.disable_read = true;
        self
    }

    pub fn disable_update(mut self) -> Self {
        self.descriptor.disable_update = true;
        self
    }

    pub fn disable_remove(mut self) -> Self {
        self.descriptor.disable_remove = true;
        self
    }

    pub fn enable_total_count(mut self) -> Self {
        self.descriptor.enable_total_count = true;
        self
    }

    pub fn enable_aggregate(mut self) -> Self {
        self.descriptor.enable_aggregate = true;
        self
    }

    pub fn default_result_size(mut self, size: u64) -> Self {
        self.descriptor.default_result_size = size;
        self
    }

    pub fn max_results_size(mut self, size: u64) -> Self {
        self.descriptor.max_results_size = size;
        self
    }

    pub fn descriptor(&self) -> &RelationDescriptor {
        &self.descriptor
    }

    /// Attach the relation to `owner`
    pub fn register(self, registry: &MetadataRegistry, owner: ClassId) {
        debug!(
            relation = %self.descriptor.name,
            owner = owner.type_name(),
            target = self.descriptor.class.type_name(),
            many = self.descriptor.is_many,
            "Registering relation"
        );
        ArrayReflector::with_registry(RELATIONS_KEY, registry).append(owner, self.descriptor);
    }
}

/// Relations of one class split by cardinality, in registration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationsOpts {
    pub one: Vec<RelationDescriptor>,
    pub many: Vec<RelationDescriptor>,
}

impl RelationsOpts {
    pub fn is_empty(&self) -> bool {
        self.one.is_empty() && self.many.is_empty()
    }

    pub fn len(&self) -> usize {
        self.one.len() + self.many.len()
    }
}

/// Relations registered on `class`; empty when none were registered
pub fn get_relations(registry: &MetadataRegistry, class: ClassId) -> RelationsOpts {
    let descriptors = ArrayReflector::<RelationDescriptor>::with_registry(RELATIONS_KEY, registry)
        .get(class)
        .unwrap_or_default();

    let (many, one) = descriptors.into_iter().partition(|d| d.is_many);
    RelationsOpts { one, many }
}
