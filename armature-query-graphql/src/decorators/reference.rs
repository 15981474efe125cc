// Reference registration

use armature_query_core::reflect::{ArrayReflector, MetadataRegistry};
use armature_query_core::ClassId;
use tracing::debug;

pub const REFERENCES_KEY: &str = "armature-query:references";

/// A related record identified by key fields copied from the parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDescriptor {
    pub name: String,
    pub class: ClassId,
    /// Pairs of (field on the referenced type, field on the parent)
    pub keys: Vec<(String, String)>,
    pub nullable: bool,
}

/// Registration builder for a reference
///
/// ```
/// use armature_query_core::{ClassId, MetadataRegistry};
/// use armature_query_graphql::decorators::{Reference, get_references};
///
/// struct TodoItem;
/// struct User;
///
/// let registry = MetadataRegistry::new();
/// Reference::new("owner", ClassId::of::<User>())
///     .key("id", "ownerId")
///     .register(&registry, ClassId::of::<TodoItem>());
///
/// let references = get_references(&registry, ClassId::of::<TodoItem>());
/// assert_eq!(references[0].keys, vec![("id".to_string(), "ownerId".to_string())]);
/// ```
#[derive(Debug, Clone)]
pub struct Reference {
    descriptor: ReferenceDescriptor,
}

impl Reference {
    pub fn new(name: impl Into<String>, class: ClassId) -> Self {
        Self {
            descriptor: ReferenceDescriptor {
                name: name.into(),
                class,
                keys: Vec::new(),
                nullable: false,
            },
        }
    }

    pub fn key(mut self, reference_field: impl Into<String>, dto_field: impl Into<String>) -> Self {
        self.descriptor
            .keys
            .push((reference_field.into(), dto_field.into()));
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.descriptor.nullable = nullable;
        self
    }

    pub fn register(self, registry: &MetadataRegistry, owner: ClassId) {
        debug!(
            reference = %self.descriptor.name,
            owner = owner.type_name(),
            keys = self.descriptor.keys.len(),
            "Registering reference"
        );
        ArrayReflector::with_registry(REFERENCES_KEY, registry).append(owner, self.descriptor);
    }
}

pub fn get_references(registry: &MetadataRegistry, class: ClassId) -> Vec<ReferenceDescriptor> {
    ArrayReflector::with_registry(REFERENCES_KEY, registry)
        .get(class)
        .unwrap_or_default()
}
