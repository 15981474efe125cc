// Relation capability composition

use super::{
    AggregateRelationsResolver, ReadRelationsResolver, ReferencesRelationResolver,
    RelationContext, RemoveRelationsResolver, UpdateRelationsResolver,
};
use crate::config::RelatableOpts;
use crate::resolvers::resolver::{ResolverField, ResolverLayer, ServiceResolver};
use crate::types::NamedType;
use armature_query_core::reflect::MetadataRegistry;
use armature_query_core::{ClassId, Dto, QueryService};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// Adds relation capabilities to a service resolver
///
/// Relations and references registered for `DTO` are read once when
/// [`apply`](Self::apply) runs. The layers are applied in a fixed order:
/// remove, update, read, aggregate, references. A later layer's field wins
/// over an earlier one with the same target and name.
///
/// # Example
///
/// ```
/// use armature_query_core::{MetadataRegistry, QueryService, Result};
/// use armature_query_graphql::{BaseServiceResolver, Relatable, RelatableOpts};
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
///     async fn find_by_id(&self, _id: &str) -> Result<Option<TodoItem>> {
///         Ok(None)
///     }
/// }
///
/// let registry = MetadataRegistry::new();
/// let base = BaseServiceResolver::<TodoItem>::new(&registry, Arc::new(TodoItemService));
/// let resolver = Relatable::<TodoItem>::new(RelatableOpts::new()).apply(base);
///
/// // Nothing registered for TodoItem, so nothing is added
/// assert!(resolver.added_fields().is_empty());
/// ```
pub struct Relatable<DTO: Dto> {
    opts: RelatableOpts,
    _dto: PhantomData<fn() -> DTO>,
}

impl<DTO: Dto> Relatable<DTO> {
    pub fn new(opts: RelatableOpts) -> Self {
        Self {
            opts,
            _dto: PhantomData,
        }
    }

    pub fn opts(&self) -> RelatableOpts {
        self.opts
    }

    pub fn apply<B: ServiceResolver<DTO>>(&self, base: B) -> RelatableResolver<DTO, B> {
        let ctx = RelationContext::from_resolver(&base);
        let relations = ctx.relations();
        let references = ctx.references();

        info!(
            dto = %ctx.dto_name,
            one = relations.one.len(),
            many = relations.many.len(),
            references = references.len(),
            enable_total_count = self.opts.enable_total_count,
            enable_aggregate = self.opts.enable_aggregate,
            "Composing relatable resolver"
        );

        RelatableResolver {
            remove: RemoveRelationsResolver::new(ctx.clone(), &relations),
            update: UpdateRelationsResolver::new(ctx.clone(), &relations),
            read: ReadRelationsResolver::new(
                ctx.clone(),
                &relations,
                self.opts.enable_total_count,
            ),
            aggregate: AggregateRelationsResolver::new(
                ctx.clone(),
                &relations,
                self.opts.enable_aggregate,
            ),
            references: ReferencesRelationResolver::new(ctx, references),
            base,
        }
    }
}

/// A service resolver together with its relation capability layers
pub struct RelatableResolver<DTO: Dto, B> {
    base: B,
    remove: RemoveRelationsResolver<DTO>,
    update: UpdateRelationsResolver<DTO>,
    read: ReadRelationsResolver<DTO>,
    aggregate: AggregateRelationsResolver<DTO>,
    references: ReferencesRelationResolver<DTO>,
}

impl<DTO: Dto, B: ServiceResolver<DTO>> RelatableResolver<DTO, B> {
    pub fn base(&self) -> &B {
        &self.base
    }

    /// Capability layers in application order
    pub fn layers(&self) -> [&dyn ResolverLayer; 5] {
        [
            &self.remove,
            &self.update,
            &self.read,
            &self.aggregate,
            &self.references,
        ]
    }

    /// Fields added on top of the base resolver
    pub fn added_fields(&self) -> Vec<ResolverField> {
        self.layers()
            .into_iter()
            .flat_map(|layer| {
                let fields = layer.fields();
                debug!(layer = layer.layer_name(), fields = fields.len(), "Collected layer fields");
                fields
            })
            .collect()
    }
}

impl<DTO: Dto, B: ServiceResolver<DTO>> ResolverLayer for RelatableResolver<DTO, B> {
    fn layer_name(&self) -> &'static str {
        "relatable"
    }

    fn fields(&self) -> Vec<ResolverField> {
        let mut fields = self.base.fields();
        fields.extend(self.added_fields());
        fields
    }

    fn types(&self) -> Vec<NamedType> {
        let mut types = self.base.types();
        for layer in self.layers() {
            types.extend(layer.types());
        }
        types
    }

    fn object_classes(&self) -> Vec<ClassId> {
        let mut classes = self.base.object_classes();
        for layer in self.layers() {
            classes.extend(layer.object_classes());
        }
        classes
    }
}

impl<DTO: Dto, B: ServiceResolver<DTO>> ServiceResolver<DTO> for RelatableResolver<DTO, B> {
    fn service(&self) -> Arc<dyn QueryService<DTO>> {
        self.base.service()
    }

    fn registry(&self) -> &MetadataRegistry {
        self.base.registry()
    }

    fn dto_class(&self) -> ClassId {
        self.base.dto_class()
    }
}
