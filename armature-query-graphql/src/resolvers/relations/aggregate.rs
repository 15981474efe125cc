// Aggregate relations layer

use super::RelationContext;
use crate::decorators::{RelationDescriptor, RelationsOpts};
use crate::resolvers::args::{parent_dto, parse_arg};
use crate::resolvers::resolver::{ResolverField, ResolverLayer};
use crate::types::{AggregateTypeDef, JSON_SCALAR, NamedType, aggregate_query_from_selection, json_scalar};
use armature_query_core::{ClassId, Dto, Filter};
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, InputValue, TypeRef};
use tracing::trace;

/// Adds `{rel}Aggregate(filter)` for many relations with aggregation enabled
pub struct AggregateRelationsResolver<DTO: Dto> {
    ctx: RelationContext<DTO>,
    relations: Vec<RelationDescriptor>,
}

impl<DTO: Dto> AggregateRelationsResolver<DTO> {
    /// Keep readable many relations where either `enable_aggregate` or the
    /// relation's own switch is on
    pub fn new(ctx: RelationContext<DTO>, relations: &RelationsOpts, enable_aggregate: bool) -> Self {
        let relations = relations
            .many
            .iter()
            .filter(|r| !r.disable_read && (enable_aggregate || r.enable_aggregate))
            .cloned()
            .collect();
        Self { ctx, relations }
    }

    fn aggregate_field(&self, relation: &RelationDescriptor) -> ResolverField {
        let def = AggregateTypeDef::for_class(&self.ctx.registry, relation.class);
        let name = format!("{}Aggregate", relation.name);
        let service = self.ctx.service.clone();
        let relation_name = relation.service_relation_name().to_string();

        let field = Field::new(name.clone(), TypeRef::named_nn(&def.name), move |rctx| {
            let service = service.clone();
            let relation_name = relation_name.clone();
            FieldFuture::new(async move {
                let dto: DTO = parent_dto(&rctx)?;
                let filter = parse_arg::<Filter>(&rctx, "filter")?.unwrap_or_else(Filter::empty);
                let aggregate = aggregate_query_from_selection(rctx.ctx.field());
                trace!(relation = %relation_name, ?aggregate, "Resolving relation aggregate");

                let response = service
                    .aggregate_relations(&relation_name, &dto, &filter, &aggregate)
                    .await?;
                Ok(Some(FieldValue::owned_any(response)))
            })
        })
        .argument(InputValue::new("filter", TypeRef::named(JSON_SCALAR)));

        ResolverField::object(&self.ctx.dto_name, name, field)
    }
}

impl<DTO: Dto> ResolverLayer for AggregateRelationsResolver<DTO> {
    fn layer_name(&self) -> &'static str {
        "aggregate-relations"
    }

    fn fields(&self) -> Vec<ResolverField> {
        self.relations
            .iter()
            .map(|r| self.aggregate_field(r))
            .collect()
    }

    fn types(&self) -> Vec<NamedType> {
        if self.relations.is_empty() {
            return Vec::new();
        }
        let mut types = vec![json_scalar()];
        for relation in &self.relations {
            types.extend(AggregateTypeDef::for_class(&self.ctx.registry, relation.class).to_types());
        }
        types
    }

    fn object_classes(&self) -> Vec<ClassId> {
        self.relations.iter().map(|r| r.class).collect()
    }
}
