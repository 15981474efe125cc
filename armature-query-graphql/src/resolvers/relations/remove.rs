// Remove relations layer

use super::{MutationField, RelationContext, RelationMutation, mutation_field};
use crate::decorators::{RelationDescriptor, RelationsOpts};
use crate::resolvers::resolver::{ResolverField, ResolverLayer};
use crate::types::NamedType;
use armature_query_core::Dto;

/// Adds `remove{Rel}From{Dto}` mutations for relations that allow removal
pub struct RemoveRelationsResolver<DTO: Dto> {
    ctx: RelationContext<DTO>,
    relations: RelationsOpts,
}

impl<DTO: Dto> RemoveRelationsResolver<DTO> {
    pub fn new(ctx: RelationContext<DTO>, relations: &RelationsOpts) -> Self {
        let keep = |r: &&RelationDescriptor| !r.disable_remove;
        Self {
            relations: RelationsOpts {
                one: relations.one.iter().filter(keep).cloned().collect(),
                many: relations.many.iter().filter(keep).cloned().collect(),
            },
            ctx,
        }
    }

    fn mutations(&self) -> Vec<MutationField> {
        let one = self
            .relations
            .one
            .iter()
            .map(|r| mutation_field(&self.ctx, r, RelationMutation::RemoveOne));
        let many = self
            .relations
            .many
            .iter()
            .map(|r| mutation_field(&self.ctx, r, RelationMutation::RemoveMany));
        one.chain(many).collect()
    }
}

impl<DTO: Dto> ResolverLayer for RemoveRelationsResolver<DTO> {
    fn layer_name(&self) -> &'static str {
        "remove-relations"
    }

    fn fields(&self) -> Vec<ResolverField> {
        self.mutations().into_iter().map(|m| m.field).collect()
    }

    fn types(&self) -> Vec<NamedType> {
        self.mutations().into_iter().map(|m| m.input).collect()
    }
}
