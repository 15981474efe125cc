// Update relations layer

use super::{MutationField, RelationContext, RelationMutation, mutation_field};
use crate::decorators::{RelationDescriptor, RelationsOpts};
use crate::resolvers::resolver::{ResolverField, ResolverLayer};
use crate::types::NamedType;
use armature_query_core::Dto;

/// Adds `set{Rel}On{Dto}` for one relations and `add{Rel}To{Dto}` plus
/// `set{Rel}On{Dto}` for many relations
pub struct UpdateRelationsResolver<DTO: Dto> {
    ctx: RelationContext<DTO>,
    relations: RelationsOpts,
}

impl<DTO: Dto> UpdateRelationsResolver<DTO> {
    pub fn new(ctx: RelationContext<DTO>, relations: &RelationsOpts) -> Self {
        let keep = |r: &&RelationDescriptor| !r.disable_update;
        Self {
            relations: RelationsOpts {
                one: relations.one.iter().filter(keep).cloned().collect(),
                many: relations.many.iter().filter(keep).cloned().collect(),
            },
            ctx,
        }
    }

    fn mutations(&self) -> Vec<MutationField> {
        let mut mutations = Vec::new();
        for relation in &self.relations.one {
            mutations.push(mutation_field(&self.ctx, relation, RelationMutation::SetOne));
        }
        for relation in &self.relations.many {
            mutations.push(mutation_field(&self.ctx, relation, RelationMutation::AddMany));
            mutations.push(mutation_field(&self.ctx, relation, RelationMutation::SetMany));
        }
        mutations
    }
}

impl<DTO: Dto> ResolverLayer for UpdateRelationsResolver<DTO> {
    fn layer_name(&self) -> &'static str {
        "update-relations"
    }

    fn fields(&self) -> Vec<ResolverField> {
        self.mutations().into_iter().map(|m| m.field).collect()
    }

    fn types(&self) -> Vec<NamedType> {
        self.mutations().into_iter().map(|m| m.input).collect()
    }
}
