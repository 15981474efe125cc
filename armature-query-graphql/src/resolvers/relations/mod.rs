//! Relation capability layers and their composition
//!
//! Each layer reads the relation or reference descriptors registered for a
//! DTO class and contributes fields for them. [`Relatable`] threads a base
//! resolver through all of them in a fixed order.

mod aggregate;
mod read;
mod references;
mod relatable;
mod remove;
mod update;

pub use aggregate::AggregateRelationsResolver;
pub use read::ReadRelationsResolver;
pub use references::ReferencesRelationResolver;
pub use relatable::{Relatable, RelatableResolver};
pub use remove::RemoveRelationsResolver;
pub use update::UpdateRelationsResolver;

use super::args::{RelationInput, RelationsInput, require_arg, to_field_value};
use super::resolver::{ResolverField, ServiceResolver};
use crate::decorators::{
    ReferenceDescriptor, RelationDescriptor, RelationsOpts, get_references, get_relations,
    graphql_type_name,
};
use crate::types::NamedType;
use armature_query_core::reflect::MetadataRegistry;
use armature_query_core::{ClassId, Dto, QueryService};
use async_graphql::dynamic::{Field, FieldFuture, InputObject, InputValue, TypeRef};
use heck::ToUpperCamelCase;
use std::sync::Arc;
use tracing::debug;

/// What every relation layer needs from the resolver it wraps
pub struct RelationContext<DTO: Dto> {
    pub registry: MetadataRegistry,
    pub class: ClassId,
    pub dto_name: String,
    pub service: Arc<dyn QueryService<DTO>>,
}

impl<DTO: Dto> Clone for RelationContext<DTO> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            class: self.class,
            dto_name: self.dto_name.clone(),
            service: self.service.clone(),
        }
    }
}

impl<DTO: Dto> RelationContext<DTO> {
    pub fn from_resolver<B: ServiceResolver<DTO> + ?Sized>(base: &B) -> Self {
        let registry = base.registry().clone();
        let class = base.dto_class();
        let dto_name = graphql_type_name(&registry, class);
        Self {
            registry,
            class,
            dto_name,
            service: base.service(),
        }
    }

    pub fn relations(&self) -> RelationsOpts {
        get_relations(&self.registry, self.class)
    }

    pub fn references(&self) -> Vec<ReferenceDescriptor> {
        get_references(&self.registry, self.class)
    }

    /// GraphQL type name of the related DTO
    pub fn related_type_name(&self, class: ClassId) -> String {
        graphql_type_name(&self.registry, class)
    }
}

/// Relation mutations generated by the remove and update layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationMutation {
    SetOne,
    RemoveOne,
    AddMany,
    SetMany,
    RemoveMany,
}

impl RelationMutation {
    pub fn field_name(&self, relation: &str, dto_name: &str) -> String {
        let relation = relation.to_upper_camel_case();
        match self {
            RelationMutation::SetOne | RelationMutation::SetMany => {
                format!("set{}On{}", relation, dto_name)
            }
            RelationMutation::RemoveOne | RelationMutation::RemoveMany => {
                format!("remove{}From{}", relation, dto_name)
            }
            RelationMutation::AddMany => format!("add{}To{}", relation, dto_name),
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(
            self,
            RelationMutation::AddMany | RelationMutation::SetMany | RelationMutation::RemoveMany
        )
    }
}

/// A mutation field and the input type it takes
pub struct MutationField {
    pub field: ResolverField,
    pub input: NamedType,
}

pub fn input_type_name(field_name: &str) -> String {
    format!("{}Input", field_name.to_upper_camel_case())
}

fn relation_input(name: &str, many: bool) -> InputObject {
    let ids = if many {
        InputValue::new("relationIds", TypeRef::named_nn_list_nn(TypeRef::ID))
    } else {
        InputValue::new("relationId", TypeRef::named_nn(TypeRef::ID))
    };
    InputObject::new(name)
        .field(InputValue::new("id", TypeRef::named_nn(TypeRef::ID)))
        .field(ids)
}

/// Build `mutation` for `relation`, returning the updated DTO
pub fn mutation_field<DTO: Dto>(
    ctx: &RelationContext<DTO>,
    relation: &RelationDescriptor,
    mutation: RelationMutation,
) -> MutationField {
    let name = mutation.field_name(&relation.name, &ctx.dto_name);
    let input_name = input_type_name(&name);
    let relation_name = relation.service_relation_name().to_string();
    let service = ctx.service.clone();

    debug!(mutation = %name, relation = %relation.name, "Building relation mutation");

    let field = Field::new(name.clone(), TypeRef::named_nn(&ctx.dto_name), move |rctx| {
        let service = service.clone();
        let relation_name = relation_name.clone();
        FieldFuture::new(async move {
            let dto = if mutation.is_many() {
                let input: RelationsInput = require_arg(&rctx, "input")?;
                let id = String::from(input.id.clone());
                let relation_ids = input.relation_ids();
                match mutation {
                    RelationMutation::AddMany => {
                        service.add_relations(&relation_name, &id, &relation_ids).await?
                    }
                    RelationMutation::SetMany => {
                        service.set_relations(&relation_name, &id, &relation_ids).await?
                    }
                    _ => {
                        service
                            .remove_relations(&relation_name, &id, &relation_ids)
                            .await?
                    }
                }
            } else {
                let input: RelationInput = require_arg(&rctx, "input")?;
                let id = String::from(input.id);
                let relation_id = String::from(input.relation_id);
                match mutation {
                    RelationMutation::SetOne => {
                        service.set_relation(&relation_name, &id, &relation_id).await?
                    }
                    _ => {
                        service
                            .remove_relation(&relation_name, &id, &relation_id)
                            .await?
                    }
                }
            };
            Ok(Some(to_field_value(&dto)?))
        })
    })
    .argument(InputValue::new("input", TypeRef::named_nn(&input_name)));

    MutationField {
        field: ResolverField::mutation(name, field),
        input: NamedType::new(
            input_name.clone(),
            relation_input(&input_name, mutation.is_many()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_names() {
        assert_eq!(
            RelationMutation::SetOne.field_name("assignee", "TodoItem"),
            "setAssigneeOnTodoItem"
        );
        assert_eq!(
            RelationMutation::RemoveMany.field_name("subTasks", "TodoItem"),
            "removeSubTasksFromTodoItem"
        );
        assert_eq!(
            RelationMutation::AddMany.field_name("sub_tasks", "TodoItem"),
            "addSubTasksToTodoItem"
        );
    }

    #[test]
    fn test_input_type_name() {
        assert_eq!(
            input_type_name("setAssigneeOnTodoItem"),
            "SetAssigneeOnTodoItemInput"
        );
    }
}
