// Read relations layer

use super::RelationContext;
use crate::decorators::{PagingStrategy, RelationDescriptor, RelationsOpts};
use crate::resolvers::args::{parent_dto, parent_json, parse_arg};
use crate::resolvers::resolver::{ResolverField, ResolverLayer};
use crate::types::connection::{
    connection_name, cursor_connection, edge_object, offset_connection, offset_page_info,
    page_info,
};
use crate::types::{
    CURSOR_PAGING, JSON_SCALAR, NamedType, OFFSET_PAGING, RelationConnection, cursor_paging_input,
    decode_cursor, json_scalar, offset_paging_input, sort_input, sort_input_name,
};
use armature_query_core::{
    ClassId, Dto, Filter, Paging, Query, QueryError, QueryService, SortField,
};
use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputValue, Object, ResolverContext, TypeRef,
};
use heck::ToUpperCamelCase;
use serde::Deserialize;
use std::sync::Arc;
use tracing::trace;

/// Rows to skip and return for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Window {
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CursorPaging {
    pub first: Option<u64>,
    pub after: Option<String>,
    pub last: Option<u64>,
    pub before: Option<String>,
}

fn check_limit(limit: u64, relation: &RelationDescriptor) -> Result<u64, QueryError> {
    if limit > relation.max_results_size {
        return Err(QueryError::Validation(format!(
            "Requested {} records from relation {}, the maximum is {}",
            limit, relation.name, relation.max_results_size
        )));
    }
    Ok(limit)
}

pub(crate) fn offset_window(
    paging: Option<Paging>,
    relation: &RelationDescriptor,
) -> Result<Window, QueryError> {
    let paging = paging.unwrap_or_default();
    let limit = check_limit(
        paging.limit.unwrap_or(relation.default_result_size),
        relation,
    )?;
    Ok(Window {
        offset: paging.offset_or_zero(),
        limit,
    })
}

pub(crate) fn cursor_window(
    paging: Option<CursorPaging>,
    relation: &RelationDescriptor,
) -> Result<Window, QueryError> {
    let paging = paging.unwrap_or_default();
    match (paging.first, paging.last) {
        (Some(_), Some(_)) => Err(QueryError::Validation(
            "Cannot page with both first and last".to_string(),
        )),
        (_, Some(last)) => {
            let before = paging.before.as_deref().ok_or_else(|| {
                QueryError::Validation("Paging with last requires a before cursor".to_string())
            })?;
            let before = decode_cursor(before)?;
            let last = check_limit(last, relation)?;
            Ok(Window {
                offset: before.saturating_sub(last),
                limit: last.min(before),
            })
        }
        (first, None) => {
            let offset = match paging.after.as_deref() {
                Some(after) => decode_cursor(after)?.checked_add(1).ok_or_else(|| {
                    QueryError::Validation(format!("Invalid cursor {}", after))
                })?,
                None => 0,
            };
            let limit = check_limit(first.unwrap_or(relation.default_result_size), relation)?;
            Ok(Window { offset, limit })
        }
    }
}

/// Rows to fetch for a page of `limit`; one extra row tells whether a next page exists
fn fetch_limit(limit: u64) -> Result<u64, QueryError> {
    limit
        .checked_add(1)
        .ok_or_else(|| QueryError::Validation(format!("Invalid limit {}", limit)))
}

type WindowFn = fn(&ResolverContext<'_>, &RelationDescriptor) -> async_graphql::Result<Window>;

fn offset_window_arg(
    ctx: &ResolverContext<'_>,
    relation: &RelationDescriptor,
) -> async_graphql::Result<Window> {
    Ok(offset_window(parse_arg(ctx, "paging")?, relation)?)
}

fn cursor_window_arg(
    ctx: &ResolverContext<'_>,
    relation: &RelationDescriptor,
) -> async_graphql::Result<Window> {
    Ok(cursor_window(parse_arg(ctx, "paging")?, relation)?)
}

fn list_arguments(field: Field, related_type: &str) -> Field {
    field
        .argument(InputValue::new("filter", TypeRef::named(JSON_SCALAR)))
        .argument(InputValue::new(
            "sorting",
            TypeRef::named_nn_list(sort_input_name(related_type)),
        ))
}

fn list_query(ctx: &ResolverContext<'_>) -> async_graphql::Result<Query> {
    let filter = parse_arg::<Filter>(ctx, "filter")?.unwrap_or_else(Filter::empty);
    let sorting = parse_arg::<Vec<SortField>>(ctx, "sorting")?.unwrap_or_default();
    Ok(Query::new().with_filter(filter).with_sorting(sorting))
}

/// Adds an object field per readable relation
///
/// One relations resolve to the related record. Many relations resolve to an
/// offset connection, a cursor connection, or a plain list depending on the
/// relation's paging strategy.
pub struct ReadRelationsResolver<DTO: Dto> {
    ctx: RelationContext<DTO>,
    relations: RelationsOpts,
    enable_total_count: bool,
}

impl<DTO: Dto> ReadRelationsResolver<DTO> {
    pub fn new(ctx: RelationContext<DTO>, relations: &RelationsOpts, enable_total_count: bool) -> Self {
        let keep = |r: &&RelationDescriptor| !r.disable_read;
        Self {
            relations: RelationsOpts {
                one: relations.one.iter().filter(keep).cloned().collect(),
                many: relations.many.iter().filter(keep).cloned().collect(),
            },
            ctx,
            enable_total_count,
        }
    }

    fn total_count_enabled(&self, relation: &RelationDescriptor) -> bool {
        self.enable_total_count || relation.enable_total_count
    }

    fn connection_name(&self, relation: &RelationDescriptor) -> String {
        connection_name(&self.ctx.dto_name, &relation.name.to_upper_camel_case())
    }

    fn one_field(&self, relation: &RelationDescriptor) -> ResolverField {
        let related_type = self.ctx.related_type_name(relation.class);
        let type_ref = if relation.nullable {
            TypeRef::named(&related_type)
        } else {
            TypeRef::named_nn(&related_type)
        };
        let service = self.ctx.service.clone();
        let relation_name = relation.service_relation_name().to_string();

        let field = Field::new(relation.name.clone(), type_ref, move |rctx| {
            let service = service.clone();
            let relation_name = relation_name.clone();
            FieldFuture::new(async move {
                let dto: DTO = parent_dto(&rctx)?;
                trace!(relation = %relation_name, "Resolving one relation");
                let related = service.find_relation(&relation_name, &dto).await?;
                Ok(related
                    .filter(|value| !value.is_null())
                    .map(FieldValue::owned_any))
            })
        });
        ResolverField::object(&self.ctx.dto_name, &relation.name, field)
    }

    fn list_field(&self, relation: &RelationDescriptor) -> ResolverField {
        let related_type = self.ctx.related_type_name(relation.class);
        let service = self.ctx.service.clone();
        let relation_name = relation.service_relation_name().to_string();

        let field = Field::new(
            relation.name.clone(),
            TypeRef::named_nn_list_nn(&related_type),
            move |rctx| {
                let service = service.clone();
                let relation_name = relation_name.clone();
                FieldFuture::new(async move {
                    let dto: DTO = parent_dto(&rctx)?;
                    let query = list_query(&rctx)?;
                    let nodes = service.query_relations(&relation_name, &dto, &query).await?;
                    trace!(relation = %relation_name, count = nodes.len(), "Resolved relation list");
                    Ok(Some(FieldValue::list(
                        nodes.into_iter().map(FieldValue::owned_any),
                    )))
                })
            },
        );
        ResolverField::object(
            &self.ctx.dto_name,
            &relation.name,
            list_arguments(field, &related_type),
        )
    }

    fn connection_field(
        &self,
        relation: &RelationDescriptor,
        paging_type: &str,
        window: WindowFn,
    ) -> ResolverField {
        let related_type = self.ctx.related_type_name(relation.class);
        let service = self.ctx.service.clone();
        let descriptor = relation.clone();

        let field = Field::new(
            relation.name.clone(),
            TypeRef::named_nn(self.connection_name(relation)),
            move |rctx| {
                let service = service.clone();
                let descriptor = descriptor.clone();
                FieldFuture::new(async move {
                    let parent = parent_json(&rctx)?.clone();
                    let dto: DTO = serde_json::from_value(parent.clone())?;
                    let Window { offset, limit } = window(&rctx, &descriptor)?;
                    let query = list_query(&rctx)?.with_paging(Paging::new(fetch_limit(limit)?, offset));
                    let relation_name = descriptor.service_relation_name();

                    let mut nodes = service.query_relations(relation_name, &dto, &query).await?;
                    let has_next_page = nodes.len() as u64 > limit;
                    nodes.truncate(limit as usize);
                    trace!(
                        relation = %relation_name,
                        offset,
                        limit,
                        count = nodes.len(),
                        has_next_page,
                        "Resolved relation page"
                    );

                    Ok(Some(FieldValue::owned_any(RelationConnection {
                        nodes,
                        offset,
                        has_next_page,
                        parent,
                        filter: query.filter,
                    })))
                })
            },
        )
        .argument(InputValue::new("paging", TypeRef::named(paging_type)));

        ResolverField::object(
            &self.ctx.dto_name,
            &relation.name,
            list_arguments(field, &related_type),
        )
    }

    fn many_field(&self, relation: &RelationDescriptor) -> ResolverField {
        match relation.paging_strategy {
            PagingStrategy::Offset => {
                self.connection_field(relation, OFFSET_PAGING, offset_window_arg)
            }
            PagingStrategy::Cursor => {
                self.connection_field(relation, CURSOR_PAGING, cursor_window_arg)
            }
            PagingStrategy::None => self.list_field(relation),
        }
    }

    fn total_count_field(&self, relation: &RelationDescriptor) -> Field {
        let service = self.ctx.service.clone();
        let relation_name = relation.service_relation_name().to_string();
        count_field(service, relation_name)
    }

    fn many_types(&self, relation: &RelationDescriptor) -> Vec<NamedType> {
        let related_type = self.ctx.related_type_name(relation.class);
        let mut types = vec![json_scalar()];
        types.extend(sort_input(&related_type));

        let connection = match relation.paging_strategy {
            PagingStrategy::None => return types,
            PagingStrategy::Offset => {
                types.push(offset_page_info());
                types.push(offset_paging_input());
                offset_connection(&self.connection_name(relation), &related_type)
            }
            PagingStrategy::Cursor => {
                types.push(page_info());
                types.push(edge_object(&related_type));
                types.extend(cursor_paging_input());
                cursor_connection(&self.connection_name(relation), &related_type)
            }
        };
        let connection = self.with_total_count(connection, relation);
        types.push(NamedType::new(self.connection_name(relation), connection));
        types
    }

    fn with_total_count(&self, connection: Object, relation: &RelationDescriptor) -> Object {
        if self.total_count_enabled(relation) {
            connection.field(self.total_count_field(relation))
        } else {
            connection
        }
    }
}

fn count_field<DTO: Dto>(service: Arc<dyn QueryService<DTO>>, relation_name: String) -> Field {
    Field::new("totalCount", TypeRef::named_nn(TypeRef::INT), move |rctx| {
        let service = service.clone();
        let relation_name = relation_name.clone();
        FieldFuture::new(async move {
            let connection = rctx.parent_value.try_downcast_ref::<RelationConnection>()?;
            let dto: DTO = serde_json::from_value(connection.parent.clone())?;
            let count = service
                .count_relations(&relation_name, &dto, &connection.filter)
                .await?;
            Ok(Some(FieldValue::value(async_graphql::Value::Number(
                count.into(),
            ))))
        })
    })
}

impl<DTO: Dto> ResolverLayer for ReadRelationsResolver<DTO> {
    fn layer_name(&self) -> &'static str {
        "read-relations"
    }

    fn fields(&self) -> Vec<ResolverField> {
        let one = self.relations.one.iter().map(|r| self.one_field(r));
        let many = self.relations.many.iter().map(|r| self.many_field(r));
        one.chain(many).collect()
    }

    fn types(&self) -> Vec<NamedType> {
        self.relations
            .many
            .iter()
            .flat_map(|r| self.many_types(r))
            .collect()
    }

    fn object_classes(&self) -> Vec<ClassId> {
        self.relations
            .one
            .iter()
            .chain(&self.relations.many)
            .map(|r| r.class)
            .collect()
    }
}
