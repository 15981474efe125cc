// Offset and cursor connections for many relations

use super::{CONNECTION_CURSOR, NamedType};
use armature_query_core::{Filter, QueryError, Result};
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, Object, TypeRef};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value as JsonValue;

pub const CURSOR_PREFIX: &str = "arrayconnection:";
pub const OFFSET_PAGE_INFO: &str = "OffsetPageInfo";
pub const PAGE_INFO: &str = "PageInfo";

/// One page of related records as produced by the read resolver
#[derive(Debug, Clone, PartialEq)]
pub struct RelationConnection {
    pub nodes: Vec<JsonValue>,
    /// Offset of the first node
    pub offset: u64,
    pub has_next_page: bool,
    /// Record that owns the relation
    pub parent: JsonValue,
    /// Filter the page was fetched with, reused by `totalCount`
    pub filter: Filter,
}

impl RelationConnection {
    pub fn page_info(&self) -> PageInfo {
        let end = (self.offset + self.nodes.len() as u64).checked_sub(1);
        let has_nodes = !self.nodes.is_empty();
        PageInfo {
            has_next_page: self.has_next_page,
            has_previous_page: self.offset > 0,
            start_cursor: has_nodes.then(|| encode_cursor(self.offset)),
            end_cursor: end.filter(|_| has_nodes).map(encode_cursor),
        }
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| Edge {
                node: node.clone(),
                cursor: encode_cursor(self.offset + index as u64),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub node: JsonValue,
    pub cursor: String,
}

pub fn encode_cursor(offset: u64) -> String {
    STANDARD.encode(format!("{}{}", CURSOR_PREFIX, offset))
}

pub fn decode_cursor(cursor: &str) -> Result<u64> {
    let invalid = || QueryError::Validation(format!("Invalid cursor: {}", cursor));
    let bytes = STANDARD.decode(cursor).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    text.strip_prefix(CURSOR_PREFIX)
        .and_then(|offset| offset.parse().ok())
        .ok_or_else(invalid)
}

pub fn connection_name(dto_name: &str, relation_type: &str) -> String {
    format!("{}{}Connection", dto_name, relation_type)
}

pub fn edge_name(node_type: &str) -> String {
    format!("{}Edge", node_type)
}

fn bool_field(name: &str, read: fn(&PageInfo) -> bool) -> Field {
    Field::new(name, TypeRef::named_nn(TypeRef::BOOLEAN), move |ctx| {
        FieldFuture::new(async move {
            let info = ctx.parent_value.try_downcast_ref::<PageInfo>()?;
            Ok(Some(FieldValue::value(read(info))))
        })
    })
}

fn cursor_field(name: &str, read: fn(&PageInfo) -> Option<String>) -> Field {
    Field::new(name, TypeRef::named(CONNECTION_CURSOR), move |ctx| {
        FieldFuture::new(async move {
            let info = ctx.parent_value.try_downcast_ref::<PageInfo>()?;
            Ok(read(info).map(FieldValue::value))
        })
    })
}

pub fn offset_page_info() -> NamedType {
    NamedType::new(
        OFFSET_PAGE_INFO,
        Object::new(OFFSET_PAGE_INFO)
            .field(bool_field("hasNextPage", |info| info.has_next_page))
            .field(bool_field("hasPreviousPage", |info| info.has_previous_page)),
    )
}

pub fn page_info() -> NamedType {
    NamedType::new(
        PAGE_INFO,
        Object::new(PAGE_INFO)
            .field(bool_field("hasNextPage", |info| info.has_next_page))
            .field(bool_field("hasPreviousPage", |info| info.has_previous_page))
            .field(cursor_field("startCursor", |info| info.start_cursor.clone()))
            .field(cursor_field("endCursor", |info| info.end_cursor.clone())),
    )
}

fn page_info_field(type_name: &'static str) -> Field {
    Field::new("pageInfo", TypeRef::named_nn(type_name), |ctx| {
        FieldFuture::new(async move {
            let connection = ctx.parent_value.try_downcast_ref::<RelationConnection>()?;
            Ok(Some(FieldValue::owned_any(connection.page_info())))
        })
    })
}

/// `{Dto}{Rel}Connection { nodes, pageInfo }` for offset paging
pub fn offset_connection(name: &str, node_type: &str) -> Object {
    let nodes = Field::new("nodes", TypeRef::named_nn_list_nn(node_type), |ctx| {
        FieldFuture::new(async move {
            let connection = ctx.parent_value.try_downcast_ref::<RelationConnection>()?;
            let nodes = connection.nodes.iter().cloned().map(FieldValue::owned_any);
            Ok(Some(FieldValue::list(nodes)))
        })
    });

    Object::new(name)
        .field(nodes)
        .field(page_info_field(OFFSET_PAGE_INFO))
}

/// `{RelDto}Edge { node, cursor }`
pub fn edge_object(node_type: &str) -> NamedType {
    let name = edge_name(node_type);
    let node = Field::new("node", TypeRef::named_nn(node_type), |ctx| {
        FieldFuture::new(async move {
            let edge = ctx.parent_value.try_downcast_ref::<Edge>()?;
            Ok(Some(FieldValue::owned_any(edge.node.clone())))
        })
    });
    let cursor = Field::new("cursor", TypeRef::named_nn(CONNECTION_CURSOR), |ctx| {
        FieldFuture::new(async move {
            let edge = ctx.parent_value.try_downcast_ref::<Edge>()?;
            Ok(Some(FieldValue::value(edge.cursor.clone())))
        })
    });

    NamedType::new(name.clone(), Object::new(name).field(node).field(cursor))
}

/// `{Dto}{Rel}Connection { edges, pageInfo }` for cursor paging
pub fn cursor_connection(name: &str, node_type: &str) -> Object {
    let edges = Field::new(
        "edges",
        TypeRef::named_nn_list_nn(edge_name(node_type)),
        |ctx| {
            FieldFuture::new(async move {
                let connection = ctx.parent_value.try_downcast_ref::<RelationConnection>()?;
                let edges = connection.edges().into_iter().map(FieldValue::owned_any);
                Ok(Some(FieldValue::list(edges)))
            })
        },
    );

    Object::new(name).field(edges).field(page_info_field(PAGE_INFO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connection(offset: u64, nodes: usize, has_next_page: bool) -> RelationConnection {
        RelationConnection {
            nodes: (0..nodes).map(|i| json!({ "id": i })).collect(),
            offset,
            has_next_page,
            parent: json!({ "id": "1" }),
            filter: Filter::empty(),
        }
    }

    #[test]
    fn test_cursor_format() {
        assert_eq!(encode_cursor(0), "YXJyYXljb25uZWN0aW9uOjA=");
        assert_eq!(decode_cursor("YXJyYXljb25uZWN0aW9uOjA=").unwrap(), 0);
        assert_eq!(decode_cursor(&encode_cursor(41)).unwrap(), 41);
    }

    #[test]
    fn test_invalid_cursors() {
        assert!(decode_cursor("not base64!").is_err());
        let foreign = STANDARD.encode("offset:3");
        assert!(matches!(
            decode_cursor(&foreign),
            Err(QueryError::Validation(_))
        ));
    }

    #[test]
    fn test_page_info_for_middle_page() {
        let info = connection(10, 5, true).page_info();
        assert!(info.has_next_page);
        assert!(info.has_previous_page);
        assert_eq!(info.start_cursor, Some(encode_cursor(10)));
        assert_eq!(info.end_cursor, Some(encode_cursor(14)));
    }

    #[test]
    fn test_page_info_for_empty_page() {
        let info = connection(0, 0, false).page_info();
        assert!(!info.has_previous_page);
        assert_eq!(info.start_cursor, None);
        assert_eq!(info.end_cursor, None);
    }

    #[test]
    fn test_edges_carry_absolute_cursors() {
        let edges = connection(3, 2, false).edges();
        assert_eq!(edges[0].cursor, encode_cursor(3));
        assert_eq!(edges[1].cursor, encode_cursor(4));
        assert_eq!(edges[1].node, json!({ "id": 1 }));
    }

    #[test]
    fn test_names() {
        assert_eq!(connection_name("TodoItem", "SubTasks"), "TodoItemSubTasksConnection");
        assert_eq!(edge_name("SubTask"), "SubTaskEdge");
    }
}
