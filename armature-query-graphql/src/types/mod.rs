//! Support types shared by the relation resolvers
//!
//! Types are described as [`NamedType`]s so resolvers can contribute them
//! independently and the schema builder can register each name once.

pub mod aggregate;
pub mod connection;
pub mod object;

use async_graphql::dynamic::{Enum, EnumItem, InputObject, InputValue, Scalar, Type, TypeRef};
use std::collections::HashSet;
use std::fmt;

pub use aggregate::{AGGREGATE_RESPONSE_KEY, AggregateTypeDef, aggregate_query_from_selection};
pub use connection::{
    CURSOR_PREFIX, Edge, PageInfo, RelationConnection, decode_cursor, encode_cursor,
};
pub use object::{entity_object, entity_types};

pub const JSON_SCALAR: &str = "JSON";
pub const CONNECTION_CURSOR: &str = "ConnectionCursor";
pub const SORT_DIRECTION: &str = "SortDirection";
pub const SORT_NULLS: &str = "SortNulls";
pub const OFFSET_PAGING: &str = "OffsetPaging";
pub const CURSOR_PAGING: &str = "CursorPaging";

/// A GraphQL type definition together with its name
pub struct NamedType {
    name: String,
    ty: Type,
}

impl NamedType {
    pub fn new(name: impl Into<String>, ty: impl Into<Type>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_type(self) -> Type {
        self.ty
    }
}

impl fmt::Debug for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedType").field("name", &self.name).finish()
    }
}

/// Ordered set of types where the first definition of a name wins
#[derive(Debug, Default)]
pub struct TypeSet {
    names: HashSet<String>,
    types: Vec<NamedType>,
}

impl TypeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type; returns `false` when the name is already present
    pub fn insert(&mut self, ty: NamedType) -> bool {
        if !self.names.insert(ty.name.clone()) {
            return false;
        }
        self.types.push(ty);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Extend<NamedType> for TypeSet {
    fn extend<I: IntoIterator<Item = NamedType>>(&mut self, iter: I) {
        for ty in iter {
            self.insert(ty);
        }
    }
}

impl IntoIterator for TypeSet {
    type Item = NamedType;
    type IntoIter = std::vec::IntoIter<NamedType>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.into_iter()
    }
}

/// Scalar carrying arbitrary JSON, used for filters
pub fn json_scalar() -> NamedType {
    NamedType::new(
        JSON_SCALAR,
        Scalar::new(JSON_SCALAR).description("Arbitrary JSON value"),
    )
}

pub fn connection_cursor_scalar() -> NamedType {
    NamedType::new(
        CONNECTION_CURSOR,
        Scalar::new(CONNECTION_CURSOR).description("Cursor for paging through collections"),
    )
}

/// `SortDirection` and `SortNulls` enums
pub fn sort_enums() -> Vec<NamedType> {
    vec![
        NamedType::new(
            SORT_DIRECTION,
            Enum::new(SORT_DIRECTION)
                .item(EnumItem::new("ASC"))
                .item(EnumItem::new("DESC")),
        ),
        NamedType::new(
            SORT_NULLS,
            Enum::new(SORT_NULLS)
                .item(EnumItem::new("NULLS_FIRST"))
                .item(EnumItem::new("NULLS_LAST")),
        ),
    ]
}

pub fn sort_input_name(dto_name: &str) -> String {
    format!("{}Sort", dto_name)
}

/// `{Dto}Sort` input plus the enums it refers to
pub fn sort_input(dto_name: &str) -> Vec<NamedType> {
    let name = sort_input_name(dto_name);
    let input = InputObject::new(&name)
        .field(InputValue::new("field", TypeRef::named_nn(TypeRef::STRING)))
        .field(InputValue::new("direction", TypeRef::named_nn(SORT_DIRECTION)))
        .field(InputValue::new("nulls", TypeRef::named(SORT_NULLS)));

    let mut types = sort_enums();
    types.push(NamedType::new(name, input));
    types
}

pub fn offset_paging_input() -> NamedType {
    NamedType::new(
        OFFSET_PAGING,
        InputObject::new(OFFSET_PAGING)
            .field(InputValue::new("limit", TypeRef::named(TypeRef::INT)))
            .field(InputValue::new("offset", TypeRef::named(TypeRef::INT))),
    )
}

pub fn cursor_paging_input() -> Vec<NamedType> {
    vec![
        connection_cursor_scalar(),
        NamedType::new(
            CURSOR_PAGING,
            InputObject::new(CURSOR_PAGING)
                .field(InputValue::new("first", TypeRef::named(TypeRef::INT)))
                .field(InputValue::new("after", TypeRef::named(CONNECTION_CURSOR)))
                .field(InputValue::new("last", TypeRef::named(TypeRef::INT)))
                .field(InputValue::new("before", TypeRef::named(CONNECTION_CURSOR))),
        ),
    ]
}
