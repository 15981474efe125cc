// Argument and parent value helpers for dynamic resolvers

use armature_query_core::Dto;
use async_graphql::dynamic::{FieldValue, ResolverContext};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// ID input given either as a string or an integer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

/// `{ id, relationId }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RelationInput {
    pub id: RawId,
    pub relation_id: RawId,
}

/// `{ id, relationIds }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RelationsInput {
    pub id: RawId,
    pub relation_ids: Vec<RawId>,
}

impl RelationsInput {
    pub fn relation_ids(&self) -> Vec<String> {
        self.relation_ids.iter().cloned().map(String::from).collect()
    }
}

/// Deserialize an optional argument; null and missing both read as `None`
pub(crate) fn parse_arg<T: DeserializeOwned>(
    ctx: &ResolverContext<'_>,
    name: &str,
) -> async_graphql::Result<Option<T>> {
    let Some(value) = ctx.args.get(name) else {
        return Ok(None);
    };
    let json = value.as_value().clone().into_json()?;
    if json.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(json)?))
}

pub(crate) fn require_arg<T: DeserializeOwned>(
    ctx: &ResolverContext<'_>,
    name: &str,
) -> async_graphql::Result<T> {
    parse_arg(ctx, name)?.ok_or_else(|| format!("Missing argument: {}", name).into())
}

pub(crate) fn arg_id(ctx: &ResolverContext<'_>, name: &str) -> async_graphql::Result<String> {
    require_arg::<RawId>(ctx, name).map(String::from)
}

/// Parent record as JSON
pub(crate) fn parent_json<'a>(ctx: &ResolverContext<'a>) -> async_graphql::Result<&'a JsonValue> {
    ctx.parent_value.try_downcast_ref::<JsonValue>()
}

/// Parent record as the owning DTO
pub(crate) fn parent_dto<DTO: Dto>(ctx: &ResolverContext<'_>) -> async_graphql::Result<DTO> {
    Ok(serde_json::from_value(parent_json(ctx)?.clone())?)
}

/// Wrap a DTO as a JSON record for object field resolvers
pub(crate) fn to_field_value<'a, DTO: Dto>(dto: &DTO) -> async_graphql::Result<FieldValue<'a>> {
    Ok(FieldValue::owned_any(serde_json::to_value(dto)?))
}
