// Query service seam implemented by persistence adapters

use crate::{AggregateQuery, AggregateResponse, Filter, Query, QueryError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Types that can be served through a [`QueryService`]
pub trait Dto: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Dto for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Data access for one DTO type and its relations.
///
/// Relations are addressed by their relation name. Related records cross
/// this boundary as JSON since their Rust type is only known through the
/// registered relation metadata.
///
/// Every relation operation defaults to an error naming the operation, so
/// adapters only implement what their relations actually support.
#[async_trait]
pub trait QueryService<DTO: Dto>: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<DTO>>;

    async fn get_by_id(&self, id: &str) -> Result<DTO> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| QueryError::NotFound(format!("Unable to find entity with id: {}", id)))
    }

    async fn find_relation(&self, relation_name: &str, dto: &DTO) -> Result<Option<Value>> {
        let _ = dto;
        Err(unsupported("find_relation", relation_name))
    }

    async fn query_relations(
        &self,
        relation_name: &str,
        dto: &DTO,
        query: &Query,
    ) -> Result<Vec<Value>> {
        let _ = (dto, query);
        Err(unsupported("query_relations", relation_name))
    }

    async fn count_relations(&self, relation_name: &str, dto: &DTO, filter: &Filter) -> Result<u64> {
        let _ = (dto, filter);
        Err(unsupported("count_relations", relation_name))
    }

    async fn aggregate_relations(
        &self,
        relation_name: &str,
        dto: &DTO,
        filter: &Filter,
        aggregate: &AggregateQuery,
    ) -> Result<AggregateResponse> {
        let _ = (dto, filter, aggregate);
        Err(unsupported("aggregate_relations", relation_name))
    }

    async fn add_relations(
        &self,
        relation_name: &str,
        id: &str,
        relation_ids: &[String],
    ) -> Result<DTO> {
        let _ = (id, relation_ids);
        Err(unsupported("add_relations", relation_name))
    }

    async fn set_relations(
        &self,
        relation_name: &str,
        id: &str,
        relation_ids: &[String],
    ) -> Result<DTO> {
        let _ = (id, relation_ids);
        Err(unsupported("set_relations", relation_name))
    }

    async fn set_relation(&self, relation_name: &str, id: &str, relation_id: &str) -> Result<DTO> {
        let _ = (id, relation_id);
        Err(unsupported("set_relation", relation_name))
    }

    async fn remove_relation(
        &self,
        relation_name: &str,
        id: &str,
        relation_id: &str,
    ) -> Result<DTO> {
        let _ = (id, relation_id);
        Err(unsupported("remove_relation", relation_name))
    }

    async fn remove_relations(
        &self,
        relation_name: &str,
        id: &str,
        relation_ids: &[String],
    ) -> Result<DTO> {
        let _ = (id, relation_ids);
        Err(unsupported("remove_relations", relation_name))
    }
}

fn unsupported(operation: &str, relation_name: &str) -> QueryError {
    QueryError::Relation(format!(
        "{} is not supported for relation {}",
        operation, relation_name
    ))
}
