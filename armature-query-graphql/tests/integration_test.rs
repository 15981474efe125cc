//! End-to-end tests for relation composition and schema execution

use armature_query_core::{
    AggregateQuery, AggregateResponse, ClassId, Filter, MetadataRegistry, Query, QueryError,
    QueryService, Result, SortDirection,
};
use armature_query_graphql::decorators::{FieldMetadata, FieldType, ObjectType, Reference, Relation};
use armature_query_graphql::types::encode_cursor;
use armature_query_graphql::{
    BaseServiceResolver, FieldTarget, Relatable, RelatableOpts, RelatableResolver, ResolverLayer,
    ResolverSchemaBuilder, Schema, ServiceResolver,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodoItem {
    id: String,
    title: String,
    assignee_id: Option<String>,
    owner_id: String,
}

struct SubTask;
struct User;
struct Tag;

#[derive(Default)]
struct TodoItemService {
    items: Mutex<HashMap<String, TodoItem>>,
    sub_tasks: Mutex<Vec<Value>>,
}

impl TodoItemService {
    fn seeded() -> Self {
        let service = Self::default();
        service.items.lock().unwrap().insert(
            "1".to_string(),
            TodoItem {
                id: "1".to_string(),
                title: "Write docs".to_string(),
                assignee_id: Some("u1".to_string()),
                owner_id: "u9".to_string(),
            },
        );
        *service.sub_tasks.lock().unwrap() = vec![
            json!({ "id": "s1", "title": "Outline", "estimate": 1, "todoItemId": "1" }),
            json!({ "id": "s2", "title": "Draft", "estimate": 2, "todoItemId": "1" }),
            json!({ "id": "s3", "title": "Review", "estimate": 3, "todoItemId": "1" }),
            json!({ "id": "s4", "title": "Unrelated", "estimate": 8, "todoItemId": "2" }),
        ];
        service
    }

    fn users() -> Vec<Value> {
        vec![
            json!({ "id": "u1", "name": "Ada" }),
            json!({ "id": "u2", "name": "Grace" }),
        ]
    }

    fn tags() -> Vec<Value> {
        vec![
            json!({ "id": "t1", "name": "docs" }),
            json!({ "id": "t2", "name": "urgent" }),
            json!({ "id": "t3", "name": "later" }),
        ]
    }

    fn related(&self, relation_name: &str, dto: &TodoItem) -> Result<Vec<Value>> {
        match relation_name {
            "subTasks" => Ok(self
                .sub_tasks
                .lock()
                .unwrap()
                .iter()
                .filter(|task| task["todoItemId"] == json!(dto.id))
                .cloned()
                .collect()),
            "tags" => Ok(Self::tags()),
            other => Err(QueryError::Relation(format!("unknown relation {}", other))),
        }
    }

    fn item(&self, id: &str) -> Result<TodoItem> {
        self.items
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| QueryError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl QueryService<TodoItem> for TodoItemService {
    async fn find_by_id(&self, id: &str) -> Result<Option<TodoItem>> {
        Ok(self.items.lock().unwrap().get(id).cloned())
    }

    async fn find_relation(&self, relation_name: &str, dto: &TodoItem) -> Result<Option<Value>> {
        assert_eq!(relation_name, "assignee");
        Ok(dto
            .assignee_id
            .as_ref()
            .and_then(|id| Self::users().into_iter().find(|user| user["id"] == json!(id))))
    }

    async fn query_relations(
        &self,
        relation_name: &str,
        dto: &TodoItem,
        query: &Query,
    ) -> Result<Vec<Value>> {
        let mut records = self.related(relation_name, dto)?;
        if let Some(sort) = query.sorting.first() {
            records.sort_by_key(|record| record[&sort.field].to_string());
            if sort.direction == SortDirection::Desc {
                records.reverse();
            }
        }
        let offset = query.paging.offset_or_zero() as usize;
        let limit = query.paging.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_relations(
        &self,
        relation_name: &str,
        dto: &TodoItem,
        _filter: &Filter,
    ) -> Result<u64> {
        Ok(self.related(relation_name, dto)?.len() as u64)
    }

    async fn aggregate_relations(
        &self,
        relation_name: &str,
        dto: &TodoItem,
        _filter: &Filter,
        aggregate: &AggregateQuery,
    ) -> Result<AggregateResponse> {
        let records = self.related(relation_name, dto)?;
        let estimates: Vec<i64> = records
            .iter()
            .filter_map(|r| r["estimate"].as_i64())
            .collect();

        let mut response = AggregateResponse::default();
        for field in &aggregate.count {
            response.count.insert(field.clone(), json!(records.len()));
        }
        for field in &aggregate.sum {
            let sum: i64 = estimates.iter().sum();
            response.sum.insert(field.clone(), json!(sum as f64));
        }
        for field in &aggregate.max {
            response.max.insert(field.clone(), json!(estimates.iter().max()));
        }
        Ok(response)
    }

    async fn set_relation(
        &self,
        relation_name: &str,
        id: &str,
        relation_id: &str,
    ) -> Result<TodoItem> {
        assert_eq!(relation_name, "assignee");
        let mut items = self.items.lock().unwrap();
        let item = items
            .get_mut(id)
            .ok_or_else(|| QueryError::NotFound(id.to_string()))?;
        item.assignee_id = Some(relation_id.to_string());
        Ok(item.clone())
    }

    async fn remove_relation(
        &self,
        relation_name: &str,
        id: &str,
        _relation_id: &str,
    ) -> Result<TodoItem> {
        assert_eq!(relation_name, "assignee");
        let mut items = self.items.lock().unwrap();
        let item = items
            .get_mut(id)
            .ok_or_else(|| QueryError::NotFound(id.to_string()))?;
        item.assignee_id = None;
        Ok(item.clone())
    }

    async fn add_relations(
        &self,
        relation_name: &str,
        id: &str,
        relation_ids: &[String],
    ) -> Result<TodoItem> {
        assert_eq!(relation_name, "subTasks");
        let mut tasks = self.sub_tasks.lock().unwrap();
        for task in tasks.iter_mut() {
            if relation_ids.iter().any(|rid| task["id"] == json!(rid)) {
                task["todoItemId"] = json!(id);
            }
        }
        drop(tasks);
        self.item(id)
    }
}

fn register_types(registry: &MetadataRegistry) {
    ObjectType::new("TodoItem")
        .field(FieldMetadata::new("id", FieldType::Id))
        .field(FieldMetadata::new("title", FieldType::String))
        .field(FieldMetadata::new("assigneeId", FieldType::Id).nullable(true))
        .field(FieldMetadata::new("ownerId", FieldType::Id))
        .register(registry, ClassId::of::<TodoItem>());
    ObjectType::new("SubTask")
        .field(FieldMetadata::new("id", FieldType::Id))
        .field(FieldMetadata::new("title", FieldType::String))
        .field(FieldMetadata::new("estimate", FieldType::Int).nullable(true))
        .register(registry, ClassId::of::<SubTask>());
    ObjectType::new("User")
        .field(FieldMetadata::new("id", FieldType::Id))
        .field(FieldMetadata::new("name", FieldType::String).nullable(true))
        .register(registry, ClassId::of::<User>());
    ObjectType::new("Tag")
        .field(FieldMetadata::new("id", FieldType::Id))
        .field(FieldMetadata::new("name", FieldType::String))
        .register(registry, ClassId::of::<Tag>());
}

fn register_relations(registry: &MetadataRegistry) {
    let todo = ClassId::of::<TodoItem>();
    Relation::one("assignee", ClassId::of::<User>())
        .nullable(true)
        .register(registry, todo);
    Relation::many("subTasks", ClassId::of::<SubTask>())
        .enable_total_count()
        .register(registry, todo);
    Relation::cursor_connection("tags", ClassId::of::<Tag>())
        .disable_update()
        .disable_remove()
        .register(registry, todo);
    Reference::new("owner", ClassId::of::<User>())
        .key("id", "ownerId")
        .register(registry, todo);
}

fn compose(
    registry: &MetadataRegistry,
    opts: RelatableOpts,
) -> RelatableResolver<TodoItem, BaseServiceResolver<TodoItem>> {
    let base = BaseServiceResolver::<TodoItem>::new(registry, Arc::new(TodoItemService::seeded()));
    Relatable::<TodoItem>::new(opts).apply(base)
}

fn schema(opts: RelatableOpts) -> Schema {
    let registry = MetadataRegistry::new();
    register_types(&registry);
    register_relations(&registry);
    ResolverSchemaBuilder::new(&registry)
        .resolver(compose(&registry, opts))
        .build()
        .unwrap()
}

fn added_keys(resolver: &RelatableResolver<TodoItem, BaseServiceResolver<TodoItem>>) -> Vec<String> {
    resolver
        .added_fields()
        .iter()
        .map(|f| format!("{}.{}", f.target, f.name))
        .collect()
}

async fn execute(schema: &Schema, query: &str) -> Value {
    let response = schema.execute(query).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data.into_json().unwrap()
}

#[test]
fn test_no_relations_adds_no_fields() {
    let registry = MetadataRegistry::new();
    register_types(&registry);

    let resolver = compose(&registry, RelatableOpts::new().with_aggregate(true));

    assert!(resolver.added_fields().is_empty());
    assert_eq!(
        resolver.field_keys(),
        vec![(FieldTarget::Query, "todoItem".to_string())]
    );
}

#[test]
fn test_one_relation_with_flags_off() {
    let registry = MetadataRegistry::new();
    register_types(&registry);
    Relation::one("assignee", ClassId::of::<User>()).register(&registry, ClassId::of::<TodoItem>());

    let resolver = compose(&registry, RelatableOpts::new());

    assert_eq!(
        added_keys(&resolver),
        vec![
            "Mutation.removeAssigneeFromTodoItem",
            "Mutation.setAssigneeOnTodoItem",
            "TodoItem.assignee",
        ]
    );
}

#[test]
fn test_layers_follow_registered_switches() {
    let registry = MetadataRegistry::new();
    register_types(&registry);
    register_relations(&registry);

    let keys = added_keys(&compose(&registry, RelatableOpts::new()));
    assert_eq!(
        keys,
        vec![
            "Mutation.removeAssigneeFromTodoItem",
            "Mutation.removeSubTasksFromTodoItem",
            "Mutation.setAssigneeOnTodoItem",
            "Mutation.addSubTasksToTodoItem",
            "Mutation.setSubTasksOnTodoItem",
            "TodoItem.assignee",
            "TodoItem.subTasks",
            "TodoItem.tags",
            "TodoItem.owner",
        ]
    );

    let keys = added_keys(&compose(&registry, RelatableOpts::new().with_aggregate(true)));
    assert!(keys.contains(&"TodoItem.subTasksAggregate".to_string()));
    assert!(keys.contains(&"TodoItem.tagsAggregate".to_string()));
}

#[test]
fn test_composition_is_deterministic() {
    let registry = MetadataRegistry::new();
    register_types(&registry);
    register_relations(&registry);
    let opts = RelatableOpts::new().with_total_count(true).with_aggregate(true);

    let first = compose(&registry, opts);
    let second = compose(&registry, opts);

    assert_eq!(first.field_keys(), second.field_keys());
    let type_names = |r: &RelatableResolver<TodoItem, BaseServiceResolver<TodoItem>>| {
        r.types()
            .iter()
            .map(|t| t.name().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(type_names(&first), type_names(&second));
}

#[test]
fn test_composed_resolver_can_be_wrapped_again() {
    let registry = MetadataRegistry::new();
    register_types(&registry);
    register_relations(&registry);

    let once = compose(&registry, RelatableOpts::new());
    let count = once.field_keys().len();
    let twice = Relatable::<TodoItem>::new(RelatableOpts::new()).apply(once);

    assert_eq!(twice.base().field_keys().len(), count);
    assert_eq!(twice.dto_class(), ClassId::of::<TodoItem>());
}

#[test]
fn test_unregistered_related_type_is_schema_error() {
    let registry = MetadataRegistry::new();
    ObjectType::new("TodoItem")
        .field(FieldMetadata::new("id", FieldType::Id))
        .register(&registry, ClassId::of::<TodoItem>());
    Relation::one("assignee", ClassId::of::<User>()).register(&registry, ClassId::of::<TodoItem>());

    let err = ResolverSchemaBuilder::new(&registry)
        .resolver(compose(&registry, RelatableOpts::new()))
        .build()
        .unwrap_err();

    assert!(matches!(err, QueryError::Schema(_)));
}

#[tokio::test]
async fn test_json_field_without_relations() {
    let registry = MetadataRegistry::new();
    ObjectType::new("TodoItem")
        .field(FieldMetadata::new("id", FieldType::Id))
        .field(FieldMetadata::new("meta", FieldType::Json))
        .register(&registry, ClassId::of::<TodoItem>());

    let schema = ResolverSchemaBuilder::new(&registry)
        .resolver(compose(&registry, RelatableOpts::new()))
        .build()
        .unwrap();

    assert!(schema.sdl().contains("scalar JSON"));
    let data = execute(&schema, r#"{ todoItem(id: "1") { id meta } }"#).await;
    assert_eq!(data, json!({ "todoItem": { "id": "1", "meta": null } }));
}

#[test]
fn test_sdl_exposes_relation_types() {
    let sdl = schema(RelatableOpts::new().with_aggregate(true)).sdl();

    assert!(sdl.contains("type TodoItemSubTasksConnection"));
    assert!(sdl.contains("type TodoItemTagsConnection"));
    assert!(!sdl.contains("type SubTaskEdge"));
    assert!(sdl.contains("type TagEdge"));
    assert!(sdl.contains("type SubTaskAggregateResponse"));
    assert!(sdl.contains("input SetAssigneeOnTodoItemInput"));
}

#[tokio::test]
async fn test_one_relation_and_reference() {
    let schema = schema(RelatableOpts::new());

    let data = execute(
        &schema,
        r#"{ todoItem(id: "1") { id title assignee { id name } owner { id name } } }"#,
    )
    .await;

    assert_eq!(
        data,
        json!({
            "todoItem": {
                "id": "1",
                "title": "Write docs",
                "assignee": { "id": "u1", "name": "Ada" },
                "owner": { "id": "u9", "name": null }
            }
        })
    );
}

#[tokio::test]
async fn test_offset_connection_with_total_count() {
    let schema = schema(RelatableOpts::new());

    let data = execute(
        &schema,
        r#"{
            todoItem(id: "1") {
                subTasks(paging: { limit: 2 }) {
                    nodes { id title }
                    pageInfo { hasNextPage hasPreviousPage }
                    totalCount
                }
            }
        }"#,
    )
    .await;

    assert_eq!(
        data["todoItem"]["subTasks"],
        json!({
            "nodes": [
                { "id": "s1", "title": "Outline" },
                { "id": "s2", "title": "Draft" }
            ],
            "pageInfo": { "hasNextPage": true, "hasPreviousPage": false },
            "totalCount": 3
        })
    );
}

#[tokio::test]
async fn test_offset_connection_sorting_and_last_page() {
    let schema = schema(RelatableOpts::new());

    let data = execute(
        &schema,
        r#"{
            todoItem(id: "1") {
                subTasks(paging: { limit: 2, offset: 2 }, sorting: [{ field: "id", direction: DESC }]) {
                    nodes { id }
                    pageInfo { hasNextPage hasPreviousPage }
                }
            }
        }"#,
    )
    .await;

    assert_eq!(
        data["todoItem"]["subTasks"],
        json!({
            "nodes": [{ "id": "s1" }],
            "pageInfo": { "hasNextPage": false, "hasPreviousPage": true }
        })
    );
}

#[tokio::test]
async fn test_limit_above_maximum_is_rejected() {
    let schema = schema(RelatableOpts::new());

    let response = schema
        .execute(r#"{ todoItem(id: "1") { subTasks(paging: { limit: 51 }) { nodes { id } } } }"#)
        .await;

    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].message.contains("the maximum is 50"));
}

#[tokio::test]
async fn test_cursor_connection_pages_forward() {
    let schema = schema(RelatableOpts::new());

    let data = execute(
        &schema,
        r#"{
            todoItem(id: "1") {
                tags(paging: { first: 1 }) {
                    edges { cursor node { name } }
                    pageInfo { hasNextPage endCursor }
                }
            }
        }"#,
    )
    .await;
    let tags = &data["todoItem"]["tags"];
    assert_eq!(tags["edges"][0]["node"]["name"], json!("docs"));
    assert_eq!(tags["edges"][0]["cursor"], json!(encode_cursor(0)));
    assert_eq!(tags["pageInfo"]["hasNextPage"], json!(true));

    let query = format!(
        r#"{{ todoItem(id: "1") {{ tags(paging: {{ first: 5, after: "{}" }}) {{
            edges {{ node {{ name }} }}
            pageInfo {{ hasNextPage hasPreviousPage }}
        }} }} }}"#,
        encode_cursor(0)
    );
    let data = execute(&schema, &query).await;
    let tags = &data["todoItem"]["tags"];
    assert_eq!(
        tags["edges"],
        json!([{ "node": { "name": "urgent" } }, { "node": { "name": "later" } }])
    );
    assert_eq!(
        tags["pageInfo"],
        json!({ "hasNextPage": false, "hasPreviousPage": true })
    );
}

#[test]
fn test_total_count_hidden_unless_enabled() {
    let sdl = schema(RelatableOpts::new()).sdl();
    let tags_connection = sdl
        .split("type TodoItemTagsConnection")
        .nth(1)
        .and_then(|rest| rest.split('}').next())
        .unwrap();
    assert!(!tags_connection.contains("totalCount"));

    let sdl = schema(RelatableOpts::new().with_total_count(true)).sdl();
    let tags_connection = sdl
        .split("type TodoItemTagsConnection")
        .nth(1)
        .and_then(|rest| rest.split('}').next())
        .unwrap();
    assert!(tags_connection.contains("totalCount"));
}

#[tokio::test]
async fn test_relation_aggregate_from_selection() {
    let schema = schema(RelatableOpts::new().with_aggregate(true));

    let data = execute(
        &schema,
        r#"{
            todoItem(id: "1") {
                subTasksAggregate {
                    count { id }
                    sum { estimate }
                    max { estimate }
                }
            }
        }"#,
    )
    .await;

    assert_eq!(
        data["todoItem"]["subTasksAggregate"],
        json!({
            "count": { "id": 3 },
            "sum": { "estimate": 6.0 },
            "max": { "estimate": 3 }
        })
    );
}

#[tokio::test]
async fn test_relation_mutations_return_updated_dto() {
    let schema = schema(RelatableOpts::new());

    let data = execute(
        &schema,
        r#"mutation {
            setAssigneeOnTodoItem(input: { id: "1", relationId: "u2" }) {
                assigneeId
                assignee { name }
            }
        }"#,
    )
    .await;
    assert_eq!(
        data["setAssigneeOnTodoItem"],
        json!({ "assigneeId": "u2", "assignee": { "name": "Grace" } })
    );

    let data = execute(
        &schema,
        r#"mutation {
            addSubTasksToTodoItem(input: { id: "1", relationIds: ["s4"] }) {
                subTasks { nodes { id } }
            }
        }"#,
    )
    .await;
    let ids: Vec<_> = data["addSubTasksToTodoItem"]["subTasks"]["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|node| node["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("s1"), json!("s2"), json!("s3"), json!("s4")]);

    let data = execute(
        &schema,
        r#"mutation {
            removeAssigneeFromTodoItem(input: { id: "1", relationId: "u2" }) {
                assignee { id }
            }
        }"#,
    )
    .await;
    assert_eq!(data["removeAssigneeFromTodoItem"], json!({ "assignee": null }));
}

#[tokio::test]
async fn test_unsupported_relation_operation_surfaces_as_error() {
    let schema = schema(RelatableOpts::new());

    let response = schema
        .execute(
            r#"mutation {
                removeSubTasksFromTodoItem(input: { id: "1", relationIds: ["s1"] }) { id }
            }"#,
        )
        .await;

    assert_eq!(response.errors.len(), 1);
    assert!(
        response.errors[0]
            .message
            .contains("remove_relations is not supported for relation subTasks")
    );
}

#[tokio::test]
async fn test_missing_record_resolves_to_null() {
    let schema = schema(RelatableOpts::new());
    let data = execute(&schema, r#"{ todoItem(id: "404") { id } }"#).await;
    assert_eq!(data, json!({ "todoItem": null }));
}

#[test]
fn test_aggregate_response_group_map_shape() {
    let mut response = AggregateResponse::default();
    response.count.insert("id".to_string(), json!(1));
    let expected: BTreeMap<String, Value> = [("id".to_string(), json!(1))].into_iter().collect();
    assert_eq!(response.group("count"), Some(&expected));
}
