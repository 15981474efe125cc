//! Integration tests for common Armature Query workflows.
//!
//! These tests go through the umbrella crate the way an application would.

use armature_query::logging::{LogConfig, LogFormat, LogLevel};
use armature_query::prelude::*;
use armature_query::{class_metadata_decorator, get_class_metadata};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Project {
    id: i64,
    name: String,
    lead_id: Option<String>,
}

struct Person;
struct Milestone;

struct ProjectService;

#[async_trait]
impl QueryService<Project> for ProjectService {
    async fn find_by_id(&self, id: &str) -> Result<Option<Project>> {
        Ok((id == "7").then(|| Project {
            id: 7,
            name: "Launch".to_string(),
            lead_id: Some("p1".to_string()),
        }))
    }

    async fn query_relations(
        &self,
        _relation_name: &str,
        _dto: &Project,
        query: &Query,
    ) -> Result<Vec<Value>> {
        let milestones = vec![
            json!({ "id": "m1", "title": "Alpha" }),
            json!({ "id": "m2", "title": "Beta" }),
        ];
        Ok(milestones
            .into_iter()
            .skip(query.paging.offset_or_zero() as usize)
            .collect())
    }
}

fn register(registry: &MetadataRegistry) {
    ObjectType::new("Project")
        .description("A tracked project")
        .field(FieldMetadata::new("id", FieldType::Id))
        .field(FieldMetadata::new("name", FieldType::String))
        .register(registry, ClassId::of::<Project>());
    ObjectType::new("Person")
        .field(FieldMetadata::new("id", FieldType::Id))
        .register(registry, ClassId::of::<Person>());
    ObjectType::new("Milestone")
        .field(FieldMetadata::new("id", FieldType::Id))
        .field(FieldMetadata::new("title", FieldType::String))
        .register(registry, ClassId::of::<Milestone>());

    Relation::unpaged("milestones", ClassId::of::<Milestone>())
        .disable_update()
        .disable_remove()
        .register(registry, ClassId::of::<Project>());
    Reference::new("lead", ClassId::of::<Person>())
        .key("id", "leadId")
        .nullable(true)
        .register(registry, ClassId::of::<Project>());
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_relatable_opts_from_toml() {
    let opts = RelatableOpts::from_toml_str(
        r#"
        enable_total_count = true
        enable_aggregate = false
        "#,
    )
    .unwrap();
    assert_eq!(opts, RelatableOpts::new().with_total_count(true));

    let err = RelatableOpts::from_toml_str("enable_total_count = [").unwrap_err();
    assert!(matches!(err, QueryError::Config(_)));
}

#[test]
fn test_log_config_builder() {
    let config = LogConfig::new()
        .level(LogLevel::Debug)
        .format(LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.format, LogFormat::Compact);
}

// =============================================================================
// Global registry
// =============================================================================

#[test]
fn test_class_decorator_on_global_registry() {
    struct Audited;

    let decorate = class_metadata_decorator::<&'static str>("workflow:audit-table");
    decorate(ClassId::of::<Audited>(), "audit_log");

    assert_eq!(
        get_class_metadata::<&'static str>(ClassId::of::<Audited>(), "workflow:audit-table"),
        Some("audit_log")
    );
    assert!(MetadataRegistry::global().has_metadata("workflow:audit-table", ClassId::of::<Audited>()));
}

// =============================================================================
// Schema
// =============================================================================

#[tokio::test]
async fn test_project_schema_end_to_end() {
    let registry = MetadataRegistry::new();
    register(&registry);

    let base = BaseServiceResolver::<Project>::new(&registry, Arc::new(ProjectService));
    let resolver = Relatable::<Project>::new(RelatableOpts::new()).apply(base);
    let schema = ResolverSchemaBuilder::new(&registry)
        .resolver(resolver)
        .build()
        .unwrap();

    let sdl = schema.sdl();
    assert!(!sdl.contains("type Mutation"));
    assert!(sdl.contains("input MilestoneSort"));
    assert!(sdl.contains("[Milestone!]!"));

    let response = schema
        .execute(r#"{ project(id: 7) { id name milestones { title } lead { id } } }"#)
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({
            "project": {
                "id": "7",
                "name": "Launch",
                "milestones": [{ "title": "Alpha" }, { "title": "Beta" }],
                "lead": { "id": "p1" }
            }
        })
    );
}
