//! End-to-end query tests against the in-memory store.

use std::sync::Arc;

use async_graphql::Request;
use modelgraph_core::{DynStore, FieldType, ModelDescriptor, ModelRegistry, StaticRegistry};
use modelgraph_db_memory::InMemoryStore;
use modelgraph_graphql::resolvers::cursor::offset_to_cursor;
use modelgraph_graphql::{GraphQLContext, Schema, SchemaBuilderConfig, build_schema};
use serde_json::{Value, json};

fn models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new("api", "Owner")
            .with_primary_key("code")
            .with_field("code", FieldType::Text)
            .with_field("name", FieldType::Text),
        ModelDescriptor::new("api", "Widget")
            .with_field("id", FieldType::Auto)
            .with_field("name", FieldType::Text)
            .with_field("size", FieldType::Integer)
            .with_field(
                "owner",
                FieldType::ForeignKey {
                    to: "Owner".into(),
                },
            )
            .with_field(
                "tags",
                FieldType::Array {
                    item: Box::new(FieldType::Text),
                },
            )
            .with_field("meta", FieldType::Json),
        ModelDescriptor::new("api", "Kit")
            .with_field("id", FieldType::Auto)
            .with_field("label", FieldType::Text)
            .with_field(
                "widgets",
                FieldType::ManyToMany {
                    to: "Widget".into(),
                },
            ),
    ]
}

const FIXTURES: &str = r#"[
    {"model": "api.owner", "pk": "acme", "fields": {"name": "Acme Corp"}},
    {"model": "api.owner", "pk": "zeta", "fields": {"name": "Zeta Ltd"}},
    {"model": "api.owner", "pk": "acme:eu", "fields": {"name": "Acme Europe"}},
    {"model": "api.widget", "pk": 1, "fields": {"name": "gear", "size": 3, "owner": "acme", "tags": ["a", "b"], "meta": {"color": "red"}}},
    {"model": "api.widget", "pk": 2, "fields": {"name": "bolt", "size": 1, "owner": "zeta", "tags": [], "meta": null}},
    {"model": "api.widget", "pk": 3, "fields": {"name": "nut", "size": 2, "owner": "acme", "tags": ["c"], "meta": null}},
    {"model": "api.widget", "pk": 4, "fields": {"name": "gear", "size": 5, "owner": null, "tags": null, "meta": [1, 2]}},
    {"model": "api.kit", "pk": 1, "fields": {"label": "starter", "widgets": [3, 1, 99]}},
    {"model": "api.kit", "pk": 2, "fields": {"label": "spare", "widgets": [2]}},
    {"model": "api.kit", "pk": 3, "fields": {"label": "empty", "widgets": []}}
]"#;

struct Harness {
    schema: Schema,
    store: DynStore,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(SchemaBuilderConfig::default())
    }

    fn with_config(config: SchemaBuilderConfig) -> Self {
        let models = models();
        let store = InMemoryStore::new();
        store.load_fixtures(&models, FIXTURES).unwrap();

        let registry: Arc<dyn ModelRegistry> = Arc::new(StaticRegistry::new(models));
        let schema = build_schema(registry, config).unwrap();
        Self {
            schema,
            store: Arc::new(store),
        }
    }

    /// Executes a query and returns `(data, error messages)`.
    async fn execute(&self, query: &str) -> (Value, Vec<String>) {
        let context = GraphQLContext::builder()
            .with_store(self.store.clone())
            .with_request_id("test-request")
            .build()
            .unwrap();

        let response = self.schema.execute(Request::new(query).data(context)).await;
        let errors = response.errors.iter().map(|e| e.message.clone()).collect();
        (response.data.into_json().unwrap(), errors)
    }

    async fn ok(&self, query: &str) -> Value {
        let (data, errors) = self.execute(query).await;
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        data
    }
}

fn raw_ids(data: &Value, field: &str) -> Vec<i64> {
    data[field]["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|edge| edge["node"]["_id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_node_lookup_renders_every_field_kind() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{
            Widget(id: "Widget:1") {
                id
                _id
                name
                size
                tags
                meta
                owner { id _id name }
            }
        }"#)
        .await;

    assert_eq!(
        data["Widget"],
        json!({
            "id": "Widget:1",
            "_id": 1,
            "name": "gear",
            "size": 3,
            "tags": ["a", "b"],
            "meta": "{\"color\":\"red\"}",
            "owner": {"id": "Owner:acme", "_id": null, "name": "Acme Corp"}
        })
    );
}

#[tokio::test]
async fn test_node_lookup_with_text_primary_key() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{ Owner(id: "Owner:zeta") { id _id code name } }"#)
        .await;

    assert_eq!(data["Owner"]["id"], "Owner:zeta");
    assert_eq!(data["Owner"]["_id"], Value::Null);
    assert_eq!(data["Owner"]["code"], "zeta");
}

#[tokio::test]
async fn test_global_id_of_key_with_delimiter_refetches_record() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{ all_Owner(code: "acme:eu") { edges { node { id } } } }"#)
        .await;
    let id = data["all_Owner"]["edges"][0]["node"]["id"].as_str().unwrap();
    assert_eq!(id, "Owner:acme:eu");

    let data = harness
        .ok(&format!(r#"{{ Owner(id: "{id}") {{ id code name }} }}"#))
        .await;
    assert_eq!(
        data["Owner"],
        json!({"id": "Owner:acme:eu", "code": "acme:eu", "name": "Acme Europe"})
    );
}

#[tokio::test]
async fn test_node_lookup_not_found_is_null() {
    let harness = Harness::new();
    let data = harness.ok(r#"{ Widget(id: "Widget:99") { id } }"#).await;
    assert_eq!(data["Widget"], Value::Null);
}

#[tokio::test]
async fn test_node_lookup_rejects_other_type() {
    let harness = Harness::new();
    let (data, errors) = harness.execute(r#"{ Widget(id: "Owner:acme") { id } }"#).await;

    assert_eq!(data["Widget"], Value::Null);
    assert_eq!(errors, ["Must receive a Widget id."]);
}

#[tokio::test]
async fn test_node_lookup_rejects_malformed_id() {
    let harness = Harness::new();
    let (_, errors) = harness.execute(r#"{ Widget(id: "1") { id } }"#).await;
    assert_eq!(errors.len(), 1);

    let (_, errors) = harness.execute(r#"{ Widget(id: "Widget:abc") { id } }"#).await;
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn test_dangling_relation_is_null() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{ Widget(id: "Widget:4") { owner { id } tags meta } }"#)
        .await;

    assert_eq!(data["Widget"]["owner"], Value::Null);
    assert_eq!(data["Widget"]["tags"], Value::Null);
    assert_eq!(data["Widget"]["meta"], "[1,2]");
}

#[tokio::test]
async fn test_connection_lists_in_primary_key_order() {
    let harness = Harness::new();
    let data = harness.ok("{ all_Widget { edges { node { _id } } } }").await;
    assert_eq!(raw_ids(&data, "all_Widget"), [1, 2, 3, 4]);
}

#[tokio::test]
async fn test_exact_filter() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{ all_Widget(name: "gear") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [1, 4]);

    let data = harness
        .ok("{ all_Widget(size: 2) { edges { node { _id } } } }")
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [3]);
}

#[tokio::test]
async fn test_in_filter_takes_comma_separated_values() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{ all_Widget(name__in: "bolt,nut") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [2, 3]);

    let data = harness
        .ok(r#"{ all_Widget(size__in: "5,1") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [2, 4]);
}

#[tokio::test]
async fn test_empty_in_filter_is_ignored() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{ all_Widget(name__in: "") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [1, 2, 3, 4]);
}

#[tokio::test]
async fn test_empty_exact_filter_is_ignored() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{ all_Widget(name: "") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [1, 2, 3, 4]);

    let data = harness
        .ok(r#"{ all_Owner(name: "") { edges { node { code } } } }"#)
        .await;
    assert_eq!(data["all_Owner"]["edges"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_foreign_key_filter_accepts_global_id() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{ all_Widget(owner: "Owner:acme") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [1, 3]);

    let data = harness
        .ok(r#"{ all_Widget(owner__in: "zeta,Owner:acme") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [1, 2, 3]);
}

#[tokio::test]
async fn test_invalid_filter_value_is_an_error() {
    let harness = Harness::new();
    let (_, errors) = harness
        .execute(r#"{ all_Widget(size__in: "1,big") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn test_order_by() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{ all_Widget(orderBy: "-size") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [4, 1, 3, 2]);

    let data = harness
        .ok(r#"{ all_Widget(orderBy: "name,-id") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [2, 4, 1, 3]);
}

#[tokio::test]
async fn test_order_by_unknown_field_is_an_error() {
    let harness = Harness::new();
    let (_, errors) = harness
        .execute(r#"{ all_Widget(orderBy: "colour") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn test_forward_pagination() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{
            all_Widget(first: 2) {
                pageInfo { hasNextPage hasPreviousPage startCursor endCursor }
                edges { cursor node { _id } }
            }
        }"#)
        .await;

    assert_eq!(raw_ids(&data, "all_Widget"), [1, 2]);
    let page_info = &data["all_Widget"]["pageInfo"];
    assert_eq!(page_info["hasNextPage"], true);
    assert_eq!(page_info["hasPreviousPage"], false);
    assert_eq!(page_info["startCursor"], offset_to_cursor(0));
    assert_eq!(page_info["endCursor"], offset_to_cursor(1));
    assert_eq!(data["all_Widget"]["edges"][1]["cursor"], offset_to_cursor(1));

    let query = format!(
        r#"{{ all_Widget(first: 2, after: "{}") {{ pageInfo {{ hasNextPage }} edges {{ node {{ _id }} }} }} }}"#,
        offset_to_cursor(1)
    );
    let data = harness.ok(&query).await;
    assert_eq!(raw_ids(&data, "all_Widget"), [3, 4]);
    assert_eq!(data["all_Widget"]["pageInfo"]["hasNextPage"], false);
}

#[tokio::test]
async fn test_backward_pagination() {
    let harness = Harness::new();
    let data = harness
        .ok("{ all_Widget(last: 1) { pageInfo { hasPreviousPage hasNextPage } edges { node { _id } } } }")
        .await;

    assert_eq!(raw_ids(&data, "all_Widget"), [4]);
    assert_eq!(data["all_Widget"]["pageInfo"]["hasPreviousPage"], true);
    assert_eq!(data["all_Widget"]["pageInfo"]["hasNextPage"], false);

    let query = format!(
        r#"{{ all_Widget(last: 2, before: "{}") {{ edges {{ node {{ _id }} }} }} }}"#,
        offset_to_cursor(3)
    );
    let data = harness.ok(&query).await;
    assert_eq!(raw_ids(&data, "all_Widget"), [2, 3]);
}

#[tokio::test]
async fn test_offset_pagination() {
    let harness = Harness::new();
    let data = harness
        .ok("{ all_Widget(offset: 1, first: 2) { edges { cursor node { _id } } } }")
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [2, 3]);
    assert_eq!(data["all_Widget"]["edges"][0]["cursor"], offset_to_cursor(1));
}

#[tokio::test]
async fn test_invalid_cursor_is_ignored() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{ all_Widget(after: "garbage", first: 1) { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [1]);
}

#[tokio::test]
async fn test_empty_connection() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{
            all_Widget(name: "sprocket") {
                pageInfo { hasNextPage hasPreviousPage startCursor endCursor }
                edges { node { _id } }
            }
        }"#)
        .await;

    assert_eq!(data["all_Widget"]["edges"], json!([]));
    assert_eq!(
        data["all_Widget"]["pageInfo"],
        json!({
            "hasNextPage": false,
            "hasPreviousPage": false,
            "startCursor": null,
            "endCursor": null
        })
    );
}

#[tokio::test]
async fn test_page_size_limit() {
    let harness = Harness::with_config(SchemaBuilderConfig {
        max_limit: 3,
        ..Default::default()
    });

    let data = harness
        .ok("{ all_Widget { pageInfo { hasNextPage } edges { node { _id } } } }")
        .await;
    assert_eq!(raw_ids(&data, "all_Widget"), [1, 2, 3]);
    assert_eq!(data["all_Widget"]["pageInfo"]["hasNextPage"], true);

    let (data, errors) = harness
        .execute("{ all_Widget(first: 4) { edges { node { _id } } } }")
        .await;
    assert_eq!(data["all_Widget"], Value::Null);
    assert_eq!(
        errors,
        ["Requesting 4 records on the `all_Widget` connection exceeds the `first` limit of 3 records."]
    );
}

#[tokio::test]
async fn test_invalid_pagination_arguments() {
    let harness = Harness::new();

    let (_, errors) = harness
        .execute("{ all_Widget(first: -1) { edges { node { _id } } } }")
        .await;
    assert_eq!(errors, ["Argument 'first' must be a non-negative integer."]);

    let query = format!(
        r#"{{ all_Widget(offset: 1, before: "{}") {{ edges {{ node {{ _id }} }} }} }}"#,
        offset_to_cursor(3)
    );
    let (_, errors) = harness.execute(&query).await;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("`before`"));
}

#[tokio::test]
async fn test_debug_reports_store_calls() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{
            all_Widget(name: "gear", first: 1) { edges { node { name } } }
            _debug { queries { model operation lookups } }
        }"#)
        .await;

    let queries = data["_debug"]["queries"].as_array().unwrap();
    let operations: Vec<_> = queries.iter().map(|q| q["operation"].as_str().unwrap()).collect();
    assert_eq!(operations, ["count", "query"]);
    assert!(queries.iter().all(|q| q["model"] == "api.Widget"));
    assert!(queries[0]["lookups"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_debug_alone_is_empty() {
    let harness = Harness::new();
    let data = harness.ok("{ _debug { queries { model } } }").await;
    assert_eq!(data["_debug"]["queries"], json!([]));
}

#[tokio::test]
async fn test_debug_log_is_per_request() {
    let harness = Harness::new();
    harness.ok(r#"{ Widget(id: "Widget:1") { name } }"#).await;

    let data = harness
        .ok(r#"{ Owner(id: "Owner:acme") { name } _debug { queries { model operation } } }"#)
        .await;
    assert_eq!(
        data["_debug"]["queries"],
        json!([{"model": "api.Owner", "operation": "get"}])
    );
}

#[tokio::test]
async fn test_many_to_many_lists_related_records() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{
            starter: Kit(id: "Kit:1") { widgets { id name } }
            empty: Kit(id: "Kit:3") { widgets { id } }
        }"#)
        .await;

    // Ordered by primary key; the dangling key 99 is skipped.
    assert_eq!(
        data["starter"]["widgets"],
        json!([
            {"id": "Widget:1", "name": "gear"},
            {"id": "Widget:3", "name": "nut"}
        ])
    );
    assert_eq!(data["empty"]["widgets"], json!([]));
}

#[tokio::test]
async fn test_many_to_many_filters_by_related_key() {
    let harness = Harness::new();
    let data = harness
        .ok(r#"{ all_Kit(widgets: "Widget:2") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Kit"), [2]);

    let data = harness
        .ok(r#"{ all_Kit(widgets: "3") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Kit"), [1]);

    let data = harness
        .ok(r#"{ all_Kit(widgets__in: "2,Widget:1") { edges { node { _id } } } }"#)
        .await;
    assert_eq!(raw_ids(&data, "all_Kit"), [1, 2]);
}
