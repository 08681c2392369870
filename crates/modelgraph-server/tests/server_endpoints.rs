use std::fs;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use modelgraph_server::{AppConfig, ServerBuilder, StartupError};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const MANIFEST: &str = r#"
apps = ["api"]

[[models]]
app = "api"
name = "Widget"
fields = [
    { name = "id", type = "auto" },
    { name = "name", type = "text" },
]
"#;

const FIXTURES: &str = r#"[
    {"model": "api.widget", "pk": 1, "fields": {"name": "sprocket"}},
    {"model": "api.widget", "pk": 2, "fields": {"name": "cog"}}
]"#;

fn write_models(dir: &TempDir) -> AppConfig {
    let manifest = dir.path().join("models.toml");
    let fixtures = dir.path().join("fixtures.json");
    fs::write(&manifest, MANIFEST).expect("write manifest");
    fs::write(&fixtures, FIXTURES).expect("write fixtures");

    let mut cfg = AppConfig::default();
    cfg.models.manifest = manifest;
    cfg.models.fixtures = Some(fixtures);
    cfg
}

fn app(cfg: AppConfig) -> Router {
    ServerBuilder::new()
        .with_config(cfg)
        .build()
        .expect("build server")
        .into_router()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoints_work() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(write_models(&dir));

    let resp = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["service"], "modelgraph");
    assert_eq!(body["graphql"], "/graphql");

    let resp = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "ok");
}

#[tokio::test]
async fn graphql_post_serves_seeded_records() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(write_models(&dir));

    let request = Request::post("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"query": "{ all_Widget { edges { node { id name } } } }"}).to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert!(body.get("errors").is_none(), "{body}");
    assert_eq!(
        body["data"]["all_Widget"]["edges"],
        json!([
            {"node": {"id": "Widget:1", "name": "sprocket"}},
            {"node": {"id": "Widget:2", "name": "cog"}}
        ])
    );
}

#[tokio::test]
async fn graphql_get_with_variables() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(write_models(&dir));

    let uri = "/graphql?query=query%20One(%24id%3A%20ID!)%20%7B%20Widget(id%3A%20%24id)%20%7B%20name%20%7D%20%7D&variables=%7B%22id%22%3A%22Widget%3A2%22%7D";
    let resp = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["Widget"]["name"], "cog");
}

#[tokio::test]
async fn graphql_rejects_empty_query() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(write_models(&dir));

    let request = Request::post("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"query": "  "}).to_string()))
        .unwrap();
    let resp = app.oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    assert_eq!(body["errors"][0]["extensions"]["code"], "INVALID_QUERY");
}

#[tokio::test]
async fn graphql_depth_limit_is_reported_in_body() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = write_models(&dir);
    cfg.graphql.max_depth = 2;
    let app = app(cfg);

    let request = Request::post("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"query": "{ all_Widget { edges { node { name } } } }"}).to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert!(body.get("data").is_none(), "{body}");
    assert_eq!(body["errors"][0]["message"], "Query is nested too deep.");
}

#[test]
fn missing_manifest_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = AppConfig::default();
    cfg.models.manifest = dir.path().join("nope.toml");

    let err = ServerBuilder::new().with_config(cfg).build().err().unwrap();
    assert!(matches!(err, StartupError::Registry(_)));
}

#[test]
fn unknown_namespace_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = write_models(&dir);
    cfg.graphql.namespace = "billing".into();

    let err = ServerBuilder::new().with_config(cfg).build().err().unwrap();
    assert!(matches!(err, StartupError::Registry(_)));
}
