//! Axum HTTP handlers for the GraphQL endpoint.
//!
//! - `POST /graphql` - GraphQL request in a JSON body
//! - `GET /graphql` - GraphQL request in URL query parameters

use std::sync::Arc;

use async_graphql::dynamic::Schema;
use async_graphql::{Request, Response, Variables};
use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use modelgraph_core::DynStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::context::{GraphQLContext, GraphQLContextBuilder};
use crate::error::GraphQLError;

/// Path of the GraphQL endpoint.
pub const GRAPHQL_PATH: &str = "/graphql";

/// State shared across GraphQL handlers.
#[derive(Clone)]
pub struct GraphQLState {
    /// The schema, built once at startup.
    pub schema: Arc<Schema>,

    /// Record store handed to every request context.
    pub store: DynStore,
}

impl GraphQLState {
    /// Creates handler state.
    #[must_use]
    pub fn new(schema: Schema, store: DynStore) -> Self {
        Self {
            schema: Arc::new(schema),
            store,
        }
    }
}

/// Returns a router serving the GraphQL endpoint.
pub fn graphql_router(state: GraphQLState) -> Router {
    Router::new()
        .route(GRAPHQL_PATH, get(graphql_handler_get).post(graphql_handler))
        .with_state(state)
}

/// GraphQL request body.
#[derive(Debug, Deserialize)]
pub struct GraphQLRequest {
    /// The GraphQL query string.
    pub query: String,

    /// Optional operation name for multi-operation documents.
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Optional variables for the query.
    pub variables: Option<serde_json::Value>,
}

/// Query parameters for GET requests.
#[derive(Debug, Deserialize)]
pub struct GraphQLQueryParams {
    /// The GraphQL query string.
    pub query: Option<String>,

    /// Optional operation name.
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Optional variables (JSON string).
    pub variables: Option<String>,
}

/// GraphQL response body.
#[derive(Debug, Serialize)]
pub struct GraphQLResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl From<Response> for GraphQLResponse {
    fn from(resp: Response) -> Self {
        let data_json = serde_json::to_value(&resp.data).unwrap_or(serde_json::Value::Null);
        let data = if data_json.is_null() {
            None
        } else {
            Some(data_json)
        };

        let errors = resp
            .errors
            .into_iter()
            .map(|e| serde_json::to_value(&e).unwrap_or_else(|_| serde_json::json!({ "message": e.message })))
            .collect();

        Self {
            data,
            errors,
            extensions: if resp.extensions.is_empty() {
                None
            } else {
                Some(serde_json::to_value(&resp.extensions).unwrap_or(serde_json::Value::Null))
            },
        }
    }
}

/// Handles POST requests to /graphql.
pub async fn graphql_handler(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Json(request): Json<GraphQLRequest>,
) -> impl IntoResponse {
    debug!("Processing GraphQL request");
    execute_graphql(state, headers, request).await.into_response()
}

/// Handles GET requests to /graphql.
pub async fn graphql_handler_get(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Query(params): Query<GraphQLQueryParams>,
) -> impl IntoResponse {
    let request = match params_to_request(params) {
        Ok(req) => req,
        Err(e) => {
            return error_response(GraphQLError::InvalidQuery(e.to_string())).into_response();
        }
    };

    debug!("Processing GraphQL GET request");
    execute_graphql(state, headers, request).await.into_response()
}

/// Executes a GraphQL request.
async fn execute_graphql(
    state: GraphQLState,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> impl IntoResponse {
    if request.query.trim().is_empty() {
        return error_response(GraphQLError::InvalidQuery("query must not be empty".into()))
            .into_response();
    }

    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let context = match build_context(&state, request_id) {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!(error = %e, "Failed to build GraphQL context");
            return error_response(GraphQLError::Internal(e.to_string())).into_response();
        }
    };

    let mut gql_request = Request::new(&request.query);

    if let Some(op_name) = request.operation_name {
        gql_request = gql_request.operation_name(op_name);
    }

    if let Some(vars) = request.variables {
        gql_request = gql_request.variables(Variables::from_json(vars));
    }

    gql_request = gql_request.data(context);

    debug!(query = %request.query, "Executing GraphQL query");
    let response = state.schema.execute(gql_request).await;

    // GraphQL reports execution errors in the body with 200 OK.
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(GraphQLResponse::from(response)),
    )
        .into_response()
}

fn build_context(
    state: &GraphQLState,
    request_id: String,
) -> Result<GraphQLContext, crate::context::ContextBuilderError> {
    GraphQLContextBuilder::new()
        .with_store(state.store.clone())
        .with_request_id(request_id)
        .build()
}

/// Converts GET query params to a GraphQL request.
fn params_to_request(params: GraphQLQueryParams) -> Result<GraphQLRequest, serde_json::Error> {
    let variables = if let Some(vars_str) = params.variables {
        Some(serde_json::from_str(&vars_str)?)
    } else {
        None
    };

    Ok(GraphQLRequest {
        query: params.query.unwrap_or_default(),
        operation_name: params.operation_name,
        variables,
    })
}

/// Returns an error response.
fn error_response(error: GraphQLError) -> impl IntoResponse {
    let status = StatusCode::from_u16(error.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = serde_json::json!({
        "errors": [{
            "message": error.to_string(),
            "extensions": {
                "code": error.error_code()
            }
        }]
    });

    (status, [(header::CONTENT_TYPE, "application/json")], Json(body))
}
