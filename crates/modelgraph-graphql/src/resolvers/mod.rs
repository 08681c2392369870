//! GraphQL resolvers for model records.
//!
//! - `node`: singular lookups by global id (e.g., `Widget(id: "Widget:1")`)
//! - `connection`: paginated, filtered lists (e.g., `all_Widget(name: "gear")`)
//! - `fields`: object fields read from a fetched record
//! - `debug`: the request-scoped store call log

mod connection;
mod debug;
mod fields;
mod node;

pub use connection::{
    ConnectionPage, ConnectionResolver, ConnectionSpec, EdgeValue, PageWindow, PaginationArgs,
    PaginationError, cursor,
};
pub use debug::DebugResolver;
pub use fields::FieldResolver;
pub use node::NodeResolver;

use std::time::Instant;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_graphql::{Error as GraphQLError, Name, Value};

use crate::context::{DebugQuery, GraphQLContext};

/// Helper to extract GraphQL context from resolver context.
pub(crate) fn get_graphql_context<'a>(ctx: &'a ResolverContext<'_>) -> Result<&'a GraphQLContext, GraphQLError> {
    ctx.data::<GraphQLContext>()
        .map_err(|_| GraphQLError::new("GraphQL context not available"))
}

/// Records a completed store call in the request's query log.
pub(crate) fn log_store_call(
    gql_ctx: &GraphQLContext,
    model: &str,
    operation: &str,
    lookups: String,
    started: Instant,
) {
    gql_ctx
        .query_log
        .record(DebugQuery::new(model, operation, lookups, started.elapsed()));
}

/// Renders a primary key value for use inside a global id.
pub(crate) fn pk_to_string(pk: &serde_json::Value) -> String {
    match pk {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds a GraphQL object value from name/value pairs.
pub(crate) fn object_value<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(name, value)| (Name::new(name), value))
            .collect(),
    )
}

/// Resolver reading one key of a parent object value.
///
/// Used by the plain value types (`PageInfo`, `DebugInfo`, `DebugQuery`).
pub(crate) fn value_field(
    name: &'static str,
) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
    move |ctx| {
        FieldFuture::new(async move {
            let value = match ctx.parent_value.as_value() {
                Some(Value::Object(obj)) => obj.get(name).cloned(),
                _ => None,
            };
            Ok(value)
        })
    }
}

/// Convert a serde_json::Value to async_graphql::Value.
pub(crate) fn json_to_graphql_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Value::Number(
                    async_graphql::Number::from_f64(f).unwrap_or_else(|| async_graphql::Number::from(0)),
                )
            } else {
                Value::Null
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => {
            Value::List(arr.into_iter().map(json_to_graphql_value).collect())
        }
        serde_json::Value::Object(obj) => {
            let map: async_graphql::indexmap::IndexMap<Name, Value> = obj
                .into_iter()
                .map(|(k, v)| (Name::new(k), json_to_graphql_value(v)))
                .collect();
            Value::Object(map)
        }
    }
}
