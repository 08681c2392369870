//! Resolver for the `_debug` field.
//!
//! Reports the store calls the request made before the field resolved.
//! Root fields resolve in selection order, so clients select `_debug` last.

use async_graphql::Value;
use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};

use super::object_value;
use crate::context::{DebugQuery, GraphQLContext};

fn debug_query_value(query: &DebugQuery) -> Value {
    let duration_ms = async_graphql::Number::from_f64(query.duration.as_secs_f64() * 1000.0)
        .map_or(Value::Null, Value::Number);
    object_value([
        ("model", Value::String(query.model.clone())),
        ("operation", Value::String(query.operation.clone())),
        ("lookups", Value::String(query.lookups.clone())),
        ("durationMs", duration_ms),
    ])
}

/// Resolver for the debug field.
pub struct DebugResolver;

impl DebugResolver {
    /// Resolver for `Query._debug`.
    pub fn resolve() -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        |ctx| {
            FieldFuture::new(async move {
                let queries: Vec<Value> = ctx
                    .data_opt::<GraphQLContext>()
                    .map(|gql_ctx| gql_ctx.query_log.entries())
                    .unwrap_or_default()
                    .iter()
                    .map(debug_query_value)
                    .collect();
                Ok(Some(object_value([("queries", Value::List(queries))])))
            })
        }
    }

    /// Resolver for `DebugInfo.queries`.
    pub fn queries() -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        |ctx| {
            FieldFuture::new(async move {
                let queries = match ctx.parent_value.as_value() {
                    Some(Value::Object(obj)) => match obj.get("queries") {
                        Some(Value::List(items)) => items.clone(),
                        _ => Vec::new(),
                    },
                    _ => Vec::new(),
                };
                Ok(Some(FieldValue::list(queries.into_iter().map(FieldValue::value))))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_debug_query_value() {
        let query = DebugQuery::new("api.Widget", "query", "name=gear", Duration::from_millis(3));
        let Value::Object(obj) = debug_query_value(&query) else {
            panic!("expected object");
        };
        assert_eq!(obj.get("model"), Some(&Value::String("api.Widget".into())));
        assert_eq!(obj.get("lookups"), Some(&Value::String("name=gear".into())));
        assert!(matches!(obj.get("durationMs"), Some(Value::Number(_))));
    }
}
