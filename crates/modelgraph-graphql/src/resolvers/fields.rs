//! Object field resolvers.
//!
//! Object types resolve against a fetched [`Record`]. Scalar values are
//! coerced to the field's GraphQL scalar so that loosely typed stored data
//! never produces an invalid response.

use std::sync::Arc;
use std::time::Instant;

use async_graphql::ErrorExtensions;
use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use async_graphql::Value;
use modelgraph_core::{Lookup, ModelDescriptor, Record, RecordQuery};
use tracing::warn;

use super::{get_graphql_context, json_to_graphql_value, log_store_call, pk_to_string};
use crate::error::GraphQLError;
use crate::global_id::to_global_id;
use crate::schema::ScalarKind;

fn coerce_int(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map_or(Value::Null, |i| Value::Number(i.into())),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_or(Value::Null, |i| Value::Number(i.into())),
        _ => Value::Null,
    }
}

fn coerce_float(value: &serde_json::Value) -> Value {
    let float = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    float
        .and_then(async_graphql::Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

/// Coerces a stored JSON value to the representation of `kind`.
///
/// Values that cannot be represented become null.
pub(crate) fn coerce_output(kind: ScalarKind, value: &serde_json::Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match kind {
        ScalarKind::Int => coerce_int(value),
        ScalarKind::Float => coerce_float(value),
        ScalarKind::Boolean => match value {
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            _ => Value::Null,
        },
        ScalarKind::String | ScalarKind::Id => match value {
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string()),
        },
        ScalarKind::JsonString => Value::String(value.to_string()),
    }
}

/// Resolvers for the fields of a model's object type.
pub struct FieldResolver;

impl FieldResolver {
    /// Resolver for `id`: the global id built from the primary key.
    pub fn global_id(
        type_name: String,
        primary_key: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let type_name = type_name.clone();
            let primary_key = primary_key.clone();
            FieldFuture::new(async move {
                let record = ctx.parent_value.try_downcast_ref::<Record>()?;
                let pk = record
                    .get(&primary_key)
                    .filter(|pk| !pk.is_null())
                    .ok_or_else(|| {
                        async_graphql::Error::new(format!(
                            "{type_name} record has no value for primary key '{primary_key}'"
                        ))
                    })?;
                Ok(Some(Value::String(to_global_id(&type_name, &pk_to_string(pk)))))
            })
        }
    }

    /// Resolver for `_id`: the integer primary key, or null when the key
    /// is not integral.
    pub fn raw_id(
        primary_key: String,
        integral: bool,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let primary_key = primary_key.clone();
            FieldFuture::new(async move {
                if !integral {
                    return Ok(None::<Value>);
                }
                let record = ctx.parent_value.try_downcast_ref::<Record>()?;
                Ok(record.get(&primary_key).map(coerce_int))
            })
        }
    }

    /// Resolver for a scalar model field.
    pub fn scalar(
        field: String,
        kind: ScalarKind,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let field = field.clone();
            FieldFuture::new(async move {
                let record = ctx.parent_value.try_downcast_ref::<Record>()?;
                Ok(record.get(&field).map(|v| coerce_output(kind, v)))
            })
        }
    }

    /// Resolver for an array model field.
    pub fn list(
        field: String,
        kind: ScalarKind,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let field = field.clone();
            FieldFuture::new(async move {
                let record = ctx.parent_value.try_downcast_ref::<Record>()?;
                let value = match record.get(&field) {
                    Some(serde_json::Value::Array(items)) => Value::List(
                        items.iter().map(|item| coerce_output(kind, item)).collect(),
                    ),
                    Some(serde_json::Value::Null) | None => Value::Null,
                    Some(other) => {
                        warn!(field = %field, value = %other, "Array field holds a non-array value");
                        json_to_graphql_value(other.clone())
                    }
                };
                Ok(Some(value))
            })
        }
    }

    /// Resolver for a foreign key: fetches the referenced record.
    ///
    /// A dangling reference resolves to null.
    pub fn relation(
        field: String,
        target: Arc<ModelDescriptor>,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let field = field.clone();
            let target = target.clone();
            FieldFuture::new(async move {
                let record = ctx.parent_value.try_downcast_ref::<Record>()?;
                let pk = match record.get(&field) {
                    Some(pk) if !pk.is_null() => pk.clone(),
                    _ => return Ok(None),
                };

                let gql_ctx = get_graphql_context(&ctx)?;
                let started = Instant::now();
                let related = gql_ctx.store.get(&target, &pk).await.map_err(|e| {
                    warn!(error = %e, "Store error resolving relation");
                    GraphQLError::from(e).extend()
                })?;
                log_store_call(
                    gql_ctx,
                    &target.label(),
                    "get",
                    format!("{}={pk}", target.primary_key),
                    started,
                );

                Ok(related.map(FieldValue::owned_any))
            })
        }
    }

    /// Resolver for a many-to-many field: fetches the referenced records
    /// in one store query, ordered by primary key.
    ///
    /// Keys without a record are skipped.
    pub fn relation_list(
        field: String,
        target: Arc<ModelDescriptor>,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let field = field.clone();
            let target = target.clone();
            FieldFuture::new(async move {
                let record = ctx.parent_value.try_downcast_ref::<Record>()?;
                let keys = match record.get(&field) {
                    Some(serde_json::Value::Array(keys)) => keys.clone(),
                    Some(serde_json::Value::Null) | None => return Ok(None),
                    Some(other) => vec![other.clone()],
                };
                if keys.is_empty() {
                    return Ok(Some(FieldValue::list(Vec::<FieldValue>::new())));
                }

                let gql_ctx = get_graphql_context(&ctx)?;
                let query =
                    RecordQuery::new().with_lookup(Lookup::one_of(&target.primary_key, keys));
                let started = Instant::now();
                let related = gql_ctx.store.query(&target, &query).await.map_err(|e| {
                    warn!(error = %e, "Store error resolving related records");
                    GraphQLError::from(e).extend()
                })?;
                log_store_call(
                    gql_ctx,
                    &target.label(),
                    "query",
                    query.describe_lookups(),
                    started,
                );

                Ok(Some(FieldValue::list(
                    related.records.into_iter().map(FieldValue::owned_any),
                )))
            })
        }
    }
}
