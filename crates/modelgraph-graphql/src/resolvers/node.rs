//! Singular lookup resolver.
//!
//! Implements resolvers for queries like `Widget(id: "Widget:42")` that
//! fetch one record by its global id.

use std::sync::Arc;
use std::time::Instant;

use async_graphql::ErrorExtensions;
use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use modelgraph_core::ModelDescriptor;
use tracing::{debug, warn};

use super::{get_graphql_context, log_store_call};
use crate::error::GraphQLError;
use crate::global_id::GlobalId;

/// Resolver for singular lookups.
pub struct NodeResolver;

impl NodeResolver {
    /// Creates a resolver function fetching one `model` record by global id.
    ///
    /// Tokens naming another type are rejected. A well-formed id with no
    /// matching record resolves to null.
    pub fn resolve(
        model: Arc<ModelDescriptor>,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let model = model.clone();
            FieldFuture::new(async move {
                let token = ctx
                    .args
                    .get("id")
                    .and_then(|v| v.string().ok())
                    .ok_or_else(|| async_graphql::Error::new("Missing required argument 'id'"))?;

                let id = GlobalId::decode(token)?.expect_type(&model.name)?;
                let pk = model.parse_pk(&id)?;

                debug!(model = %model.label(), pk = %pk, "Resolving singular lookup");

                let gql_ctx = get_graphql_context(&ctx)?;
                let started = Instant::now();
                let record = gql_ctx.store.get(&model, &pk).await.map_err(|e| {
                    warn!(error = %e, "Store error reading record");
                    GraphQLError::from(e).extend()
                })?;
                log_store_call(
                    gql_ctx,
                    &model.label(),
                    "get",
                    format!("{}={pk}", model.primary_key),
                    started,
                );

                if record.is_none() {
                    debug!(model = %model.label(), pk = %pk, "Record not found");
                }
                Ok(record.map(FieldValue::owned_any))
            })
        }
    }
}
