//! GraphQL execution context.
//!
//! The context is constructed per request and carries the record store the
//! resolvers read from, the request id used for log correlation, and the
//! query log that backs the `_debug` field.
//!
//! # Example
//!
//! ```ignore
//! use modelgraph_graphql::GraphQLContextBuilder;
//!
//! let context = GraphQLContextBuilder::new()
//!     .with_store(store.clone())
//!     .with_request_id("req-123")
//!     .build()?;
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use modelgraph_core::DynStore;

/// One store call made while resolving a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugQuery {
    /// `app.Model` label.
    pub model: String,
    /// Store operation: `get`, `count` or `query`.
    pub operation: String,
    /// Rendered lookups, e.g. `name=gear, size__in=[1, 2]`.
    pub lookups: String,
    /// Wall time spent in the store.
    pub duration: Duration,
}

impl DebugQuery {
    /// Creates a new entry.
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        operation: impl Into<String>,
        lookups: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            model: model.into(),
            operation: operation.into(),
            lookups: lookups.into(),
            duration,
        }
    }
}

/// Request-scoped log of store calls.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct QueryLog {
    entries: Arc<Mutex<Vec<DebugQuery>>>,
}

impl QueryLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Entries stay readable after a panic while the lock was held.
    fn lock(&self) -> MutexGuard<'_, Vec<DebugQuery>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry.
    pub fn record(&self, entry: DebugQuery) {
        self.lock().push(entry);
    }

    /// Returns a snapshot of the entries recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<DebugQuery> {
        self.lock().clone()
    }

    /// Returns the number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// GraphQL execution context.
#[derive(Clone)]
pub struct GraphQLContext {
    /// Record store.
    pub store: DynStore,

    /// Request ID for tracing and correlation.
    pub request_id: String,

    /// Store calls made by this request.
    pub query_log: QueryLog,
}

impl GraphQLContext {
    /// Creates a new builder for GraphQLContext.
    #[must_use]
    pub fn builder() -> GraphQLContextBuilder {
        GraphQLContextBuilder::default()
    }
}

/// Builder for constructing GraphQLContext.
#[derive(Default)]
pub struct GraphQLContextBuilder {
    store: Option<DynStore>,
    request_id: Option<String>,
}

impl GraphQLContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the record store.
    #[must_use]
    pub fn with_store(mut self, store: DynStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the request ID.
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Builds the GraphQLContext with a fresh query log.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<GraphQLContext, ContextBuilderError> {
        let store = self
            .store
            .ok_or(ContextBuilderError::MissingField("store"))?;

        let request_id = self
            .request_id
            .ok_or(ContextBuilderError::MissingField("request_id"))?;

        Ok(GraphQLContext {
            store,
            request_id,
            query_log: QueryLog::new(),
        })
    }
}

/// Errors that can occur when building a GraphQLContext.
#[derive(Debug, thiserror::Error)]
pub enum ContextBuilderError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
