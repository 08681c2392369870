//! Record store trait.
//!
//! The store stands in for the object-relational mapper: it owns query
//! planning, filtering and ordering. The GraphQL layer only translates
//! arguments into a [`RecordQuery`] and hands it over.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::model::ModelDescriptor;
use crate::types::{QueryResult, Record, RecordQuery};

/// Read access to the records of registered models.
///
/// Implementations must be thread-safe (`Send + Sync`): one store is shared
/// by every concurrently executing query.
///
/// # Example
///
/// ```ignore
/// use modelgraph_core::{RecordQuery, RecordStore, StoreError};
///
/// async fn named(store: &dyn RecordStore, widget: &ModelDescriptor) -> Result<usize, StoreError> {
///     let query = RecordQuery::new().with_exact("name", "sprocket");
///     Ok(store.query(widget, &query).await?.total)
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetches one record by primary key.
    ///
    /// Returns `None` if no record has this key.
    ///
    /// # Errors
    ///
    /// Returns an error only for unknown models or infrastructure issues.
    async fn get(&self, model: &ModelDescriptor, pk: &Value)
    -> Result<Option<Record>, StoreError>;

    /// Runs a filtered, ordered and windowed query.
    ///
    /// `QueryResult::total` counts every match before `offset` and `limit`
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownField`] when a lookup or ordering names a
    /// field the model does not declare.
    async fn query(
        &self,
        model: &ModelDescriptor,
        query: &RecordQuery,
    ) -> Result<QueryResult, StoreError>;
}
