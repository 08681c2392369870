use async_trait::async_trait;
use modelgraph_core::{ModelDescriptor, QueryResult, Record, RecordQuery, RecordStore, StoreError};
use papaya::HashMap as PapayaHashMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

use crate::query::{compare_records, matches_lookup};

pub type StorageKey = String; // Format: "app.Model/pk"

pub(crate) fn make_storage_key(label: &str, pk: &Value) -> StorageKey {
    match pk {
        Value::String(s) => format!("{label}/{s}"),
        other => format!("{label}/{other}"),
    }
}

/// In-memory record store using papaya lock-free HashMap.
///
/// This store provides:
/// - Lock-free concurrent reads via papaya::HashMap
/// - Primary-key fetches and filtered, ordered, windowed queries
/// - Fixture loading for seeding development data
///
/// Only models registered with the store can be read or written.
#[derive(Debug)]
pub struct InMemoryStore {
    /// Records keyed by "app.Model/pk"
    pub(crate) data: Arc<PapayaHashMap<StorageKey, Record>>,
    /// Registered model labels
    pub(crate) models: PapayaHashMap<String, ()>,
}

impl InMemoryStore {
    /// Creates an empty store with no registered models.
    pub fn new() -> Self {
        Self {
            data: Arc::new(PapayaHashMap::new()),
            models: PapayaHashMap::new(),
        }
    }

    /// Creates an empty store with the given models registered.
    pub fn with_models(models: &[ModelDescriptor]) -> Self {
        let store = Self::new();
        for model in models {
            store.register_model(model);
        }
        store
    }

    /// Registers a model so that records of it can be stored.
    pub fn register_model(&self, model: &ModelDescriptor) {
        self.models.pin().insert(model.label(), ());
    }

    /// Inserts a record, replacing any record with the same primary key.
    pub fn insert(&self, model: &ModelDescriptor, record: Record) -> Result<(), StoreError> {
        self.ensure_registered(model)?;

        let pk = match record.get(&model.primary_key) {
            Some(Value::Null) | None => {
                return Err(StoreError::invalid_record(format!(
                    "{} record is missing primary key '{}'",
                    model.label(),
                    model.primary_key
                )));
            }
            Some(pk) => pk,
        };

        let key = make_storage_key(&model.label(), pk);
        self.data.pin().insert(key, record);
        Ok(())
    }

    /// Returns the number of stored records across all models.
    pub fn len(&self) -> usize {
        self.data.pin().len()
    }

    /// Returns `true` if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_registered(&self, model: &ModelDescriptor) -> Result<(), StoreError> {
        let label = model.label();
        if self.models.pin().contains_key(&label) {
            Ok(())
        } else {
            Err(StoreError::unknown_model(label))
        }
    }

    fn check_fields(model: &ModelDescriptor, query: &RecordQuery) -> Result<(), StoreError> {
        let referenced = query
            .lookups
            .iter()
            .map(|l| l.field.as_str())
            .chain(query.order_by.iter().map(|o| o.field.as_str()));

        for field in referenced {
            if model.field(field).is_none() {
                return Err(StoreError::unknown_field(model.label(), field));
            }
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get(
        &self,
        model: &ModelDescriptor,
        pk: &Value,
    ) -> Result<Option<Record>, StoreError> {
        self.ensure_registered(model)?;
        let key = make_storage_key(&model.label(), pk);
        Ok(self.data.pin().get(&key).cloned())
    }

    async fn query(
        &self,
        model: &ModelDescriptor,
        query: &RecordQuery,
    ) -> Result<QueryResult, StoreError> {
        self.ensure_registered(model)?;
        Self::check_fields(model, query)?;

        let prefix = format!("{}/", model.label());
        let mut matched: Vec<Record> = {
            let guard = self.data.pin();
            guard
                .iter()
                .filter(|(key, _)| key.starts_with(&prefix))
                .map(|(_, record)| record)
                .filter(|record| query.lookups.iter().all(|l| matches_lookup(record, l)))
                .cloned()
                .collect()
        };

        matched.sort_by(|a, b| compare_records(a, b, &query.order_by, &model.primary_key));

        let total = matched.len();
        let records: Vec<Record> = matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        trace!(
            model = %model.label(),
            total,
            returned = records.len(),
            "In-memory query executed"
        );

        Ok(QueryResult::new(records, total))
    }
}
