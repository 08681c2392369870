//! Fixture loading.
//!
//! Fixtures use the `dumpdata` layout:
//!
//! ```json
//! [
//!   {"model": "api.widget", "pk": 1, "fields": {"name": "sprocket"}}
//! ]
//! ```

use std::path::Path;

use modelgraph_core::{ModelDescriptor, Record, StoreError};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::storage::InMemoryStore;

/// One serialized record.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureEntry {
    /// `app.model` label, matched case-insensitively.
    pub model: String,
    /// Primary key value.
    pub pk: Value,
    /// Remaining field values.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl InMemoryStore {
    /// Loads fixtures from a JSON document, registering `models` first.
    ///
    /// Returns the number of records loaded. Loading stops at the first
    /// entry that names a model outside `models`.
    pub fn load_fixtures(&self, models: &[ModelDescriptor], json: &str) -> Result<usize, StoreError> {
        let entries: Vec<FixtureEntry> =
            serde_json::from_str(json).map_err(|e| StoreError::fixture(e.to_string()))?;

        for model in models {
            self.register_model(model);
        }

        for entry in &entries {
            let model = models
                .iter()
                .find(|m| m.label().eq_ignore_ascii_case(&entry.model))
                .ok_or_else(|| {
                    StoreError::fixture(format!("unknown model '{}' in fixture", entry.model))
                })?;

            let mut record = Record::new(entry.fields.clone());
            record.insert(model.primary_key.clone(), entry.pk.clone());
            self.insert(model, record)?;
        }

        info!(count = entries.len(), "Fixtures loaded");
        Ok(entries.len())
    }

    /// Reads and loads a fixture file.
    pub fn load_fixtures_path(
        &self,
        models: &[ModelDescriptor],
        path: impl AsRef<Path>,
    ) -> Result<usize, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            StoreError::fixture(format!("failed to read {}: {e}", path.display()))
        })?;
        self.load_fixtures(models, &json)
    }
}

#[cfg(test)]
mod tests {
    use modelgraph_core::{FieldType, RecordQuery, RecordStore};
    use serde_json::json;

    use super::*;

    fn models() -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("api", "Widget")
                .with_field("id", FieldType::Auto)
                .with_field("name", FieldType::Text),
            ModelDescriptor::new("api", "Owner")
                .with_primary_key("code")
                .with_field("code", FieldType::Text),
        ]
    }

    #[tokio::test]
    async fn test_load_fixtures() {
        let store = InMemoryStore::new();
        let loaded = store
            .load_fixtures(
                &models(),
                r#"[
                    {"model": "api.widget", "pk": 1, "fields": {"name": "sprocket"}},
                    {"model": "api.Widget", "pk": 2, "fields": {"name": "cog"}},
                    {"model": "api.owner", "pk": "acme"}
                ]"#,
            )
            .unwrap();
        assert_eq!(loaded, 3);

        let widget = &models()[0];
        let record = store.get(widget, &json!(1)).await.unwrap().unwrap();
        assert_eq!(record.get("name"), Some(&json!("sprocket")));
        assert_eq!(record.get("id"), Some(&json!(1)));

        let owners = store.query(&models()[1], &RecordQuery::new()).await.unwrap();
        assert_eq!(owners.total, 1);
        assert_eq!(owners.records[0].get("code"), Some(&json!("acme")));
    }

    #[test]
    fn test_unknown_fixture_model() {
        let store = InMemoryStore::new();
        let err = store
            .load_fixtures(&models(), r#"[{"model": "auth.user", "pk": 1}]"#)
            .unwrap_err();
        assert!(matches!(err, StoreError::Fixture { .. }));
    }

    #[test]
    fn test_malformed_fixture() {
        let store = InMemoryStore::new();
        assert!(store.load_fixtures(&models(), "{not json").is_err());
    }
}
