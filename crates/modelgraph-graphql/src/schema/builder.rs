//! Model GraphQL schema builder.
//!
//! This module provides `ModelSchemaBuilder`, which generates a GraphQL
//! schema from the models a registry lists under one namespace. Generation
//! happens in two steps: the models are planned into a
//! [`RootQueryDescriptor`], then the descriptor is assembled into an
//! executable schema with async-graphql's dynamic schema API.

use std::sync::Arc;

use async_graphql::dynamic::{Object, Schema};
use modelgraph_core::ModelRegistry;
use tracing::{debug, info};

use super::descriptor::{QUERY_TYPE, QueryEntry, RootQueryDescriptor, build_descriptors};
use super::types::{
    ModelIndex, connection_field, connection_types, debug_field, node_field, object_type,
    register_shared_types,
};
use crate::error::SchemaError;

/// Configuration for the schema builder.
#[derive(Debug, Clone)]
pub struct SchemaBuilderConfig {
    /// Application namespace whose models are exposed.
    pub namespace: String,

    /// Maximum query depth allowed.
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,

    /// Page size limit of connection fields.
    pub max_limit: usize,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            namespace: "api".to_string(),
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
            max_limit: 100,
        }
    }
}

/// Builds the GraphQL schema from registered models.
///
/// The generated schema contains, for every model `M` of the namespace:
/// - an object type `M` implementing `Node`
/// - `MConnection` / `MEdge` pagination types
/// - `Query.M(id: ID!)` and `Query.all_M(...)`
///
/// plus `Query._debug`.
///
/// # Example
///
/// ```ignore
/// let builder = ModelSchemaBuilder::new(registry, SchemaBuilderConfig::default());
/// let schema = builder.build()?;
/// ```
pub struct ModelSchemaBuilder {
    /// Model registry.
    registry: Arc<dyn ModelRegistry>,

    /// Configuration options.
    config: SchemaBuilderConfig,
}

impl ModelSchemaBuilder {
    /// Creates a new schema builder.
    #[must_use]
    pub fn new(registry: Arc<dyn ModelRegistry>, config: SchemaBuilderConfig) -> Self {
        Self { registry, config }
    }

    /// Returns the builder configuration.
    #[must_use]
    pub fn config(&self) -> &SchemaBuilderConfig {
        &self.config
    }

    /// Plans the schema without building it.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry fails or a model cannot be exposed.
    pub fn describe(&self) -> Result<RootQueryDescriptor, SchemaError> {
        let models = self.registry.list_models(&self.config.namespace)?;
        debug!(
            namespace = %self.config.namespace,
            model_count = models.len(),
            "Planning GraphQL schema"
        );
        build_descriptors(&models)
    }

    /// Builds the GraphQL schema.
    ///
    /// # Errors
    ///
    /// Returns an error if planning fails or async-graphql rejects the
    /// assembled schema. No partial schema is produced.
    pub fn build(&self) -> Result<Schema, SchemaError> {
        let descriptor = self.describe()?;
        self.assemble(&descriptor)
    }

    /// Assembles an executable schema from a descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor references an unknown object type
    /// or async-graphql rejects the schema.
    pub fn assemble(&self, descriptor: &RootQueryDescriptor) -> Result<Schema, SchemaError> {
        let models: ModelIndex = descriptor
            .objects
            .values()
            .map(|object| (object.name.clone(), Arc::new(object.model.clone())))
            .collect();
        let model_for = |type_name: &str| {
            models.get(type_name).cloned().ok_or_else(|| {
                SchemaError::Build(format!("query entry references unknown type '{type_name}'"))
            })
        };

        let mut schema_builder = Schema::build(QUERY_TYPE, None, None);
        schema_builder = register_shared_types(schema_builder, !descriptor.objects.is_empty());

        for object in descriptor.objects.values() {
            let (connection, edge) = connection_types(object);
            schema_builder = schema_builder
                .register(object_type(object, &models))
                .register(edge)
                .register(connection);
        }

        let mut query = Object::new(QUERY_TYPE).description("Query root");
        for entry in descriptor.entries.values() {
            let field = match entry {
                QueryEntry::Node(node) => node_field(node, model_for(&node.type_name)?),
                QueryEntry::Connection(connection) => connection_field(
                    connection,
                    model_for(&connection.type_name)?,
                    self.config.max_limit,
                ),
                QueryEntry::Debug(debug) => debug_field(debug),
            };
            query = query.field(field);
        }
        schema_builder = schema_builder.register(query);

        schema_builder = schema_builder
            .limit_depth(self.config.max_depth)
            .limit_complexity(self.config.max_complexity);

        if !self.config.introspection_enabled {
            schema_builder = schema_builder.disable_introspection();
        }

        let schema = schema_builder.finish()?;

        info!(
            namespace = %self.config.namespace,
            models = descriptor.objects.len(),
            query_fields = descriptor.len(),
            "GraphQL schema built"
        );
        Ok(schema)
    }
}

/// Builds the schema for the models of `config.namespace`.
///
/// # Errors
///
/// See [`ModelSchemaBuilder::build`].
pub fn build_schema(
    registry: Arc<dyn ModelRegistry>,
    config: SchemaBuilderConfig,
) -> Result<Schema, SchemaError> {
    ModelSchemaBuilder::new(registry, config).build()
}

#[cfg(test)]
mod tests {
    use modelgraph_core::{FieldType, ModelDescriptor, StaticRegistry};

    use super::*;

    fn registry() -> Arc<dyn ModelRegistry> {
        Arc::new(StaticRegistry::new(vec![
            ModelDescriptor::new("api", "Widget")
                .with_field("id", FieldType::Auto)
                .with_field("name", FieldType::Text),
        ]))
    }

    #[test]
    fn test_default_config() {
        let config = SchemaBuilderConfig::default();
        assert_eq!(config.namespace, "api");
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection_enabled);
        assert_eq!(config.max_limit, 100);
    }

    #[test]
    fn test_schema_builder_creates_valid_schema() {
        let schema = ModelSchemaBuilder::new(registry(), SchemaBuilderConfig::default())
            .build()
            .expect("schema should build");

        let sdl = schema.sdl();
        assert!(sdl.contains("type Query"));
        assert!(sdl.contains("type Widget implements Node"));
        assert!(sdl.contains("type WidgetConnection"));
        assert!(sdl.contains("type WidgetEdge"));
        assert!(sdl.contains("type PageInfo"));
        assert!(sdl.contains("scalar JSONString"));
        assert!(sdl.contains("all_Widget("));
        assert!(sdl.contains("_debug"));
    }

    #[test]
    fn test_unknown_namespace_is_fatal() {
        let config = SchemaBuilderConfig {
            namespace: "billing".into(),
            ..Default::default()
        };
        let err = build_schema(registry(), config).err().unwrap();
        assert!(matches!(err, SchemaError::Registry(_)));
    }

    #[test]
    fn test_schema_with_disabled_introspection() {
        let config = SchemaBuilderConfig {
            introspection_enabled: false,
            ..Default::default()
        };
        assert!(build_schema(registry(), config).is_ok());
    }
}
