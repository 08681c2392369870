//! GraphQL configuration.
//!
//! Configuration is read from the `[graphql]` section of `modelgraph.toml`.
//!
//! # Example Configuration
//!
//! ```toml
//! [graphql]
//! namespace = "api"
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! max_limit = 100
//! ```

use serde::{Deserialize, Serialize};

use crate::schema::SchemaBuilderConfig;

/// GraphQL API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Application namespace whose models are exposed.
    /// Default: "api"
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Upper bound on the page size of every connection field, and the page
    /// size used when a query gives neither `first` nor `last`.
    /// Default: 100
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_namespace() -> String {
    "api".to_string()
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_max_limit() -> usize {
    100
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            max_limit: default_max_limit(),
        }
    }
}

impl GraphQLConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.namespace.trim().is_empty() {
            return Err("graphql.namespace must not be empty".into());
        }
        if self.max_depth == 0 {
            return Err("graphql.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("graphql.max_complexity must be > 0".into());
        }
        if self.max_limit == 0 {
            return Err("graphql.max_limit must be > 0".into());
        }
        Ok(())
    }

    /// Converts this config to a SchemaBuilderConfig.
    #[must_use]
    pub fn to_schema_builder_config(&self) -> SchemaBuilderConfig {
        SchemaBuilderConfig {
            namespace: self.namespace.clone(),
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection_enabled: self.introspection,
            max_limit: self.max_limit,
        }
    }
}
