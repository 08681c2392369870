//! # modelgraph-graphql
//!
//! Read-only GraphQL API generated from model metadata.
//!
//! Every model of the configured namespace becomes a Relay-style object
//! type with two root fields:
//!
//! - `Model(id: ID!)` - fetch one record by global ID
//! - `all_Model(...)` - paginated, filterable, orderable connection
//!
//! plus a single `_debug` field reporting the store calls made by the
//! current request.
//!
//! ## Endpoints
//!
//! - `POST /graphql` - GraphQL request in a JSON body
//! - `GET /graphql` - GraphQL request in URL query parameters
//!
//! ## Configuration
//!
//! Add to `modelgraph.toml`:
//!
//! ```toml
//! [graphql]
//! namespace = "api"
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! max_limit = 100
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`global_id`] - `Type:id` global identifiers
//! - [`filters`] - Filter argument derivation
//! - [`schema`] - Schema planning and building
//! - [`resolvers`] - Field resolvers
//! - [`context`] - GraphQL execution context
//! - [`handler`] - Axum HTTP handlers
//! - [`error`] - Error types for GraphQL operations

pub mod config;
pub mod context;
pub mod error;
pub mod filters;
pub mod global_id;
pub mod handler;
pub mod resolvers;
pub mod schema;

// Re-export main types
pub use async_graphql::dynamic::Schema;
pub use config::GraphQLConfig;
pub use context::{DebugQuery, GraphQLContext, GraphQLContextBuilder, QueryLog};
pub use error::{GraphQLError, SchemaError};
pub use filters::{FilterFields, FilterSet, LookupKind, generate_filter_fields};
pub use global_id::{GlobalId, GlobalIdError, from_global_id, to_global_id};
pub use handler::{GRAPHQL_PATH, GraphQLState, graphql_handler, graphql_handler_get, graphql_router};
pub use schema::{ModelSchemaBuilder, RootQueryDescriptor, SchemaBuilderConfig, build_schema};

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
