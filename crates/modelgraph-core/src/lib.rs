//! # modelgraph-core
//!
//! Model metadata and collaborator abstractions for the modelgraph workspace.
//!
//! This crate defines the types that describe the data models exposed over
//! GraphQL, together with the two collaborator traits the schema layer is
//! built against. It does not contain any storage implementation - those
//! are provided by separate crates.
//!
//! ## Overview
//!
//! - [`ModelDescriptor`] / [`FieldDescriptor`] / [`FieldType`] describe a
//!   record type and its fields.
//! - [`ModelRegistry`] enumerates the models registered under an application
//!   namespace. [`StaticRegistry`] is a manifest-backed implementation.
//! - [`RecordStore`] fetches and filters records. The schema layer never
//!   assumes a concrete backend.
//!
//! ## Example
//!
//! ```ignore
//! use modelgraph_core::{FieldType, ModelDescriptor, ModelRegistry, StaticRegistry};
//!
//! let widget = ModelDescriptor::new("api", "Widget")
//!     .with_field("id", FieldType::Auto)
//!     .with_field("name", FieldType::Text);
//!
//! let registry = StaticRegistry::new(vec![widget]);
//! let models = registry.list_models("api")?;
//! assert_eq!(models.len(), 1);
//! ```

mod error;
mod model;
mod registry;
mod store;
mod types;

pub use error::{ModelError, RegistryError, StoreError};
pub use model::{DEFAULT_PRIMARY_KEY, FieldDescriptor, FieldType, ModelDescriptor, is_graphql_name};
pub use registry::{ModelRegistry, StaticRegistry};
pub use store::RecordStore;
pub use types::{Lookup, LookupOp, OrderBy, QueryResult, Record, RecordQuery};

/// Type alias for a store result.
pub type StoreResult<T> = Result<T, StoreError>;

/// Type alias for a shared record store trait object.
pub type DynStore = std::sync::Arc<dyn RecordStore>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use modelgraph_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        DynStore, FieldDescriptor, FieldType, Lookup, LookupOp, ModelDescriptor, ModelRegistry,
        OrderBy, QueryResult, Record, RecordQuery, RecordStore, StaticRegistry, StoreError,
        StoreResult,
    };
}
