//! GraphQL schema generation.
//!
//! ## Components
//!
//! - [`descriptor`] - Backend-independent plan of types and root fields
//! - [`ModelSchemaBuilder`] - Builds the executable schema from a registry
//!
//! ## Architecture
//!
//! The schema is generated once at startup:
//! 1. The registry lists the models of the configured namespace
//! 2. Each model is planned into an object type descriptor and two root
//!    entries, followed by the debug entry
//! 3. The plan is assembled into an async-graphql dynamic schema
//! 4. Any failure aborts startup; the schema is immutable afterwards

pub mod descriptor;

mod builder;
mod types;

pub use builder::{ModelSchemaBuilder, SchemaBuilderConfig, build_schema};
pub use descriptor::{
    ConnectionField, DebugField, NodeField, ORDER_BY_ARGUMENT, ObjectTypeDescriptor, OutputField,
    OutputKind, QueryEntry, RootQueryDescriptor, ScalarKind, build_descriptors, create_object_type,
};
pub use types::output_type_ref;
