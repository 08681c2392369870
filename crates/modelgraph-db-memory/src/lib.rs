//! In-memory record store backend for modelgraph.
//!
//! This crate provides an in-memory implementation of the `RecordStore` trait
//! from `modelgraph-core`, using papaya lock-free HashMap for concurrent access.
//!
//! # Example
//!
//! ```ignore
//! use modelgraph_db_memory::InMemoryStore;
//! use modelgraph_core::{Record, RecordQuery, RecordStore};
//!
//! let store = InMemoryStore::with_models(&models);
//! store.insert(&widget, Record::default().with("id", 1).with("name", "sprocket"))?;
//!
//! let result = store.query(&widget, &RecordQuery::new().with_exact("name", "sprocket")).await?;
//! assert_eq!(result.total, 1);
//! ```

mod fixtures;
pub mod query;
mod storage;

pub use fixtures::FixtureEntry;
pub use modelgraph_core::{RecordStore, StoreError};
pub use storage::{InMemoryStore, StorageKey};
