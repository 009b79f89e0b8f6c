//! Document store layer.
//!
//! A small document API (get, query, add, update, delete, batched writes,
//! count) with pluggable backends:
//! - In-memory (tests and ephemeral runs)
//! - SQLite via Diesel (persistent, one JSON body per row)

mod backend;
mod memory;
pub mod pool;
mod sqlite;
#[cfg(test)]
pub(crate) mod testing;
pub mod util;

pub use backend::{
    compare_values, validate_field_name, DocumentStore, FieldUpdate, Fields, Filter, OrderBy,
    Query, StoreError, StoreResult, WriteOp, MAX_BATCH_SIZE,
};
pub use memory::InMemoryDocumentStore;
pub use pool::SqlitePool;
pub use sqlite::SqliteDocumentStore;

use chrono::Utc;
use serde_json::Value;

/// A stored document: its id plus its top-level fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

/// Current time in the format stored in documents.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}
