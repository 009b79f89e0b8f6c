//! Pluggable backend trait for document storage.
//!
//! The vocabulary repository only ever talks to a [`DocumentStore`], so the
//! SQLite backend and the in-memory backend are interchangeable.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::Value;

use super::Document;

/// Maximum number of writes a single batch may carry.
pub const MAX_BATCH_SIZE: usize = 500;

/// Field map of a stored document.
pub type Fields = serde_json::Map<String, Value>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Batch of {0} writes exceeds the batch size limit")]
    BatchTooLarge(usize),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Equality predicate on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

/// Sort key for query results. Ascending; ties break on document id.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OrderBy {
    #[default]
    DocumentId,
    Field(String),
}

/// A bounded query against one collection.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: OrderBy,
    /// Resume strictly after this document in `order_by` order.
    pub start_after: Option<Document>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = order;
        self
    }

    pub fn start_after(mut self, cursor: Document) -> Self {
        self.start_after = Some(cursor);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check every field name the query references.
    pub fn validate(&self) -> StoreResult<()> {
        for filter in &self.filters {
            validate_field_name(&filter.field)?;
        }
        if let OrderBy::Field(field) = &self.order_by {
            validate_field_name(field)?;
        }
        Ok(())
    }
}

/// A single field change within an update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Overwrite the field.
    Set(Value),
    /// Add to the field atomically, treating an absent field as zero.
    Increment(i64),
}

/// A write staged in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Update {
        id: String,
        updates: Vec<(String, FieldUpdate)>,
    },
    Delete {
        id: String,
    },
}

impl WriteOp {
    pub fn update(id: impl Into<String>, updates: Vec<(String, FieldUpdate)>) -> Self {
        Self::Update {
            id: id.into(),
            updates,
        }
    }
}

/// Trait for document store backends.
///
/// Implementations must be thread-safe and handle concurrent access.
/// `update` applies all of its field changes atomically, including
/// increments, and `commit_batch` is all-or-nothing.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Run a filtered, ordered, bounded query.
    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>>;

    /// Insert a new document and return its store-assigned id.
    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Apply field changes to an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] when the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: Vec<(String, FieldUpdate)>,
    ) -> StoreResult<()>;

    /// Remove a document. Returns whether it existed.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Apply up to [`MAX_BATCH_SIZE`] writes as one atomic unit.
    async fn commit_batch(&self, collection: &str, ops: Vec<WriteOp>) -> StoreResult<()>;

    /// Count documents matching the filters.
    async fn count(&self, collection: &str, filters: &[Filter]) -> StoreResult<u64>;

    /// Check the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;
}

/// Field names are restricted to identifiers so they can be embedded in
/// backend query paths.
pub fn validate_field_name(field: &str) -> StoreResult<()> {
    if !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(StoreError::InvalidQuery(format!(
            "invalid field name '{}'",
            field
        )))
    }
}

pub fn validate_updates(updates: &[(String, FieldUpdate)]) -> StoreResult<()> {
    for (field, _) in updates {
        validate_field_name(field)?;
    }
    Ok(())
}

/// Total order over JSON values used for field ordering:
/// absent < null < bool < number < string < anything else.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
