//! In-memory document store for single-process operation.
//!
//! Fast, lock-based backend used by tests and by `database_url = "memory"`.
//! State is not persisted across restarts.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::backend::{
    compare_values, validate_updates, DocumentStore, FieldUpdate, Fields, Filter, OrderBy, Query,
    StoreError, StoreResult, WriteOp, MAX_BATCH_SIZE,
};
use super::Document;

type Collection = BTreeMap<String, Fields>;

/// In-memory document store. Clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document with a chosen id, replacing any existing one.
    pub async fn insert_with_id(&self, collection: &str, id: &str, fields: Fields) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    fn apply_updates(fields: &mut Fields, updates: Vec<(String, FieldUpdate)>) {
        for (field, update) in updates {
            match update {
                FieldUpdate::Set(value) => {
                    fields.insert(field, value);
                }
                FieldUpdate::Increment(by) => {
                    let current = fields.get(&field).and_then(Value::as_i64).unwrap_or(0);
                    fields.insert(field, Value::from(current + by));
                }
            }
        }
    }

    fn sort_key<'a>(order: &OrderBy, id: &'a str, fields: &'a Fields) -> (Option<&'a Value>, &'a str) {
        match order {
            OrderBy::DocumentId => (None, id),
            OrderBy::Field(name) => (fields.get(name), id),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        query.validate()?;
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<(&String, &Fields)> = docs
            .iter()
            .filter(|(_, fields)| query.filters.iter().all(|f| f.matches(fields)))
            .collect();

        if let OrderBy::Field(_) = query.order_by {
            matched.sort_by(|(a_id, a), (b_id, b)| {
                let (a_val, a_id) = Self::sort_key(&query.order_by, a_id, a);
                let (b_val, b_id) = Self::sort_key(&query.order_by, b_id, b);
                compare_values(a_val, b_val).then_with(|| a_id.cmp(b_id))
            });
        }

        let start = match &query.start_after {
            Some(cursor) => {
                let cursor_key = Self::sort_key(&query.order_by, &cursor.id, &cursor.fields);
                matched
                    .iter()
                    .position(|(id, fields)| {
                        let key = Self::sort_key(&query.order_by, id, fields);
                        compare_values(key.0, cursor_key.0)
                            .then_with(|| key.1.cmp(cursor_key.1))
                            .is_gt()
                    })
                    .unwrap_or(matched.len())
            }
            None => 0,
        };

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .skip(start)
            .skip(query.offset)
            .take(limit)
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .collect())
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.insert_with_id(collection, &id, fields).await;
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: Vec<(String, FieldUpdate)>,
    ) -> StoreResult<()> {
        validate_updates(&updates)?;
        let mut collections = self.collections.write().await;
        let fields = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Self::apply_updates(fields, updates);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn commit_batch(&self, collection: &str, ops: Vec<WriteOp>) -> StoreResult<()> {
        if ops.len() > MAX_BATCH_SIZE {
            return Err(StoreError::BatchTooLarge(ops.len()));
        }
        for op in &ops {
            if let WriteOp::Update { updates, .. } = op {
                validate_updates(updates)?;
            }
        }

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        // Stage on a copy so a missing document leaves the collection untouched.
        let mut staged = docs.clone();
        for op in ops {
            match op {
                WriteOp::Update { id, updates } => {
                    let fields = staged
                        .get_mut(&id)
                        .ok_or_else(|| StoreError::NotFound(id.clone()))?;
                    Self::apply_updates(fields, updates);
                }
                WriteOp::Delete { id } => {
                    staged.remove(&id);
                }
            }
        }
        *docs = staged;
        Ok(())
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> StoreResult<u64> {
        for filter in filters {
            super::validate_field_name(&filter.field)?;
        }
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|fields| filters.iter().all(|f| f.matches(fields)))
                    .count() as u64
            })
            .unwrap_or(0))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
