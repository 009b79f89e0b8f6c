//! Fault-injecting store wrapper for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{
    Document, DocumentStore, FieldUpdate, Fields, Filter, InMemoryDocumentStore, Query,
    StoreError, StoreResult, WriteOp,
};

/// Wraps an in-memory store and fails on demand.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: InMemoryDocumentStore,
    fail_all: Arc<AtomicBool>,
    fail_count: Arc<AtomicBool>,
    /// Batch commits allowed before commits start failing.
    commits_before_failure: Arc<AtomicUsize>,
    fail_commits: Arc<AtomicBool>,
    commits: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new(inner: InMemoryDocumentStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    pub fn fail_everything(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn fail_counts(&self, fail: bool) {
        self.fail_count.store(fail, Ordering::SeqCst);
    }

    pub fn fail_commits_after(&self, n: usize) {
        self.commits_before_failure.store(n, Ordering::SeqCst);
        self.fail_commits.store(true, Ordering::SeqCst);
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    fn check(&self) -> StoreResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.check()?;
        self.inner.get(collection, id).await
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        self.check()?;
        self.inner.query(collection, query).await
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        self.check()?;
        self.inner.add(collection, fields).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: Vec<(String, FieldUpdate)>,
    ) -> StoreResult<()> {
        self.check()?;
        self.inner.update(collection, id, updates).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        self.check()?;
        self.inner.delete(collection, id).await
    }

    async fn commit_batch(&self, collection: &str, ops: Vec<WriteOp>) -> StoreResult<()> {
        self.check()?;
        if self.fail_commits.load(Ordering::SeqCst)
            && self.commits.load(Ordering::SeqCst)
                >= self.commits_before_failure.load(Ordering::SeqCst)
        {
            return Err(StoreError::Unavailable("injected commit failure".into()));
        }
        self.inner.commit_batch(collection, ops).await?;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> StoreResult<u64> {
        self.check()?;
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected count failure".into()));
        }
        self.inner.count(collection, filters).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }
}
