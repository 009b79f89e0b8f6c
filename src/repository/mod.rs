//! Vocabulary repository.
//!
//! Turns the word access patterns (listings, filtered views, pagination,
//! quizzes, statistics, backfill) into bounded document-store operations.
//!
//! Split into submodules:
//! - `mod.rs` (this file): Main struct, errors, limits
//! - `queries.rs`: Read paths
//! - `mutations.rs`: Create/update/delete/progress/favorite
//! - `stats.rs`: Exact and sampled statistics
//! - `backfill.rs`: Batched legacy-field migration

mod backfill;
mod mutations;
mod queries;
mod stats;

pub use backfill::{missing_fields, BatchAccumulator};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::Word;
use crate::store::{Document, DocumentStore, StoreError};

/// Errors surfaced by repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Store unavailable")]
    Unavailable,
    #[error("Word not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::InvalidQuery(msg) => Self::InvalidInput(msg),
            other => Self::Store(other),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(StoreError::Serialization(err))
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Result-size caps and pool sizes for every bounded read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLimits {
    pub all_words: usize,
    /// Documents fetched before the in-memory unknown-word filter runs.
    pub unknown_candidates: usize,
    pub unknown_words: usize,
    /// Words with fewer correct answers than this count as unknown.
    pub unknown_max_correct: u32,
    pub new_words: usize,
    pub favorites: usize,
    pub max_page_size: usize,
    pub default_page_size: usize,
    pub quiz_pool: usize,
    pub default_quiz_count: usize,
    pub stats_sample: usize,
    /// Documents read per backfill scan page.
    pub migration_page: usize,
    /// Stop the backfill scan after this many documents. `None` scans everything.
    pub migration_scan_cap: Option<usize>,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            all_words: 100,
            unknown_candidates: 200,
            unknown_words: 50,
            unknown_max_correct: 3,
            new_words: 20,
            favorites: 100,
            max_page_size: 50,
            default_page_size: 20,
            quiz_pool: 100,
            default_quiz_count: 10,
            stats_sample: 100,
            migration_page: 500,
            migration_scan_cap: None,
        }
    }
}

impl QueryLimits {
    /// Resolve a requested page size against the default and the ceiling.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

/// Repository over the per-language word collections.
///
/// Holds only a handle to the injected store, so clones are cheap and every
/// request runs independently.
#[derive(Clone)]
pub struct WordRepository {
    store: Option<Arc<dyn DocumentStore>>,
    limits: QueryLimits,
}

impl WordRepository {
    pub fn new(store: Arc<dyn DocumentStore>, limits: QueryLimits) -> Self {
        Self {
            store: Some(store),
            limits,
        }
    }

    /// A repository with no backing store. Every operation fails with
    /// [`RepositoryError::Unavailable`].
    pub fn unavailable(limits: QueryLimits) -> Self {
        Self {
            store: None,
            limits,
        }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    /// Check the store is configured and reachable.
    pub async fn ping(&self) -> Result<()> {
        self.store()?.ping().await?;
        Ok(())
    }

    fn store(&self) -> Result<&Arc<dyn DocumentStore>> {
        self.store.as_ref().ok_or(RepositoryError::Unavailable)
    }
}

/// Decode documents for a response, filling presentation defaults.
fn decode_words(docs: Vec<Document>) -> Vec<Word> {
    docs.into_iter()
        .map(|doc| Word::from_document(doc).with_image_fallback())
        .collect()
}
