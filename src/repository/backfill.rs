//! Backfill of fields missing from legacy word documents.
//!
//! The pass is idempotent: only absent fields are written, so a second run
//! stages nothing. Updates are committed in atomic batches of at most
//! [`MAX_BATCH_SIZE`]; a failed commit stops the pass but leaves earlier
//! batches applied, and re-running picks up where it stopped.

use serde_json::{json, Value};
use tracing::{debug, info};

use super::{Result, WordRepository};
use crate::models::{Difficulty, Language, MigrationReport, DEFAULT_TAG};
use crate::store::{Document, FieldUpdate, Query, WriteOp, MAX_BATCH_SIZE};
use crate::utils::{guess_category, image_url_for};

/// Collects staged writes and hands them back once a batch is full.
#[derive(Debug)]
pub struct BatchAccumulator {
    capacity: usize,
    pending: Vec<WriteOp>,
}

impl Default for BatchAccumulator {
    fn default() -> Self {
        Self::new(MAX_BATCH_SIZE)
    }
}

impl BatchAccumulator {
    /// Capacity is clamped to `1..=MAX_BATCH_SIZE`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_BATCH_SIZE);
        Self {
            capacity,
            pending: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Stage a write. Returns the batch to commit when this write filled it.
    pub fn stage(&mut self, op: WriteOp) -> Option<Vec<WriteOp>> {
        self.pending.push(op);
        if self.pending.len() >= self.capacity {
            Some(self.take())
        } else {
            None
        }
    }

    /// Drain whatever is left after the scan.
    pub fn finish(mut self) -> Option<Vec<WriteOp>> {
        (!self.pending.is_empty()).then(|| self.take())
    }

    fn take(&mut self) -> Vec<WriteOp> {
        std::mem::replace(&mut self.pending, Vec::with_capacity(self.capacity))
    }
}

/// Default values for every backfilled field the document lacks.
///
/// Presence is what counts: a field stored as `null` or `""` is left alone.
pub fn missing_fields(doc: &Document) -> Vec<(String, FieldUpdate)> {
    let word = doc.get("word").and_then(Value::as_str).unwrap_or_default();

    let defaults: [(&str, fn(&str) -> Value); 9] = [
        ("difficulty", |_| json!(Difficulty::default().as_str())),
        ("category", |w| json!(guess_category(w).as_str())),
        ("incorrectCount", |_| json!(0)),
        ("studyCount", |_| json!(0)),
        ("isFavorite", |_| json!(false)),
        ("tags", |_| json!([DEFAULT_TAG])),
        ("example", |_| json!("")),
        ("pronunciation", |_| json!("")),
        ("imageUrl", |w| json!(image_url_for(w))),
    ];

    defaults
        .iter()
        .filter(|(field, _)| !doc.contains(field))
        .map(|(field, default)| (field.to_string(), default(word)))
        // An empty word has no image to derive.
        .filter(|(field, value)| !(field == "imageUrl" && value.as_str() == Some("")))
        .map(|(field, value)| (field, FieldUpdate::Set(value)))
        .collect()
}

impl WordRepository {
    /// Fill missing fields across one collection.
    pub async fn migrate(&self, lang: Language) -> Result<MigrationReport> {
        let store = self.store()?;
        let collection = lang.collection();
        let page_size = self.limits.migration_page.max(1);
        let scan_cap = self.limits.migration_scan_cap;

        let mut report = MigrationReport {
            collection: collection.to_string(),
            ..Default::default()
        };
        let mut batch = BatchAccumulator::default();
        let mut cursor: Option<Document> = None;

        loop {
            let remaining = scan_cap.map(|cap| cap.saturating_sub(report.scanned));
            let limit = remaining.map_or(page_size, |r| r.min(page_size));
            if limit == 0 {
                break;
            }

            let mut query = Query::new().limit(limit);
            if let Some(after) = cursor.take() {
                query = query.start_after(after);
            }
            let docs = store.query(collection, &query).await?;
            let page_len = docs.len();

            for doc in &docs {
                report.scanned += 1;
                let updates = missing_fields(doc);
                if updates.is_empty() {
                    continue;
                }
                report.updated += 1;
                if let Some(full) = batch.stage(WriteOp::update(doc.id.clone(), updates)) {
                    store.commit_batch(collection, full).await?;
                    report.batches += 1;
                    debug!(collection, batches = report.batches, "Committed backfill batch");
                }
            }

            if page_len < limit {
                break;
            }
            cursor = docs.into_iter().last();
        }

        if let Some(rest) = batch.finish() {
            store.commit_batch(collection, rest).await?;
            report.batches += 1;
        }

        if report.scanned == 0 {
            info!(collection, "No documents found for migration");
        } else {
            info!(
                collection,
                scanned = report.scanned,
                updated = report.updated,
                batches = report.batches,
                "Migration completed"
            );
        }
        Ok(report)
    }
}
