//! Aggregate and maintenance report models.

use serde::Serialize;

/// Learned/learning/unknown/favorite counts for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordStatistics {
    pub total: u64,
    pub learned: u64,
    pub learning: u64,
    pub unknown: u64,
    pub favorites: u64,
    /// Set when the counts were scaled up from a sample rather than counted.
    pub estimated: bool,
    /// Number of records the counts were computed over.
    pub sample_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WordStatistics {
    /// All-zero result carrying the failure message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome of one backfill pass over a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub collection: String,
    /// Documents examined.
    pub scanned: usize,
    /// Documents that received at least one backfilled field.
    pub updated: usize,
    /// Batch writes committed.
    pub batches: usize,
}
