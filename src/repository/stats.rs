//! Learned/learning/unknown statistics.
//!
//! Small collections are counted exactly. Larger ones take the exact total
//! from the store's count aggregate and scale the bucket counts of a bounded
//! sample up to it. Each bucket is rounded on its own, so the scaled buckets
//! need not add up to the total.

use tracing::{debug, warn};

use super::{decode_words, Result, WordRepository};
use crate::models::{Classification, Language, Word, WordStatistics};
use crate::store::Query;

#[derive(Debug, Default, PartialEq, Eq)]
struct Tally {
    learned: u64,
    learning: u64,
    unknown: u64,
    favorites: u64,
}

impl Tally {
    fn of(words: &[Word]) -> Self {
        let mut tally = Self::default();
        for word in words {
            match word.classification() {
                Classification::Learned => tally.learned += 1,
                Classification::Learning => tally.learning += 1,
                Classification::Unknown => tally.unknown += 1,
            }
            if word.is_favorite {
                tally.favorites += 1;
            }
        }
        tally
    }

    fn scaled(self, total: u64, sample: u64) -> Self {
        let scale = |n: u64| ((n as f64) * (total as f64) / (sample as f64)).round() as u64;
        Self {
            learned: scale(self.learned),
            learning: scale(self.learning),
            unknown: scale(self.unknown),
            favorites: scale(self.favorites),
        }
    }
}

impl WordRepository {
    /// Statistics for one collection.
    ///
    /// Never fails: any error yields an all-zero result with `error` set.
    pub async fn statistics(&self, lang: Language) -> WordStatistics {
        match self.compute_statistics(lang).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(language = %lang, error = %e, "Statistics unavailable");
                WordStatistics::failed(e.to_string())
            }
        }
    }

    async fn compute_statistics(&self, lang: Language) -> Result<WordStatistics> {
        let store = self.store()?;
        let collection = lang.collection();
        let sample_limit = self.limits.stats_sample.max(1);

        let total = store.count(collection, &[]).await?;
        let docs = store
            .query(collection, &Query::new().limit(sample_limit))
            .await?;
        let words = decode_words(docs);
        let sample = words.len() as u64;
        let tally = Tally::of(&words);

        if total <= sample_limit as u64 || sample == 0 {
            debug!(language = %lang, total, "Exact statistics");
            return Ok(WordStatistics {
                total,
                learned: tally.learned,
                learning: tally.learning,
                unknown: tally.unknown,
                favorites: tally.favorites,
                estimated: false,
                sample_size: sample,
                error: None,
            });
        }

        debug!(language = %lang, total, sample, "Sampled statistics");
        let scaled = tally.scaled(total, sample);
        Ok(WordStatistics {
            total,
            learned: scaled.learned,
            learning: scaled.learning,
            unknown: scaled.unknown,
            favorites: scaled.favorites,
            estimated: true,
            sample_size: sample,
            error: None,
        })
    }
}
