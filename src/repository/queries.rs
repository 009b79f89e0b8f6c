//! Read paths for the word repository.

use rand::seq::SliceRandom;
use tracing::debug;

use super::{decode_words, RepositoryError, Result, WordRepository};
use crate::models::{Language, Word, WordPage};
use crate::store::{Filter, OrderBy, Query};

impl WordRepository {
    /// Fetch a single word by id.
    pub async fn get_word(&self, lang: Language, id: &str) -> Result<Word> {
        let store = self.store()?;
        let doc = store
            .get(lang.collection(), id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        Ok(Word::from_document(doc).with_image_fallback())
    }

    /// Up to `all_words` records in id order.
    pub async fn get_all(&self, lang: Language) -> Result<Vec<Word>> {
        let store = self.store()?;
        let docs = store
            .query(lang.collection(), &Query::new().limit(self.limits.all_words))
            .await?;
        Ok(decode_words(docs))
    }

    /// Words with fewer than `unknown_max_correct` correct answers.
    ///
    /// The store can only filter on equality, so a bounded candidate pool is
    /// fetched first and filtered here. Words outside the pool are never
    /// considered, even if they qualify.
    pub async fn get_unknown(&self, lang: Language) -> Result<Vec<Word>> {
        let store = self.store()?;
        let candidates = store
            .query(
                lang.collection(),
                &Query::new().limit(self.limits.unknown_candidates),
            )
            .await?;
        let fetched = candidates.len();

        let words: Vec<Word> = decode_words(candidates)
            .into_iter()
            .filter(|w| w.correct_count < self.limits.unknown_max_correct)
            .take(self.limits.unknown_words)
            .collect();

        debug!(language = %lang, fetched, matched = words.len(), "unknown words");
        Ok(words)
    }

    /// Words never studied.
    ///
    /// Uses a native equality filter, so legacy documents without a
    /// `studyCount` field only show up once they have been backfilled.
    pub async fn get_new(&self, lang: Language) -> Result<Vec<Word>> {
        let store = self.store()?;
        let query = Query::new()
            .filter(Filter::eq("studyCount", 0))
            .limit(self.limits.new_words);
        Ok(decode_words(store.query(lang.collection(), &query).await?))
    }

    pub async fn get_favorites(&self, lang: Language) -> Result<Vec<Word>> {
        let store = self.store()?;
        let query = Query::new()
            .filter(Filter::eq("isFavorite", true))
            .limit(self.limits.favorites);
        Ok(decode_words(store.query(lang.collection(), &query).await?))
    }

    /// Cursor pagination in id order.
    ///
    /// A cursor that is empty or no longer resolves restarts from the
    /// beginning instead of failing.
    pub async fn get_paginated(
        &self,
        lang: Language,
        last_word_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<WordPage> {
        let store = self.store()?;
        let limit = self.limits.page_size(limit);
        let collection = lang.collection();

        let mut query = Query::new().order_by(OrderBy::DocumentId).limit(limit);
        if let Some(cursor_id) = last_word_id.filter(|id| !id.is_empty()) {
            match store.get(collection, cursor_id).await? {
                Some(cursor) => query = query.start_after(cursor),
                None => debug!(cursor = cursor_id, "Cursor not found, starting from beginning"),
            }
        }

        let docs = store.query(collection, &query).await?;
        let has_more = docs.len() == limit;
        let last_word_id = docs.last().map(|d| d.id.clone());

        Ok(WordPage {
            words: decode_words(docs),
            has_more,
            last_word_id,
        })
    }

    /// Offset pagination ordered by the word text.
    pub async fn get_lazy(
        &self,
        lang: Language,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Word>> {
        let store = self.store()?;
        let query = Query::new()
            .order_by(OrderBy::Field("word".to_string()))
            .offset(offset)
            .limit(self.limits.page_size(limit));
        Ok(decode_words(store.query(lang.collection(), &query).await?))
    }

    /// A shuffled subset of a freshly fetched candidate pool.
    pub async fn get_quiz(&self, lang: Language, count: Option<usize>) -> Result<Vec<Word>> {
        let store = self.store()?;
        let count = count.unwrap_or(self.limits.default_quiz_count);
        let docs = store
            .query(lang.collection(), &Query::new().limit(self.limits.quiz_pool))
            .await?;

        let mut words = decode_words(docs);
        words.shuffle(&mut rand::thread_rng());
        words.truncate(count);
        Ok(words)
    }
}
