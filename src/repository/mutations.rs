//! Write paths for the word repository.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{RepositoryError, Result, WordRepository};
use crate::models::{Language, NewWord, Word};
use crate::store::{now_timestamp, FieldUpdate};
use crate::utils::image_url_for;

impl WordRepository {
    /// Create a word with fresh progress counters and derived defaults.
    pub async fn add(&self, lang: Language, input: NewWord) -> Result<Word> {
        let store = self.store()?;
        input.validate().map_err(RepositoryError::InvalidInput)?;

        let image_url = input
            .image_url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| image_url_for(&input.word));

        let mut word = Word {
            id: String::new(),
            category: input.resolved_category(),
            difficulty: input.difficulty.unwrap_or_default(),
            example: input.example.clone().unwrap_or_default(),
            pronunciation: input.pronunciation.clone().unwrap_or_default(),
            tags: input.resolved_tags(),
            correct_count: 0,
            incorrect_count: 0,
            study_count: 0,
            last_study_date: Some(Utc::now()),
            is_favorite: false,
            image_url: (!image_url.is_empty()).then_some(image_url),
            audio_url: input.audio_url.filter(|url| !url.is_empty()),
            word: input.word,
            translation: input.translation,
        };

        word.id = store.add(lang.collection(), word.to_fields()?).await?;
        info!(language = %lang, id = %word.id, word = %word.word, "Added word");
        Ok(word)
    }

    /// Replace the editable fields of a word.
    ///
    /// Progress counters and favorite state are left alone. The returned
    /// record is re-read from the store.
    pub async fn update(&self, lang: Language, id: &str, input: NewWord) -> Result<Word> {
        let store = self.store()?;
        input.validate().map_err(RepositoryError::InvalidInput)?;

        let updates = vec![
            set("word", json!(input.word)),
            set("translation", json!(input.translation)),
            set("category", json!(input.resolved_category().as_str())),
            set(
                "difficulty",
                json!(input.difficulty.unwrap_or_default().as_str()),
            ),
            set("example", json!(input.example.clone().unwrap_or_default())),
            set(
                "pronunciation",
                json!(input.pronunciation.clone().unwrap_or_default()),
            ),
            set("tags", json!(input.resolved_tags())),
        ];

        store.update(lang.collection(), id, updates).await?;
        debug!(language = %lang, id, "Updated word");
        self.get_word(lang, id).await
    }

    /// Remove a word. Deleting a missing id also succeeds.
    pub async fn delete(&self, lang: Language, id: &str) -> Result<()> {
        let store = self.store()?;
        let existed = store.delete(lang.collection(), id).await?;
        debug!(language = %lang, id, existed, "Deleted word");
        Ok(())
    }

    /// Record one answer.
    ///
    /// The counters move through the store's atomic increment so concurrent
    /// answers on the same word are never lost.
    pub async fn update_progress(&self, lang: Language, id: &str, correct: bool) -> Result<Word> {
        let store = self.store()?;
        let answered = if correct {
            "correctCount"
        } else {
            "incorrectCount"
        };

        let updates = vec![
            ("studyCount".to_string(), FieldUpdate::Increment(1)),
            (answered.to_string(), FieldUpdate::Increment(1)),
            set("lastStudyDate", json!(now_timestamp())),
        ];
        store.update(lang.collection(), id, updates).await?;
        debug!(language = %lang, id, correct, "Recorded progress");
        self.get_word(lang, id).await
    }

    /// Flip the favorite flag.
    ///
    /// This is a plain read-then-write: two concurrent toggles on the same
    /// word may both read the same value and leave it flipped only once.
    pub async fn toggle_favorite(&self, lang: Language, id: &str) -> Result<Word> {
        let store = self.store()?;
        let doc = store
            .get(lang.collection(), id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        let current = doc
            .get("isFavorite")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        store
            .update(lang.collection(), id, vec![set("isFavorite", json!(!current))])
            .await?;
        debug!(language = %lang, id, favorite = !current, "Toggled favorite");
        self.get_word(lang, id).await
    }
}

fn set(field: &str, value: Value) -> (String, FieldUpdate) {
    (field.to_string(), FieldUpdate::Set(value))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_support::memory_repo;
    use super::super::QueryLimits;
    use super::*;
    use crate::models::{Category, Classification, Difficulty};
    use crate::store::{DocumentStore, SqliteDocumentStore};

    #[tokio::test]
    async fn test_add_applies_defaults() {
        let (repo, store) = memory_repo();
        let word = repo
            .add(Language::Es, NewWord::new("casa", "house"))
            .await
            .unwrap();

        assert!(!word.id.is_empty());
        assert_eq!(word.difficulty, Difficulty::Medium);
        assert_eq!(word.category, Category::Other);
        assert_eq!(word.tags, vec!["general"]);
        assert!(!word.image_url.as_deref().unwrap_or_default().is_empty());
        assert_eq!(word.study_count, 0);
        assert!(word.last_study_date.is_some());

        let doc = store.get("spanishWords", &word.id).await.unwrap().unwrap();
        assert_eq!(doc.get("correctCount"), Some(&json!(0)));
        assert_eq!(doc.get("isFavorite"), Some(&json!(false)));
        assert_eq!(doc.get("example"), Some(&json!("")));
        assert!(!doc.contains("id"));
    }

    #[tokio::test]
    async fn test_add_keeps_explicit_values() {
        let (repo, _store) = memory_repo();
        let mut input = NewWord::new("hablar", "to speak");
        input.category = Some(Category::Noun);
        input.difficulty = Some(Difficulty::Hard);
        input.image_url = Some("https://img.example/hablar.png".into());

        let word = repo.add(Language::Es, input).await.unwrap();
        assert_eq!(word.category, Category::Noun);
        assert_eq!(word.difficulty, Difficulty::Hard);
        assert_eq!(word.image_url.as_deref(), Some("https://img.example/hablar.png"));
    }

    #[tokio::test]
    async fn test_add_rejects_blank_word() {
        let (repo, _store) = memory_repo();
        assert!(matches!(
            repo.add(Language::En, NewWord::new("", "x")).await,
            Err(RepositoryError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_update_leaves_progress_alone() {
        let (repo, _store) = memory_repo();
        let word = repo.add(Language::Es, NewWord::new("gato", "cat")).await.unwrap();
        repo.update_progress(Language::Es, &word.id, true).await.unwrap();
        repo.toggle_favorite(Language::Es, &word.id).await.unwrap();

        let mut edit = NewWord::new("gata", "female cat");
        edit.tags = Some(vec!["animals".into()]);
        edit.example = Some("La gata duerme.".into());
        let updated = repo.update(Language::Es, &word.id, edit).await.unwrap();

        assert_eq!(updated.word, "gata");
        assert_eq!(updated.translation, "female cat");
        assert_eq!(updated.tags, vec!["animals"]);
        assert_eq!(updated.example, "La gata duerme.");
        assert_eq!(updated.correct_count, 1);
        assert_eq!(updated.study_count, 1);
        assert!(updated.is_favorite);
    }

    #[tokio::test]
    async fn test_mutations_on_missing_word() {
        let (repo, _store) = memory_repo();
        assert!(matches!(
            repo.update(Language::Es, "missing", NewWord::new("a", "b")).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            repo.update_progress(Language::Es, "missing", true).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            repo.toggle_favorite(Language::Es, "missing").await,
            Err(RepositoryError::NotFound(_))
        ));
        repo.delete(Language::Es, "missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_progress_counts() {
        let (repo, _store) = memory_repo();
        let word = repo.add(Language::Es, NewWord::new("libro", "book")).await.unwrap();

        let mut last_date = word.last_study_date;
        for _ in 0..3 {
            let w = repo.update_progress(Language::Es, &word.id, true).await.unwrap();
            assert!(w.last_study_date >= last_date);
            last_date = w.last_study_date;
        }
        let w = repo.get_word(Language::Es, &word.id).await.unwrap();
        assert_eq!(w.correct_count, 3);
        assert_eq!(w.study_count, 3);
        assert_eq!(w.classification(), Classification::Learning);

        for _ in 0..2 {
            repo.update_progress(Language::Es, &word.id, false).await.unwrap();
        }
        let w = repo.get_word(Language::Es, &word.id).await.unwrap();
        assert_eq!((w.correct_count, w.incorrect_count, w.study_count), (3, 2, 5));
    }

    #[tokio::test]
    async fn test_concurrent_progress_on_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.db");
        let store = SqliteDocumentStore::open(&path.display().to_string())
            .await
            .unwrap();
        let repo = WordRepository::new(
            Arc::new(store) as Arc<dyn DocumentStore>,
            QueryLimits::default(),
        );
        let word = repo.add(Language::En, NewWord::new("run", "correr")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let repo = repo.clone();
            let id = word.id.clone();
            handles.push(tokio::spawn(async move {
                repo.update_progress(Language::En, &id, i % 2 == 0).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let w = repo.get_word(Language::En, &word.id).await.unwrap();
        assert_eq!(w.study_count, 10);
        assert_eq!(w.correct_count, 5);
        assert_eq!(w.incorrect_count, 5);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores() {
        let (repo, _store) = memory_repo();
        let word = repo.add(Language::En, NewWord::new("tree", "árbol")).await.unwrap();

        let once = repo.toggle_favorite(Language::En, &word.id).await.unwrap();
        assert!(once.is_favorite);
        let twice = repo.toggle_favorite(Language::En, &word.id).await.unwrap();
        assert_eq!(twice.is_favorite, word.is_favorite);
    }

    #[tokio::test]
    async fn test_delete_removes_word() {
        let (repo, _store) = memory_repo();
        let word = repo.add(Language::En, NewWord::new("sun", "sol")).await.unwrap();
        repo.delete(Language::En, &word.id).await.unwrap();
        assert!(matches!(
            repo.get_word(Language::En, &word.id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }
}
