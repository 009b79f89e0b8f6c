//! Word models for vocabulary records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{Document, Fields};
use crate::utils::{guess_category, image_url_for};

/// Correct answers needed before a word counts as learned.
pub const LEARNED_THRESHOLD: u32 = 5;

/// Tag applied when a word is created without any.
pub const DEFAULT_TAG: &str = "general";

/// Target language of a vocabulary collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Es, Language::En];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

    /// Name of the backing collection in the document store.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::En => "englishWords",
            Self::Es => "spanishWords",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grammatical category of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Verb,
    Noun,
    Adjective,
    Adverb,
    #[serde(other)]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verb => "verb",
            Self::Noun => "noun",
            Self::Adjective => "adjective",
            Self::Adverb => "adverb",
            Self::Other => "other",
        }
    }
}

/// Self-assessed difficulty of a word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Hard,
    #[default]
    #[serde(other)]
    Medium,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// Learning state derived from the correct-answer count.
///
/// The three states partition every record: unknown at zero, learning below
/// [`LEARNED_THRESHOLD`], learned from there on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Unknown,
    Learning,
    Learned,
}

impl Classification {
    pub fn of(correct_count: u32) -> Self {
        match correct_count {
            0 => Self::Unknown,
            n if n < LEARNED_THRESHOLD => Self::Learning,
            _ => Self::Learned,
        }
    }
}

/// A vocabulary record as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    /// Store-assigned identifier.
    pub id: String,
    pub word: String,
    pub translation: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub example: String,
    pub pronunciation: String,
    pub tags: Vec<String>,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub study_count: u32,
    /// Time of the most recent progress update.
    pub last_study_date: Option<DateTime<Utc>>,
    pub is_favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl Word {
    /// Decode a stored document, filling absent fields with their defaults.
    ///
    /// Decoding is lenient: a field with an unexpected type is treated as
    /// absent, counters accept any JSON number (clamped to zero and rounded),
    /// and dates accept RFC 3339 strings or epoch milliseconds. Nothing filled
    /// in here is written back; the backfill migrator is the only path that
    /// persists defaults for legacy documents.
    pub fn from_document(doc: Document) -> Self {
        let fields = &doc.fields;
        let word = text_field(fields, "word").unwrap_or_default();

        Self {
            category: fields
                .get("category")
                .and_then(|v| Category::deserialize(v).ok())
                .unwrap_or_else(|| guess_category(&word)),
            difficulty: fields
                .get("difficulty")
                .and_then(|v| Difficulty::deserialize(v).ok())
                .unwrap_or_default(),
            translation: text_field(fields, "translation").unwrap_or_default(),
            example: text_field(fields, "example").unwrap_or_default(),
            pronunciation: text_field(fields, "pronunciation").unwrap_or_default(),
            tags: tags_field(fields).unwrap_or_else(|| vec![DEFAULT_TAG.to_string()]),
            correct_count: count_field(fields, "correctCount"),
            incorrect_count: count_field(fields, "incorrectCount"),
            study_count: count_field(fields, "studyCount"),
            last_study_date: fields.get("lastStudyDate").and_then(date_value),
            is_favorite: fields
                .get("isFavorite")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            image_url: text_field(fields, "imageUrl"),
            audio_url: text_field(fields, "audioUrl"),
            word,
            id: doc.id,
        }
    }

    /// Encode everything except the identifier as document fields.
    pub fn to_fields(&self) -> Result<Fields, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(mut fields) => {
                fields.remove("id");
                Ok(fields)
            }
            _ => Ok(Fields::new()),
        }
    }

    /// Fill an absent or empty image reference from the word text.
    pub fn with_image_fallback(mut self) -> Self {
        if self.image_url.as_deref().map_or(true, str::is_empty) {
            let derived = image_url_for(&self.word);
            self.image_url = (!derived.is_empty()).then_some(derived);
        }
        self
    }

    pub fn classification(&self) -> Classification {
        Classification::of(self.correct_count)
    }
}

fn text_field(fields: &Fields, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

/// String entries of a tag array; `None` when the field is absent or not an array.
fn tags_field(fields: &Fields) -> Option<Vec<String>> {
    let tags = fields.get("tags")?.as_array()?;
    Some(
        tags.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

/// Any JSON number as a non-negative counter. Non-numbers count as zero.
fn count_field(fields: &Fields, key: &str) -> u32 {
    fields
        .get(key)
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite())
        .map(|n| n.round().clamp(0.0, f64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

/// RFC 3339 strings or epoch milliseconds.
fn date_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
        Value::Number(n) => n
            .as_f64()
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64)),
        _ => None,
    }
}

/// Caller-supplied word content for creation and edits.
///
/// Counters, favorite state and study dates sent by clients are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewWord {
    pub word: String,
    pub translation: String,
    pub category: Option<Category>,
    pub difficulty: Option<Difficulty>,
    pub example: Option<String>,
    pub pronunciation: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
}

impl NewWord {
    pub fn new(word: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            translation: translation.into(),
            ..Default::default()
        }
    }

    /// Check the display strings are present.
    pub fn validate(&self) -> Result<(), String> {
        if self.word.trim().is_empty() {
            return Err("word must not be empty".to_string());
        }
        if self.translation.trim().is_empty() {
            return Err("translation must not be empty".to_string());
        }
        Ok(())
    }

    pub fn resolved_category(&self) -> Category {
        self.category.unwrap_or_else(|| guess_category(&self.word))
    }

    /// Tags with duplicates and blanks removed, or the default tag when none remain.
    pub fn resolved_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.iter().flatten() {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        if tags.is_empty() {
            tags.push(DEFAULT_TAG.to_string());
        }
        tags
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordPage {
    pub words: Vec<Word>,
    /// True when the page came back full.
    pub has_more: bool,
    /// Cursor for the next page; absent when the page is empty.
    pub last_word_id: Option<String>,
}
